//! フラグメントのマージ
//!
//! 同一コンポーネント（先頭ワークロード名が一致）同士を構造的にマージする。

use crate::constants::ROUTER_ENV_VARS;
use crate::context::RenderContext;
use crate::error::{KieError, Result};
use crate::model::{
    Container, ContainerPort, CustomObject, EnvVar, Environment, KieAppObject, NamedObject,
    ObjectMeta, ResourceRequirements, Workload,
};
use crate::resolve::ResolvedSpec;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

/// 先頭ワークロード名で同一コンポーネントか判定
///
/// どちらかにワークロードがなければ一致とみなさない。
pub fn same_component(a: &CustomObject, b: &CustomObject) -> bool {
    match (a.name(), b.name()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// 同一コンポーネントならマージし、そうでなければ base をそのまま返す
pub fn merge_fragment(base: CustomObject, overlay: &CustomObject) -> CustomObject {
    if same_component(&base, overlay) {
        merge_custom_object(base, overlay)
    } else {
        trace!(base = ?base.name(), overlay = ?overlay.name(), "Overlay does not match, dropped");
        base
    }
}

/// コンポーネントを構造的にマージ
pub fn merge_custom_object(mut base: CustomObject, overlay: &CustomObject) -> CustomObject {
    base.omit |= overlay.omit;
    merge_by_name(
        &mut base.workloads,
        &overlay.workloads,
        |w| w.metadata.name.as_str(),
        merge_workload,
    );
    for (target, source) in [
        (&mut base.services, &overlay.services),
        (&mut base.routes, &overlay.routes),
        (&mut base.secrets, &overlay.secrets),
        (
            &mut base.persistent_volume_claims,
            &overlay.persistent_volume_claims,
        ),
    ] {
        merge_by_name(target, source, |o| o.metadata.name.as_str(), merge_named_object);
    }
    base
}

/// 名前で照合してマージし、照合できない overlay の要素は末尾に追加
fn merge_by_name<T: Clone>(
    base: &mut Vec<T>,
    overlay: &[T],
    name: impl Fn(&T) -> &str,
    merge: impl Fn(&mut T, &T),
) {
    for item in overlay {
        match base.iter_mut().find(|b| name(b) == name(item)) {
            Some(existing) => merge(existing, item),
            None => base.push(item.clone()),
        }
    }
}

fn merge_meta(base: &mut ObjectMeta, overlay: &ObjectMeta) {
    if overlay.namespace.is_some() {
        base.namespace.clone_from(&overlay.namespace);
    }
    extend_map(&mut base.labels, &overlay.labels);
    extend_map(&mut base.annotations, &overlay.annotations);
}

fn extend_map(base: &mut BTreeMap<String, String>, overlay: &BTreeMap<String, String>) {
    base.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
}

fn merge_workload(base: &mut Workload, overlay: &Workload) {
    merge_meta(&mut base.metadata, &overlay.metadata);
    if overlay.replicas.is_some() {
        base.replicas = overlay.replicas;
    }
    if !overlay.triggers.is_empty() {
        base.triggers.clone_from(&overlay.triggers);
    }
    merge_by_name(
        &mut base.containers,
        &overlay.containers,
        |c| c.name.as_str(),
        merge_container,
    );
}

fn merge_container(base: &mut Container, overlay: &Container) {
    if overlay.image.is_some() {
        base.image.clone_from(&overlay.image);
    }
    base.env = merge_env(&base.env, &overlay.env);
    base.resources = merge_resources(&base.resources, &overlay.resources, false);
    merge_by_name(
        &mut base.ports,
        &overlay.ports,
        |p| p.name.as_str(),
        |b: &mut ContainerPort, o| *b = o.clone(),
    );
}

fn merge_named_object(base: &mut NamedObject, overlay: &NamedObject) {
    merge_meta(&mut base.metadata, &overlay.metadata);
    base.body
        .extend(overlay.body.iter().map(|(k, v)| (k.clone(), v.clone())));
}

/// 環境変数を名前で和集合にする
///
/// 両方にある変数は overlay が値を持つときだけ overlay の値を使う。
fn merge_env(base: &[EnvVar], overlay: &[EnvVar]) -> Vec<EnvVar> {
    let mut merged = base.to_vec();
    for var in overlay {
        match merged.iter_mut().find(|b| b.name == var.name) {
            Some(existing) if var.is_set() => *existing = var.clone(),
            Some(_) => {}
            None => merged.push(var.clone()),
        }
    }
    merged
}

/// 利用者指定の環境変数で置き換える（常に上書き）
pub fn env_override(base: &[EnvVar], overrides: &[EnvVar]) -> Vec<EnvVar> {
    let mut merged = base.to_vec();
    for var in overrides {
        match merged.iter_mut().find(|b| b.name == var.name) {
            Some(existing) => *existing = var.clone(),
            None => merged.push(var.clone()),
        }
    }
    merged
}

/// リソース制約のマージ
///
/// base で未設定の項目だけを overlay で埋める。`force` なら overlay が常に勝つ。
pub fn merge_resources(
    base: &ResourceRequirements,
    overlay: &ResourceRequirements,
    force: bool,
) -> ResourceRequirements {
    let merge = |base: &BTreeMap<String, String>, overlay: &BTreeMap<String, String>| {
        let mut merged = base.clone();
        for (key, value) in overlay {
            if force || !merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    };
    ResourceRequirements {
        limits: merge(&base.limits, &overlay.limits),
        requests: merge(&base.requests, &overlay.requests),
    }
}

/// 環境全体をマージ
///
/// 単一コンポーネントは構造的にマージする。サーバーは名前で照合し、
/// 照合できない overlay のサーバーは捨てる。データベースは照合できなければ追加する。
pub fn merge_environments(mut base: Environment, overlay: &Environment) -> Environment {
    base.console = merge_custom_object(base.console, &overlay.console);
    base.smart_router = merge_custom_object(base.smart_router, &overlay.smart_router);
    base.process_migration =
        merge_custom_object(base.process_migration, &overlay.process_migration);

    for server in &mut base.servers {
        if let Some(matched) = overlay.servers.iter().find(|o| same_component(server, o)) {
            *server = merge_custom_object(std::mem::take(server), matched);
        }
    }

    for database in &overlay.databases {
        match base
            .databases
            .iter_mut()
            .find(|b| same_component(b, database))
        {
            Some(existing) => *existing = merge_custom_object(std::mem::take(existing), database),
            None => base.databases.push(database.clone()),
        }
    }
    base
}

/// ルーター関連の環境変数を全サーバーから取り除く
pub fn strip_router_env(env: &mut Environment) {
    for container in env
        .servers
        .iter_mut()
        .flat_map(|server| server.workloads.iter_mut())
        .flat_map(|workload| workload.containers.iter_mut())
    {
        container
            .env
            .retain(|var| !ROUTER_ENV_VARS.contains(&var.name.as_str()));
    }
}

/// 利用者指定の環境変数とリソースを最後に適用
pub fn consolidate_objects(env: &mut Environment, resolved: &ResolvedSpec, context: &RenderContext) {
    apply_overrides(&mut env.console, &resolved.objects.console.base);

    if let Some(router) = &resolved.objects.smart_router
        && !env.smart_router.omit
    {
        apply_overrides(&mut env.smart_router, &router.base);
    }

    for server in &context.servers {
        if let Some(object) = env
            .servers
            .iter_mut()
            .find(|object| object.name() == Some(server.kie_name.as_str()))
        {
            apply_overrides(object, &server.overrides);
        }
    }

    if context.process_migration.enabled
        && let Some(pim) = &resolved.objects.process_migration
    {
        apply_overrides(&mut env.process_migration, &pim.base);
    }
}

/// 全ワークロードの全コンテナに上書きを適用
fn apply_overrides(object: &mut CustomObject, overrides: &KieAppObject) {
    if overrides.env.is_empty() && overrides.resources.is_none() {
        return;
    }
    for container in object
        .workloads
        .iter_mut()
        .flat_map(|workload| workload.containers.iter_mut())
    {
        container.env = env_override(&container.env, &overrides.env);
        if let Some(resources) = &overrides.resources {
            container.resources = merge_resources(&container.resources, resources, true);
        }
        debug!(component = %container.name, env = overrides.env.len(), "Applied user overrides");
    }
}

/// ワークロード名の一意性を検査（省略されたコンポーネントは対象外）
pub fn check_unique_workloads(env: &Environment) -> Result<()> {
    let mut seen = HashSet::new();
    for workload in env.components().flat_map(|object| object.workloads.iter()) {
        if !seen.insert(workload.metadata.name.as_str()) {
            return Err(KieError::DuplicateWorkloadName(
                workload.metadata.name.clone(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KieAppSpec;
    use pretty_assertions::assert_eq;

    fn object(yaml: &str) -> CustomObject {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn server(name: &str) -> CustomObject {
        object(&format!(
            r#"
workloads:
  - metadata:
      name: {name}
    containers:
      - name: {name}
        env:
          - name: KIE_SERVER_ID
            value: {name}
          - name: KIE_SERVER_ROUTER_SERVICE
            value: myapp-smartrouter
        resources:
          limits:
            memory: 1Gi
"#
        ))
    }

    #[test]
    fn test_same_component() {
        assert!(same_component(&server("a"), &server("a")));
        assert!(!same_component(&server("a"), &server("b")));
        assert!(!same_component(&CustomObject::default(), &CustomObject::default()));
    }

    #[test]
    fn test_non_matching_overlay_is_dropped() {
        let base = server("a");
        assert_eq!(merge_fragment(base.clone(), &server("b")), base);
    }

    #[test]
    fn test_env_union_by_name() {
        let overlay = object(
            r#"
workloads:
  - metadata:
      name: a
    containers:
      - name: a
        env:
          - name: KIE_SERVER_ID
          - name: DB_HOST
            value: a-mysql
        resources:
          limits:
            memory: 4Gi
            cpu: "2"
"#,
        );
        let merged = merge_fragment(server("a"), &overlay);
        let container = &merged.workloads[0].containers[0];
        let names: Vec<_> = container.env.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["KIE_SERVER_ID", "KIE_SERVER_ROUTER_SERVICE", "DB_HOST"]
        );
        assert_eq!(container.env[0].value.as_deref(), Some("a"));
        assert_eq!(container.resources.limits["memory"], "1Gi");
        assert_eq!(container.resources.limits["cpu"], "2");
    }

    #[test]
    fn test_side_objects_matched_by_name() {
        let base = object(
            r#"
workloads:
  - metadata:
      name: a
services:
  - metadata:
      name: a
    spec:
      ports: [8080]
"#,
        );
        let overlay = object(
            r#"
omit: true
workloads:
  - metadata:
      name: a
      labels:
        tier: backend
services:
  - metadata:
      name: a-ping
routes:
  - metadata:
      name: a
"#,
        );
        let merged = merge_custom_object(base, &overlay);
        assert!(merged.omit);
        assert_eq!(merged.services.len(), 2);
        assert!(merged.services[0].body.contains_key("spec"));
        assert_eq!(merged.routes.len(), 1);
        assert_eq!(merged.workloads[0].metadata.labels["tier"], "backend");
    }

    #[test]
    fn test_merge_resources_force() {
        let base = ResourceRequirements {
            limits: BTreeMap::from([("memory".to_string(), "1Gi".to_string())]),
            ..Default::default()
        };
        let overlay = ResourceRequirements {
            limits: BTreeMap::from([("memory".to_string(), "2Gi".to_string())]),
            ..Default::default()
        };
        assert_eq!(merge_resources(&base, &overlay, false).limits["memory"], "1Gi");
        assert_eq!(merge_resources(&base, &overlay, true).limits["memory"], "2Gi");
    }

    #[test]
    fn test_merge_environments_drops_unknown_servers() {
        let base = Environment {
            servers: vec![server("a")],
            ..Default::default()
        };
        let overlay = Environment {
            servers: vec![server("b")],
            databases: vec![server("a-mysql")],
            ..Default::default()
        };
        let merged = merge_environments(base, &overlay);
        assert_eq!(merged.servers.len(), 1);
        assert_eq!(merged.servers[0].name(), Some("a"));
        assert_eq!(merged.databases.len(), 1);
    }

    #[test]
    fn test_strip_router_env() {
        let mut env = Environment {
            servers: vec![server("a"), server("b")],
            ..Default::default()
        };
        strip_router_env(&mut env);
        for server in &env.servers {
            let container = &server.workloads[0].containers[0];
            assert_eq!(container.env.len(), 1);
            assert_eq!(container.env[0].name, "KIE_SERVER_ID");
        }
    }

    #[test]
    fn test_consolidate_user_overrides_win() {
        let mut spec = KieAppSpec::default();
        spec.objects.console.base.env = vec![EnvVar::new("JAVA_OPTS", "-Xmx2g")];
        let resolved = ResolvedSpec::new(&spec, &KieAppSpec::default());

        let mut context = RenderContext::default();
        context.servers = vec![crate::context::ServerTemplate {
            kie_name: "a".to_string(),
            overrides: KieAppObject {
                env: vec![EnvVar::new("KIE_SERVER_ID", "custom")],
                resources: Some(ResourceRequirements {
                    limits: BTreeMap::from([("memory".to_string(), "4Gi".to_string())]),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }];

        let mut env = Environment {
            console: server("console"),
            servers: vec![server("a")],
            ..Default::default()
        };
        consolidate_objects(&mut env, &resolved, &context);

        let console = &env.console.workloads[0].containers[0];
        assert_eq!(console.env.last().unwrap().name, "JAVA_OPTS");
        let container = &env.servers[0].workloads[0].containers[0];
        assert_eq!(container.env[0].value.as_deref(), Some("custom"));
        assert_eq!(container.resources.limits["memory"], "4Gi");
    }

    #[test]
    fn test_overrides_reach_every_container() {
        let spec = KieAppSpec::default();
        let resolved = ResolvedSpec::new(&spec, &KieAppSpec::default());
        let mut context = RenderContext::default();
        context.servers = vec![crate::context::ServerTemplate {
            kie_name: "a".to_string(),
            overrides: KieAppObject {
                env: vec![EnvVar::new("CUSTOM", "yes")],
                resources: Some(ResourceRequirements {
                    limits: BTreeMap::from([("cpu".to_string(), "2".to_string())]),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }];

        let mut env = Environment {
            servers: vec![object(
                r#"
workloads:
  - metadata:
      name: a
    containers:
      - name: a
      - name: a-sidecar
  - metadata:
      name: a-amq
    containers:
      - name: a-amq
"#,
            )],
            ..Default::default()
        };
        consolidate_objects(&mut env, &resolved, &context);

        let containers: Vec<_> = env.servers[0]
            .workloads
            .iter()
            .flat_map(|workload| workload.containers.iter())
            .collect();
        assert_eq!(containers.len(), 3);
        for container in containers {
            assert_eq!(container.env, vec![EnvVar::new("CUSTOM", "yes")], "{}", container.name);
            assert_eq!(container.resources.limits["cpu"], "2");
        }
    }

    #[test]
    fn test_duplicate_workload_names() {
        let mut env = Environment {
            console: server("a"),
            servers: vec![server("a")],
            ..Default::default()
        };
        assert!(matches!(
            check_unique_workloads(&env),
            Err(KieError::DuplicateWorkloadName(name)) if name == "a"
        ));
        env.console.omit = true;
        assert!(check_unique_workloads(&env).is_ok());
    }
}
