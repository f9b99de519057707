//! 解決パイプライン
//!
//! バージョン移行、既定値の生成、コンテキスト構築、フラグメントのマージを統合

use crate::catalogue::TemplateCatalogue;
use crate::constants::CURRENT_VERSION;
use crate::context::{RenderContext, build_context};
use crate::defaults::{PasswordGenerator, apply_defaults, default_annotations};
use crate::error::{KieError, Result};
use crate::merge::{check_unique_workloads, consolidate_objects, merge_environments, strip_router_env};
use crate::model::{CustomObject, DatabaseType, Environment, KieApp, lookup_profile};
use crate::overrides::ImageOverrides;
use crate::resolve::ResolvedSpec;
use crate::template::FragmentRenderer;
use crate::version::resolve_version_transition;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

const COMMON_FRAGMENT: &str = "common.yaml";
const JMS_FRAGMENT: &str = "jms/activemq-jms-config.yaml";
const PROCESS_MIGRATION_FRAGMENT: &str = "pim/process-migration.yaml";

/// 1 回の解決に使う外部入力
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// オペレーターが展開する現行のプロダクトバージョン
    pub current_version: String,
    pub image_overrides: ImageOverrides,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            current_version: CURRENT_VERSION.to_string(),
            image_overrides: ImageOverrides::none(),
        }
    }
}

/// 解決結果
#[derive(Debug, Clone)]
pub struct Resolution {
    /// アノテーション、バージョン、Status を更新したリソース
    pub app: KieApp,
    pub context: RenderContext,
    pub environment: Environment,
}

/// リソースを解決済み環境に変換
///
/// 以下の処理を実行:
/// 1. バージョン移行の判定
/// 2. 生成既定値（Status）の算出
/// 3. Spec と Status の統合
/// 4. レンダーコンテキストの構築
/// 5. フラグメントの展開とマージ
/// 6. 利用者指定の上書きの適用
///
/// 入力は変更しない。失敗した場合に途中の Status は返さない。
#[instrument(skip_all, fields(app = %app.metadata.name, environment = %app.spec.environment))]
pub fn resolve_kieapp(
    app: &KieApp,
    catalogue: &dyn TemplateCatalogue,
    options: &ResolveOptions,
    passwords: &mut dyn PasswordGenerator,
) -> Result<Resolution> {
    info!("Starting resolution");
    let mut app = app.clone();
    let profile = lookup_profile(&app.spec.environment);

    // 1. バージョン移行
    debug!("Step 1: Checking version transition");
    if let Some(transition) =
        resolve_version_transition(&app, &options.current_version, catalogue)?
    {
        app.metadata.annotations.clear();
        if app.spec.version.as_deref().is_some_and(|v| !v.is_empty()) {
            app.spec.version = Some(transition.to);
        } else {
            app.status.generated.version = Some(transition.to);
        }
    }

    // 2. 既定値
    debug!("Step 2: Applying generated defaults");
    app.status = apply_defaults(&app, profile, &options.current_version, passwords);
    default_annotations(&mut app.metadata.annotations);

    // 3. 解決済み仕様
    debug!("Step 3: Resolving app spec");
    let resolved = ResolvedSpec::new(&app.spec, &app.status.generated);

    // 4. コンテキスト
    debug!("Step 4: Building render context");
    let context = build_context(&app, &resolved, profile, &options.image_overrides)?;

    // 5. マージ
    debug!("Step 5: Merging fragments");
    let mut environment = merge_environment(&context, &resolved, catalogue)?;

    // 6. 上書き
    debug!("Step 6: Consolidating user overrides");
    consolidate_objects(&mut environment, &resolved, &context);
    check_unique_workloads(&environment)?;

    info!(
        servers = environment.servers.len(),
        databases = environment.databases.len(),
        version = %context.version,
        "Resolution complete"
    );
    Ok(Resolution {
        app,
        context,
        environment,
    })
}

/// フラグメントを決められた順に展開してマージ
#[instrument(skip_all, fields(version = %context.version))]
pub fn merge_environment(
    context: &RenderContext,
    resolved: &ResolvedSpec,
    catalogue: &dyn TemplateCatalogue,
) -> Result<Environment> {
    let mut loader = FragmentLoader::new(context, catalogue)?;

    let common: Environment = loader.load(COMMON_FRAGMENT)?;
    let profile: Environment = loader.load(&format!("envs/{}.yaml", resolved.environment))?;
    let mut env = merge_environments(common, &profile);

    if resolved.objects.smart_router.is_none() {
        env.smart_router.omit = true;
        strip_router_env(&mut env);
    }

    // サーバーのデータベース（種別ごとに 1 回）
    let server_db_types: BTreeSet<&str> = context
        .servers
        .iter()
        .map(|server| server.database.kind.as_str())
        .filter(|kind| !kind.is_empty())
        .collect();
    for kind in server_db_types {
        let overlay: Environment = loader.load(&format!("dbs/servers/{}.yaml", kind))?;
        env = merge_environments(env, &overlay);
    }

    if context.servers.iter().any(|server| server.jms.enable_integration) {
        let overlay: Environment = loader.load(JMS_FRAGMENT)?;
        env = merge_environments(env, &overlay);
    }

    let pim = &context.process_migration;
    if pim.enabled {
        let overlay: Environment = loader.load(PROCESS_MIGRATION_FRAGMENT)?;
        env = merge_environments(env, &overlay);
        let kind = pim.database.kind.as_str();
        if !kind.is_empty() && kind != DatabaseType::H2.as_str() {
            let overlay: Environment = loader.load(&format!("dbs/pim/{}.yaml", kind))?;
            env = merge_environments(env, &overlay);
        }
    } else {
        env.process_migration.omit = true;
    }

    // デプロイするデータベース
    let mut databases = Vec::new();
    for database in &context.databases {
        let fragment: Environment = loader.load(&format!("dbs/{}.yaml", database.kind))?;
        let name = format!("{}-{}", database.server_name, database.kind);
        match fragment
            .databases
            .iter()
            .find(|object| object.name() == Some(name.as_str()))
        {
            Some(object) => databases.push(object.clone()),
            None => debug!(database = %name, "No deployment found in fragment, skipped"),
        }
    }
    env = merge_environments(
        env,
        &Environment {
            databases,
            ..Default::default()
        },
    );

    Ok(env)
}

/// フラグメントの取得、展開、パースを行う
///
/// 同じキーは 1 回だけ取得して展開する。
struct FragmentLoader<'a> {
    renderer: FragmentRenderer,
    catalogue: &'a dyn TemplateCatalogue,
    version: &'a str,
    rendered: std::collections::HashMap<String, String>,
}

impl<'a> FragmentLoader<'a> {
    fn new(context: &'a RenderContext, catalogue: &'a dyn TemplateCatalogue) -> Result<Self> {
        Ok(Self {
            renderer: FragmentRenderer::new(context)?,
            catalogue,
            version: &context.version,
            rendered: Default::default(),
        })
    }

    fn load<T: DeserializeOwned>(&mut self, key: &str) -> Result<T> {
        if !self.rendered.contains_key(key) {
            let text = self.catalogue.get(self.version, key)?;
            let rendered = self.renderer.render(key, &text)?;
            self.rendered.insert(key.to_string(), rendered);
        }
        let rendered = &self.rendered[key];
        serde_yaml::from_str(rendered).map_err(|e| KieError::FragmentParse {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

/// 省略されていないコンポーネントの先頭ワークロード名
pub fn component_names(env: &Environment) -> Vec<&str> {
    env.components().filter_map(CustomObject::name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::BundleCatalogue;
    use crate::defaults::OsPasswordGenerator;

    fn catalogue() -> BundleCatalogue {
        BundleCatalogue::from_entries([
            (
                "7.8.0",
                "common.yaml",
                r#"
console:
  workloads:
    - metadata:
        name: "[[ application_name ]]-[[ console.name ]]"
      containers:
        - name: "[[ application_name ]]-[[ console.name ]]"
smartRouter:
  workloads:
    - metadata:
        name: "[[ application_name ]]-smartrouter"
servers:
[% for server in servers %]
  - workloads:
      - metadata:
          name: "[[ server.kie_name ]]"
        containers:
          - name: "[[ server.kie_name ]]"
            env:
              - name: KIE_SERVER_ROUTER_SERVICE
                value: "[[ application_name ]]-smartrouter"
[% endfor %]
"#,
            ),
            ("7.8.0", "envs/rhpam-trial.yaml", "console: {}\n"),
            (
                "7.8.0",
                "dbs/servers/h2.yaml",
                r#"
servers:
[% for server in servers %]
  - workloads:
      - metadata:
          name: "[[ server.kie_name ]]"
        containers:
          - name: "[[ server.kie_name ]]"
            env:
              - name: DATASOURCES
                value: h2
[% endfor %]
"#,
            ),
        ])
    }

    fn app() -> KieApp {
        KieApp::from_yaml(
            r#"
metadata:
  name: myapp
spec:
  environment: rhpam-trial
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_merge_order_and_router_strip() {
        let resolution = resolve_kieapp(
            &app(),
            &catalogue(),
            &ResolveOptions::default(),
            &mut OsPasswordGenerator,
        )
        .unwrap();
        let env = &resolution.environment;
        assert!(env.smart_router.omit);
        assert!(env.process_migration.omit);
        assert_eq!(component_names(env), vec!["myapp-rhpamcentr", "myapp-kieserver"]);

        let container = &env.servers[0].workloads[0].containers[0];
        let names: Vec<_> = container.env.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["DATASOURCES"]);
    }

    #[test]
    fn test_missing_profile_fragment() {
        let mut app = app();
        app.spec.environment = "rhpam-production".to_string();
        let err = resolve_kieapp(
            &app,
            &catalogue(),
            &ResolveOptions::default(),
            &mut OsPasswordGenerator,
        )
        .unwrap_err();
        assert!(matches!(err, KieError::FragmentNotFound { ref key, .. } if key == "envs/rhpam-production.yaml"));
    }

    #[test]
    fn test_unparsable_fragment() {
        let mut catalogue = catalogue();
        catalogue.insert("7.8.0", "envs/rhpam-trial.yaml", "console: [unclosed\n");
        let err = resolve_kieapp(
            &app(),
            &catalogue,
            &ResolveOptions::default(),
            &mut OsPasswordGenerator,
        )
        .unwrap_err();
        assert!(matches!(err, KieError::FragmentParse { ref key, .. } if key == "envs/rhpam-trial.yaml"));
    }
}
