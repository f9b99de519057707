//! サーバーセットの展開
//!
//! 宣言されたサーバーセットを、一意な名前を持つ kieserver インスタンスへ展開する。

use crate::constants::{
    DEFAULT_EXTENSION_IMAGE_INSTALL_DIR, DEFAULT_KIE_DEPLOYMENTS, IMAGE_STREAM_NAMESPACE,
    IMAGE_STREAM_TAG_KIND, PAM_KIE_IMAGE_VAR, RHEL_VERSION, SMART_ROUTER_PROTOCOL,
    keystore_secret_name,
};
use crate::context::{
    BuildTemplate, ContextBuilder, ImageRequest, ServerTemplate, jms_config, jvm_template,
    resolve_image, resolve_replicas, server_database,
};
use crate::error::{KieError, Result};
use crate::model::{ImageReference, KieServerSet, WebhookType};
use crate::resolve::first_non_empty;
use std::collections::HashSet;
use tracing::{debug, warn};

/// 展開後のインスタンス名と、その元になったセットの位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceName {
    pub set_index: usize,
    pub name: String,
}

/// 名前付きのセットを先頭へ移す（安定な分割）
pub fn sort_blank_names(sets: &[KieServerSet]) -> Vec<KieServerSet> {
    let (named, unnamed): (Vec<_>, Vec<_>) = sets
        .iter()
        .cloned()
        .partition(|set| set.explicit_name().is_some());
    let sorted: Vec<_> = named.into_iter().chain(unnamed).collect();
    if sorted.len() != sets.len() {
        warn!(
            expected = sets.len(),
            actual = sorted.len(),
            "Server set lengths differ after sorting, keeping declared order"
        );
        return sets.to_vec();
    }
    sorted
}

fn set_suffix(index: usize) -> String {
    if index > 0 {
        (index + 1).to_string()
    } else {
        String::new()
    }
}

/// インスタンス名を割り当てる
///
/// 名前なしのセットは `<app>-kieserver<N>` を未使用になるまで番号を進めて決める。
/// 2 つ目以降のデプロイは `<base>-2`, `<base>-3`, ...。
pub fn assign_instance_names(
    sets: &[KieServerSet],
    application_name: &str,
) -> Result<Vec<InstanceName>> {
    let mut used = HashSet::new();
    let mut unnamed = 0;
    let mut instances = Vec::new();

    for (set_index, set) in sets.iter().enumerate() {
        let base = match set.explicit_name() {
            Some(name) => name.to_string(),
            None => loop {
                let candidate = format!("{}-kieserver{}", application_name, set_suffix(unnamed));
                if !used.contains(&candidate) {
                    break candidate;
                }
                unnamed += 1;
            },
        };

        let deployments = set.deployments.unwrap_or(DEFAULT_KIE_DEPLOYMENTS);
        if set.build.is_some() && deployments > 1 {
            return Err(KieError::BuildDeploymentConflict {
                set: base,
                deployments,
            });
        }

        for deployment in 0..deployments {
            let name = if deployment == 0 {
                base.clone()
            } else {
                format!("{}-{}", base, deployment + 1)
            };
            if !used.insert(name.clone()) {
                return Err(KieError::DuplicateServerName(name));
            }
            instances.push(InstanceName { set_index, name });
        }
    }
    Ok(instances)
}

/// サーバーセットを展開
pub fn expand_server_sets(builder: &ContextBuilder<'_>) -> Result<Vec<ServerTemplate>> {
    let resolved = builder.resolved();
    let profile = builder.profile();
    let sets = sort_blank_names(&resolved.objects.servers);
    let application_name = builder.application_name();
    let instances = assign_instance_names(&sets, &application_name)?;

    let common = builder.common_config();
    let router_protocol = if builder.router_requested() {
        let requested = resolved
            .objects
            .smart_router
            .as_ref()
            .and_then(|router| router.protocol.as_deref());
        first_non_empty(requested, None, SMART_ROUTER_PROTOCOL)
    } else {
        String::new()
    };

    let mut servers = Vec::with_capacity(instances.len());
    for InstanceName { set_index, name } in instances {
        let set = &sets[set_index];
        let (replicas, _) =
            resolve_replicas(set.base.replicas, profile.map(|p| &p.replicas.server));
        let (default_from, image_url, omit_image_stream) = default_server_image(builder, set);

        let (from, image_url, omit_image_stream) = if set.build.is_some() {
            let from = ImageReference {
                kind: IMAGE_STREAM_TAG_KIND.to_string(),
                name: format!("{}:latest", name),
                namespace: String::new(),
            };
            let url = from.name.clone();
            (from, url, false)
        } else {
            (default_from.clone(), image_url, omit_image_stream)
        };

        servers.push(ServerTemplate {
            kie_server_id: first_non_empty(set.id.as_deref(), None, &name),
            replicas,
            from,
            image_url,
            omit_image_stream,
            keystore_secret: first_non_empty(
                set.keystore_secret.as_deref(),
                None,
                &keystore_secret_name(&name),
            ),
            storage_class_name: set.storage_class_name.clone().unwrap_or_default(),
            smart_router_protocol: router_protocol.clone(),
            build: build_template(set, default_from, builder.webhook_secret()),
            database: server_database(&name, profile, set.database.as_ref())?,
            jms: jms_config(set.jms.as_ref(), &common.amq_user, &common.amq_password),
            jvm: jvm_template(set.jvm.as_ref()),
            sso_client: Default::default(),
            overrides: set.base.clone(),
            kie_name: name,
        });
    }

    debug!(
        sets = sets.len(),
        instances = servers.len(),
        "Expanded server sets"
    );
    Ok(servers)
}

/// セットの既定イメージ（`from` 指定があればそれ）
fn default_server_image(
    builder: &ContextBuilder<'_>,
    set: &KieServerSet,
) -> (ImageReference, String, bool) {
    if let Some(from) = &set.from {
        return (from.clone(), from.name.clone(), false);
    }
    let version = builder.version();
    let image = resolve_image(
        &ImageRequest {
            default_url: format!("{}-kieserver{}:{}", builder.product(), RHEL_VERSION, version),
            override_var: builder
                .profile()
                .map(|p| p.server_image_var())
                .unwrap_or(PAM_KIE_IMAGE_VAR),
            version,
            use_image_tags: builder.resolved().use_image_tags,
            user_image: set.image.as_deref(),
            user_image_tag: set.image_tag.as_deref(),
        },
        builder.overrides(),
    );
    let from = ImageReference {
        kind: IMAGE_STREAM_TAG_KIND.to_string(),
        name: format!("{}:{}", image.image, image.image_tag),
        namespace: IMAGE_STREAM_NAMESPACE.to_string(),
    };
    (from, image.image_url, image.omit_image_stream)
}

/// ビルド設定
///
/// 拡張イメージのビルドとソースビルドのどちらか。ビルド元イメージの既定はサーバーの既定イメージ。
fn build_template(
    set: &KieServerSet,
    default_from: ImageReference,
    webhook_secret: &str,
) -> BuildTemplate {
    let Some(build) = &set.build else {
        return BuildTemplate::default();
    };
    let value = |v: &Option<String>| v.clone().unwrap_or_default();
    let from = build.from.clone().unwrap_or(default_from);

    if let Some(tag) = build
        .extension_image_stream_tag
        .as_deref()
        .filter(|tag| !tag.is_empty())
    {
        if build.extension_image_install_dir.is_some() {
            debug!(
                dir = ?build.extension_image_install_dir,
                "Extension image install dir overridden, be cautious when updating it"
            );
        }
        return BuildTemplate {
            enabled: true,
            from,
            extension_image_stream_tag: tag.to_string(),
            extension_image_stream_tag_namespace: first_non_empty(
                build.extension_image_stream_tag_namespace.as_deref(),
                None,
                IMAGE_STREAM_NAMESPACE,
            ),
            extension_image_install_dir: first_non_empty(
                build.extension_image_install_dir.as_deref(),
                None,
                DEFAULT_EXTENSION_IMAGE_INSTALL_DIR,
            ),
            ..Default::default()
        };
    }

    let webhook = |kind: WebhookType| {
        build
            .webhooks
            .iter()
            .find(|webhook| webhook.kind == kind)
            .map(|webhook| webhook.secret.clone())
            .unwrap_or_else(|| webhook_secret.to_string())
    };
    let git = build.git_source.clone().unwrap_or_default();

    BuildTemplate {
        enabled: true,
        from,
        git_source_uri: git.uri,
        git_source_reference: git.reference,
        git_source_context_dir: git.context_dir,
        github_webhook_secret: webhook(WebhookType::GitHub),
        generic_webhook_secret: webhook(WebhookType::Generic),
        kie_server_container_deployment: value(&build.kie_server_container_deployment),
        maven_mirror_url: value(&build.maven_mirror_url),
        artifact_dir: value(&build.artifact_dir),
        ..Default::default()
    }
}
