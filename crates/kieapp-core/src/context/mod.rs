//! レンダーコンテキストの構築
//!
//! 解決済み仕様とプロファイルから、フラグメントに渡す値をコンポーネントごとに算出する。

mod auth;
mod database;
mod image;
mod jms;
mod replicas;
mod types;

pub use auth::configure_auth;
pub use database::{database_templates, process_migration_database, server_database};
pub use image::{ImageRequest, ResolvedImage, resolve_image, split_image};
pub use jms::jms_config;
pub use replicas::resolve_replicas;
pub use types::*;

use crate::constants::{
    BROKER_VAR, CURRENT_VERSION, DATAGRID_VAR, GIT_HOOKS_DEFAULT_DIR, MYSQL_VAR, OSE_CLI_VAR,
    PAM_PROCESS_MIGRATION_VAR, PAM_SMART_ROUTER_VAR, POSTGRESQL_VAR, RHEL_VERSION, RHPAM_PREFIX,
    SMART_ROUTER_PROTOCOL, keystore_secret_name, version_constants,
};
use crate::error::Result;
use crate::model::{JvmObject, KieApp, Profile};
use crate::overrides::ImageOverrides;
use crate::resolve::{ResolvedSpec, first_non_empty};
use crate::servers::expand_server_sets;
use crate::version::major_minor_micro;
use tracing::{debug, error, warn};

/// レンダーコンテキストを構築
pub fn build_context(
    app: &KieApp,
    resolved: &ResolvedSpec,
    profile: Option<&'static Profile>,
    overrides: &ImageOverrides,
) -> Result<RenderContext> {
    ContextBuilder::new(app, resolved, profile, overrides).build()
}

/// コンポーネントごとのテンプレート値を算出するビルダー
///
/// 「要求されたか」（ルーターや移行サービスの有無）は Spec で判定し、
/// 値そのものは解決済み仕様から読む。
pub struct ContextBuilder<'a> {
    app: &'a KieApp,
    resolved: &'a ResolvedSpec,
    profile: Option<&'static Profile>,
    overrides: &'a ImageOverrides,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(
        app: &'a KieApp,
        resolved: &'a ResolvedSpec,
        profile: Option<&'static Profile>,
        overrides: &'a ImageOverrides,
    ) -> Self {
        if profile.is_none() {
            warn!(
                environment = %app.spec.environment,
                "No profile found for environment, using fallback defaults"
            );
        }
        Self {
            app,
            resolved,
            profile,
            overrides,
        }
    }

    pub fn resolved(&self) -> &ResolvedSpec {
        self.resolved
    }

    pub fn profile(&self) -> Option<&'static Profile> {
        self.profile
    }

    pub fn overrides(&self) -> &ImageOverrides {
        self.overrides
    }

    pub fn application_name(&self) -> String {
        first_non_empty(
            self.resolved.common_config.application_name.as_deref(),
            None,
            &self.app.metadata.name,
        )
    }

    pub fn version(&self) -> &str {
        self.resolved
            .version
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(CURRENT_VERSION)
    }

    /// プロファイルの製品（rhpam / rhdm）。プロファイルなしなら rhpam
    pub fn product(&self) -> &'static str {
        self.profile.map(|p| p.product).unwrap_or(RHPAM_PREFIX)
    }

    pub fn router_requested(&self) -> bool {
        self.app.spec.objects.smart_router.is_some()
    }

    /// 移行サービスは rhpam のプロファイルでのみデプロイする
    pub fn process_migration_requested(&self) -> bool {
        self.app.spec.objects.process_migration.is_some()
            && self.profile.is_some_and(Profile::is_rhpam)
    }

    pub fn webhook_secret(&self) -> &str {
        self.app.status.webhook_secret.as_deref().unwrap_or_default()
    }

    pub fn common_config(&self) -> CommonConfigTemplate {
        let common = &self.resolved.common_config;
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        CommonConfigTemplate {
            application_name: self.application_name(),
            key_store_password: value(&common.key_store_password),
            admin_user: value(&common.admin_user),
            admin_password: value(&common.admin_password),
            db_password: value(&common.db_password),
            amq_user: value(&common.amq_user),
            amq_password: value(&common.amq_password),
            amq_cluster_password: value(&common.amq_cluster_password),
        }
    }

    pub fn console(&self) -> ConsoleTemplate {
        let console = &self.resolved.objects.console;
        let (replicas, _) = resolve_replicas(
            console.base.replicas,
            self.profile.map(|p| &p.replicas.console),
        );
        let Some(profile) = self.profile else {
            return ConsoleTemplate {
                replicas,
                ..Default::default()
            };
        };

        let image = resolve_image(
            &ImageRequest {
                default_url: format!(
                    "{}-{}{}:{}",
                    profile.product,
                    profile.image_name,
                    RHEL_VERSION,
                    self.version()
                ),
                override_var: profile.image_var,
                version: self.version(),
                use_image_tags: self.resolved.use_image_tags,
                user_image: console.image.as_deref(),
                user_image_tag: console.image_tag.as_deref(),
            },
            self.overrides,
        );

        let git_hooks = console
            .git_hooks
            .as_ref()
            .map(|hooks| GitHooksTemplate {
                enabled: true,
                mount_path: first_non_empty(hooks.mount_path.as_deref(), None, GIT_HOOKS_DEFAULT_DIR),
                from_kind: hooks.from.as_ref().map(|f| f.kind.clone()).unwrap_or_default(),
                from_name: hooks.from.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
                ssh_secret_name: hooks.ssh_secret_name.clone().unwrap_or_default(),
            })
            .unwrap_or_default();

        ConsoleTemplate {
            name: profile.prefix.to_string(),
            replicas,
            image: image.image,
            image_tag: image.image_tag,
            image_url: image.image_url,
            omit_image_stream: image.omit_image_stream,
            keystore_secret: first_non_empty(
                console.keystore_secret.as_deref(),
                None,
                &keystore_secret_name(&format!("{}-businesscentral", self.application_name())),
            ),
            storage_class_name: console.storage_class_name.clone().unwrap_or_default(),
            git_hooks,
            jvm: jvm_template(console.jvm.as_ref()),
            sso_client: SsoClientTemplate::default(),
        }
    }

    pub fn smart_router(&self) -> SmartRouterTemplate {
        if !self.router_requested() {
            return SmartRouterTemplate::default();
        }
        let router = self
            .resolved
            .objects
            .smart_router
            .clone()
            .unwrap_or_default();
        let (replicas, _) = resolve_replicas(
            router.base.replicas,
            self.profile.map(|p| &p.replicas.smart_router),
        );
        let image = resolve_image(
            &ImageRequest {
                default_url: format!(
                    "{}-smartrouter{}:{}",
                    RHPAM_PREFIX,
                    RHEL_VERSION,
                    self.version()
                ),
                override_var: PAM_SMART_ROUTER_VAR,
                version: self.version(),
                use_image_tags: self.resolved.use_image_tags,
                user_image: router.image.as_deref(),
                user_image_tag: router.image_tag.as_deref(),
            },
            self.overrides,
        );

        SmartRouterTemplate {
            replicas,
            image: image.image,
            image_tag: image.image_tag,
            image_url: image.image_url,
            omit_image_stream: image.omit_image_stream,
            keystore_secret: first_non_empty(
                router.keystore_secret.as_deref(),
                None,
                &keystore_secret_name(&format!("{}-smartrouter", self.application_name())),
            ),
            protocol: first_non_empty(router.protocol.as_deref(), None, SMART_ROUTER_PROTOCOL),
            use_external_route: router.use_external_route,
            storage_class_name: router.storage_class_name.unwrap_or_default(),
        }
    }

    /// サーバーセットを展開
    pub fn servers(&self) -> Result<Vec<ServerTemplate>> {
        expand_server_sets(self)
    }

    pub fn process_migration_name(&self) -> String {
        format!("{}-process-migration", self.application_name())
    }

    pub fn process_migration(&self, servers: &[ServerTemplate]) -> Result<ProcessMigrationTemplate> {
        if !self.process_migration_requested() {
            return Ok(ProcessMigrationTemplate::default());
        }
        let pim = self
            .resolved
            .objects
            .process_migration
            .clone()
            .unwrap_or_default();
        let (replicas, _) = resolve_replicas(
            pim.base.replicas,
            self.profile.map(|p| &p.replicas.process_migration),
        );
        let image = resolve_image(
            &ImageRequest {
                default_url: format!(
                    "{}-process-migration{}:{}",
                    RHPAM_PREFIX,
                    RHEL_VERSION,
                    self.version()
                ),
                override_var: PAM_PROCESS_MIGRATION_VAR,
                version: self.version(),
                use_image_tags: self.resolved.use_image_tags,
                user_image: pim.image.as_deref(),
                user_image_tag: pim.image_tag.as_deref(),
            },
            self.overrides,
        );

        let common = self.common_config();
        let kie_server_clients = servers
            .iter()
            .map(|server| KieServerClient {
                host: format!("http://{}:8080/services/rest/server", server.kie_name),
                username: common.admin_user.clone(),
                password: common.admin_password.clone(),
            })
            .collect();

        Ok(ProcessMigrationTemplate {
            enabled: true,
            replicas,
            image: image.image,
            image_tag: image.image_tag,
            image_url: image.image_url,
            omit_image_stream: image.omit_image_stream,
            kie_server_clients,
            database: process_migration_database(
                &self.process_migration_name(),
                pim.database.as_ref(),
            )?,
        })
    }

    pub fn constants(&self) -> TemplateConstants {
        let version = self.version();
        let (major, minor, micro) = major_minor_micro(version);
        let mut constants = TemplateConstants {
            major,
            minor,
            micro,
            rhel_version: RHEL_VERSION.to_string(),
            ..Default::default()
        };
        if let Some(profile) = self.profile {
            constants.product = profile.product.to_string();
            constants.maven_repo = profile.maven_repo.to_string();
        }
        if let Some(images) = version_constants(version) {
            constants.broker_image = images.broker_image.to_string();
            constants.broker_image_tag = images.broker_image_tag.to_string();
            constants.datagrid_image = images.datagrid_image.to_string();
            constants.datagrid_image_tag = images.datagrid_image_tag.to_string();
            constants.ose_cli_image_url = images.ose_cli_image_url.to_string();
            constants.mysql_image_url = images.mysql_image_url.to_string();
            constants.postgresql_image_url = images.postgresql_image_url.to_string();
            constants.datagrid_image_url = images.datagrid_image_url.to_string();
            constants.broker_image_url = images.broker_image_url.to_string();
        }
        if !self.resolved.use_image_tags {
            let targets = [
                (OSE_CLI_VAR, &mut constants.ose_cli_image_url),
                (MYSQL_VAR, &mut constants.mysql_image_url),
                (POSTGRESQL_VAR, &mut constants.postgresql_image_url),
                (DATAGRID_VAR, &mut constants.datagrid_image_url),
                (BROKER_VAR, &mut constants.broker_image_url),
            ];
            for (var, target) in targets {
                if let Some(value) = self.overrides.lookup(var, version) {
                    *target = value.to_string();
                }
            }
        }
        constants
    }

    #[tracing::instrument(skip(self), fields(app = %self.app.metadata.name))]
    pub fn build(&self) -> Result<RenderContext> {
        let application_name = self.application_name();

        let mut servers = self.servers()?;
        let process_migration = self.process_migration(&servers)?;
        let databases =
            database_templates(&servers, &process_migration, &self.process_migration_name());
        let mut console = self.console();

        let mut auth = AuthTemplate::default();
        if let Some(config) = &self.resolved.auth {
            let console_client = format!("{}-{}", application_name, console.name);
            let (template, client) = configure_auth(config, &console_client, &mut servers)
                .inspect_err(|e| error!(error = %e, "Unable to set up authentication"))?;
            auth = template;
            console.sso_client = client;
        }

        debug!(
            servers = servers.len(),
            databases = databases.len(),
            process_migration = process_migration.enabled,
            "Render context built"
        );

        Ok(RenderContext {
            namespace: self.app.metadata.namespace.clone().unwrap_or_default(),
            version: self.version().to_string(),
            common_config: self.common_config(),
            console,
            smart_router: self.smart_router(),
            servers,
            process_migration,
            databases,
            constants: self.constants(),
            auth,
            application_name,
        })
    }
}

/// JVM 設定をテンプレート値に変換（未指定は空文字）
pub(crate) fn jvm_template(jvm: Option<&JvmObject>) -> JvmTemplate {
    let Some(jvm) = jvm else {
        return JvmTemplate::default();
    };
    fn text<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }
    JvmTemplate {
        java_opts_append: text(jvm.java_opts_append.as_deref()),
        java_max_mem_ratio: text(jvm.java_max_mem_ratio),
        java_initial_mem_ratio: text(jvm.java_initial_mem_ratio),
        java_max_initial_mem: text(jvm.java_max_initial_mem),
        java_diagnostics: text(jvm.java_diagnostics),
        java_debug: text(jvm.java_debug),
        java_debug_port: text(jvm.java_debug_port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ConsoleObject, KieAppSpec, KieServerSet, ProcessMigrationObject, SmartRouterObject,
        lookup_profile,
    };

    fn app(environment: &str) -> KieApp {
        let mut app = KieApp::default();
        app.metadata.name = "myapp".to_string();
        app.metadata.namespace = Some("demo".to_string());
        app.spec = KieAppSpec {
            environment: environment.to_string(),
            ..Default::default()
        };
        app.status.generated.version = Some("7.8.0".to_string());
        app.status.generated.common_config.admin_user = Some("adminUser".to_string());
        app.status.generated.common_config.admin_password = Some("RedHat".to_string());
        app.status.generated.objects.servers = vec![KieServerSet {
            deployments: Some(1),
            ..Default::default()
        }];
        app
    }

    fn build(app: &KieApp, overrides: &ImageOverrides) -> RenderContext {
        let resolved = ResolvedSpec::new(&app.spec, &app.status.generated);
        build_context(app, &resolved, lookup_profile(&app.spec.environment), overrides).unwrap()
    }

    #[test]
    fn test_console_defaults() {
        let context = build(&app("rhpam-trial"), &ImageOverrides::none());
        let console = &context.console;
        assert_eq!(console.name, "rhpamcentr");
        assert_eq!(console.replicas, 1);
        assert_eq!(console.image_url, "rhpam-businesscentral-rhel8:7.8.0");
        assert_eq!(console.keystore_secret, "myapp-businesscentral-app-secret");
        assert!(!console.git_hooks.enabled);
        assert_eq!(context.namespace, "demo");
        assert_eq!(context.application_name, "myapp");
    }

    #[test]
    fn test_console_user_overrides() {
        let mut app = app("rhpam-production");
        app.spec.objects.console = ConsoleObject {
            keystore_secret: Some("my-keystore".to_string()),
            image_tag: Some("7.8.0-5".to_string()),
            git_hooks: Some(Default::default()),
            ..Default::default()
        };
        let overrides = ImageOverrides::from_vars([(
            "RELATED_IMAGE_PAM_BUSINESSCENTRAL_MONITORING_IMAGE_7.8.0",
            "registry.example.com/bc-mon@sha256:1",
        )]);
        let context = build(&app, &overrides);
        let console = &context.console;
        assert_eq!(console.name, "rhpamcentrmon");
        assert_eq!(console.keystore_secret, "my-keystore");
        assert_eq!(console.image_tag, "7.8.0-5");
        assert!(!console.omit_image_stream);
        assert_eq!(console.git_hooks.mount_path, GIT_HOOKS_DEFAULT_DIR);
    }

    #[test]
    fn test_router_only_when_requested() {
        let context = build(&app("rhpam-authoring"), &ImageOverrides::none());
        assert_eq!(context.smart_router, SmartRouterTemplate::default());
        assert!(context.servers.iter().all(|s| s.smart_router_protocol.is_empty()));

        let mut app = app("rhpam-authoring");
        app.spec.objects.smart_router = Some(SmartRouterObject::default());
        let context = build(&app, &ImageOverrides::none());
        assert_eq!(context.smart_router.protocol, "http");
        assert_eq!(context.smart_router.replicas, 1);
        assert_eq!(
            context.smart_router.keystore_secret,
            "myapp-smartrouter-app-secret"
        );
        assert_eq!(context.smart_router.image_url, "rhpam-smartrouter-rhel8:7.8.0");
        assert_eq!(context.servers[0].smart_router_protocol, "http");
    }

    #[test]
    fn test_process_migration_only_for_rhpam() {
        let mut pam = app("rhpam-authoring");
        pam.spec.objects.process_migration = Some(ProcessMigrationObject::default());
        let context = build(&pam, &ImageOverrides::none());
        let pim = &context.process_migration;
        assert!(pim.enabled);
        assert_eq!(pim.database.kind, "h2");
        assert_eq!(pim.kie_server_clients.len(), 1);
        assert_eq!(
            pim.kie_server_clients[0].host,
            "http://myapp-kieserver:8080/services/rest/server"
        );
        assert_eq!(pim.kie_server_clients[0].password, "RedHat");

        let mut dm = app("rhdm-authoring");
        dm.spec.objects.process_migration = Some(ProcessMigrationObject::default());
        let context = build(&dm, &ImageOverrides::none());
        assert!(!context.process_migration.enabled);
    }

    #[test]
    fn test_constants() {
        let overrides = ImageOverrides::from_vars([(
            "RELATED_IMAGE_MYSQL_IMAGE_7.8.0",
            "registry.example.com/mysql:8",
        )]);
        let context = build(&app("rhdm-trial"), &overrides);
        let constants = &context.constants;
        assert_eq!(constants.product, "rhdm");
        assert_eq!(
            (constants.major.as_str(), constants.minor.as_str(), constants.micro.as_str()),
            ("7", "8", "0")
        );
        assert_eq!(constants.mysql_image_url, "registry.example.com/mysql:8");
        assert_eq!(
            constants.postgresql_image_url,
            "registry.redhat.io/rhscl/postgresql-10-rhel7:latest"
        );

        let mut tagged = app("rhdm-trial");
        tagged.spec.use_image_tags = true;
        let context = build(&tagged, &overrides);
        assert_eq!(
            context.constants.mysql_image_url,
            "registry.redhat.io/rhscl/mysql-80-rhel7:latest"
        );
    }

    #[test]
    fn test_unknown_profile_falls_back() {
        let context = build(&app("custom-env"), &ImageOverrides::none());
        assert_eq!(context.console.replicas, 1);
        assert_eq!(context.console.image_url, "");
        assert_eq!(context.servers.len(), 1);
        assert_eq!(context.servers[0].replicas, 1);
        assert_eq!(context.servers[0].database.kind, "");
    }

    #[test]
    fn test_jvm_template() {
        let jvm = JvmObject {
            java_max_mem_ratio: Some(60),
            java_debug: Some(true),
            ..Default::default()
        };
        let template = jvm_template(Some(&jvm));
        assert_eq!(template.java_max_mem_ratio, "60");
        assert_eq!(template.java_debug, "true");
        assert_eq!(template.java_opts_append, "");
    }
}
