//! テンプレートに渡す解決済みの値
//!
//! フラグメントが null を見ないよう、すべて文字列・整数・真偽値で保持する。
//! 未設定の文字列は空文字になる。

use crate::model::{ImageReference, KieAppObject};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderContext {
    pub application_name: String,
    pub namespace: String,
    pub version: String,
    pub common_config: CommonConfigTemplate,
    pub console: ConsoleTemplate,
    pub smart_router: SmartRouterTemplate,
    pub servers: Vec<ServerTemplate>,
    pub process_migration: ProcessMigrationTemplate,
    pub databases: Vec<DatabaseTemplate>,
    pub constants: TemplateConstants,
    pub auth: AuthTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommonConfigTemplate {
    pub application_name: String,
    pub key_store_password: String,
    pub admin_user: String,
    pub admin_password: String,
    pub db_password: String,
    pub amq_user: String,
    pub amq_password: String,
    pub amq_cluster_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsoleTemplate {
    /// ワークロード名の接尾辞（rhpamcentr など）
    pub name: String,
    pub replicas: i32,
    pub image: String,
    pub image_tag: String,
    pub image_url: String,
    pub omit_image_stream: bool,
    pub keystore_secret: String,
    pub storage_class_name: String,
    pub git_hooks: GitHooksTemplate,
    pub jvm: JvmTemplate,
    pub sso_client: SsoClientTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitHooksTemplate {
    pub enabled: bool,
    pub mount_path: String,
    pub from_kind: String,
    pub from_name: String,
    pub ssh_secret_name: String,
}

/// JVM 設定（未指定の項目は空文字）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JvmTemplate {
    pub java_opts_append: String,
    pub java_max_mem_ratio: String,
    pub java_initial_mem_ratio: String,
    pub java_max_initial_mem: String,
    pub java_diagnostics: String,
    pub java_debug: String,
    pub java_debug_port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SmartRouterTemplate {
    pub replicas: i32,
    pub image: String,
    pub image_tag: String,
    pub image_url: String,
    pub omit_image_stream: bool,
    pub keystore_secret: String,
    pub protocol: String,
    pub use_external_route: bool,
    pub storage_class_name: String,
}

/// 展開済みの kieserver インスタンス
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerTemplate {
    pub kie_name: String,
    pub kie_server_id: String,
    pub replicas: i32,
    pub from: ImageReference,
    pub image_url: String,
    pub omit_image_stream: bool,
    pub keystore_secret: String,
    pub storage_class_name: String,
    /// ルーター未使用時は空
    pub smart_router_protocol: String,
    pub build: BuildTemplate,
    pub database: DatabaseConfigTemplate,
    pub jms: JmsTemplate,
    pub jvm: JvmTemplate,
    pub sso_client: SsoClientTemplate,
    /// 最終段でそのまま適用する利用者の env / resources 上書き
    #[serde(skip)]
    pub overrides: KieAppObject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildTemplate {
    pub enabled: bool,
    pub from: ImageReference,
    pub git_source_uri: String,
    pub git_source_reference: String,
    pub git_source_context_dir: String,
    pub github_webhook_secret: String,
    pub generic_webhook_secret: String,
    pub kie_server_container_deployment: String,
    pub maven_mirror_url: String,
    pub artifact_dir: String,
    pub extension_image_stream_tag: String,
    pub extension_image_stream_tag_namespace: String,
    pub extension_image_install_dir: String,
}

/// コンポーネントが使うデータベース
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseConfigTemplate {
    /// h2 / mysql / postgresql / external、未使用なら空
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
    pub storage_class_name: String,
    pub external: ExternalDatabaseTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalDatabaseTemplate {
    pub driver: String,
    pub dialect: String,
    pub jdbc_url: String,
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JmsTemplate {
    pub enable_integration: bool,
    pub executor: bool,
    pub executor_transacted: bool,
    pub audit_transacted: bool,
    pub enable_signal: bool,
    pub enable_audit: bool,
    pub queue_executor: String,
    pub queue_request: String,
    pub queue_response: String,
    pub queue_signal: String,
    pub queue_audit: String,
    pub amq_queues: String,
    pub username: String,
    pub password: String,
    pub amq_secret_name: String,
    pub amq_keystore_name: String,
    pub amq_keystore_password: String,
    pub amq_truststore_name: String,
    pub amq_truststore_password: String,
    pub amq_enable_ssl: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessMigrationTemplate {
    /// デプロイする場合のみ true
    pub enabled: bool,
    pub replicas: i32,
    pub image: String,
    pub image_tag: String,
    pub image_url: String,
    pub omit_image_stream: bool,
    pub kie_server_clients: Vec<KieServerClient>,
    pub database: DatabaseConfigTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KieServerClient {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// デプロイするデータベース 1 つ分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseTemplate {
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
    pub storage_class_name: String,
    /// データベースを使うコンポーネントの名前
    pub server_name: String,
    pub username: String,
    pub database_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateConstants {
    pub product: String,
    pub major: String,
    pub minor: String,
    pub micro: String,
    pub maven_repo: String,
    pub rhel_version: String,
    pub broker_image: String,
    pub broker_image_tag: String,
    pub datagrid_image: String,
    pub datagrid_image_tag: String,
    pub ose_cli_image_url: String,
    pub mysql_image_url: String,
    pub postgresql_image_url: String,
    pub datagrid_image_url: String,
    pub broker_image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthTemplate {
    pub sso: SsoTemplate,
    pub ldap: LdapTemplate,
    pub role_mapper: RoleMapperTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SsoTemplate {
    pub enabled: bool,
    pub url: String,
    pub realm: String,
    pub admin_user: String,
    pub admin_password: String,
    pub disable_ssl_cert_validation: bool,
    pub principal_attribute: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SsoClientTemplate {
    pub name: String,
    pub secret: String,
    pub hostname_http: String,
    pub hostname_https: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LdapTemplate {
    pub enabled: bool,
    pub url: String,
    pub bind_dn: String,
    pub bind_credential: String,
    pub base_ctx_dn: String,
    pub base_filter: String,
    pub roles_ctx_dn: String,
    pub role_filter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleMapperTemplate {
    pub enabled: bool,
    pub roles_properties: String,
    pub replace_role: bool,
}
