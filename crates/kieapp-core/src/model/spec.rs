//! 利用者が記述する要求仕様（Spec）

use super::auth::AuthConfig;
use super::environment::{EnvVar, ResourceRequirements};
use super::meta::{ImageReference, is_default, is_false, nullable};
use serde::{Deserialize, Serialize};

/// デプロイ仕様
///
/// 同じ型を `status.generated` にも使う。生成側には利用者が指定しなかった値だけが入る。
///
/// YAML形式：
/// ```yaml
/// environment: rhpam-trial
/// commonConfig:
///   applicationName: myapp
/// objects:
///   servers:
///     - deployments: 2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieAppSpec {
    /// 環境プロファイル（rhpam-trial, rhpam-production, ...）
    #[serde(skip_serializing_if = "String::is_empty")]
    pub environment: String,
    /// オペレーターのイメージ上書きを使わず、タグだけで解決する
    #[serde(skip_serializing_if = "is_false")]
    pub use_image_tags: bool,
    /// プロダクトバージョンの固定
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// バージョン移行の許可
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrades: Option<KieAppUpgrades>,
    #[serde(skip_serializing_if = "is_default")]
    pub common_config: CommonConfig,
    #[serde(skip_serializing_if = "is_default")]
    pub objects: KieAppObjects,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

/// バージョン移行の設定
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieAppUpgrades {
    /// 同一マイナー内のマイクロ移行を許可
    pub enabled: bool,
    /// マイナーバージョンをまたぐ移行も許可
    pub minor: bool,
}

/// 全コンポーネント共通の設定と資格情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_store_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amq_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amq_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amq_cluster_password: Option<String>,
}

/// コンポーネントごとの要求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieAppObjects {
    #[serde(skip_serializing_if = "is_default")]
    pub console: ConsoleObject,
    /// 未指定ならルーターはデプロイしない
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_router: Option<SmartRouterObject>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub servers: Vec<KieServerSet>,
    /// 未指定ならプロセス移行サービスはデプロイしない
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_migration: Option<ProcessMigrationObject>,
}

/// 全コンポーネントに共通する上書き項目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieAppObject {
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub env: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleObject {
    #[serde(flatten)]
    pub base: KieAppObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_hooks: Option<GitHooksVolume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jvm: Option<JvmObject>,
}

/// Git フックの取り込み設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitHooksVolume {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ImageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_secret_name: Option<String>,
}

/// JVM 設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JvmObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_opts_append: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_max_mem_ratio: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_initial_mem_ratio: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_max_initial_mem: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_diagnostics: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_debug_port: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmartRouterObject {
    #[serde(flatten)]
    pub base: KieAppObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub use_external_route: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
}

/// サーバーセット
///
/// 同一構成の kieserver を `deployments` 個まとめて要求する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieServerSet {
    /// 未指定なら `<applicationName>-kieserver<N>` を採番
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployments: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub base: KieAppObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ImageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<KieAppBuildObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jms: Option<KieAppJmsObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jvm: Option<JvmObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
}

impl KieServerSet {
    /// 空文字を未指定として扱った名前
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// ビルド設定（ソースビルドまたは拡張イメージビルド）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieAppBuildObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kie_server_container_deployment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_source: Option<GitSource>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub webhooks: Vec<WebhookSecret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ImageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maven_mirror_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_image_stream_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_image_stream_tag_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_image_install_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitSource {
    pub uri: String,
    pub reference: String,
    pub context_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookType {
    GitHub,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSecret {
    #[serde(rename = "type")]
    pub kind: WebhookType,
    pub secret: String,
}

/// データベース種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    H2,
    Mysql,
    Postgresql,
    External,
}

impl DatabaseType {
    /// テンプレートのキーやワークロード名に使う文字列
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H2 => "h2",
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
            Self::External => "external",
        }
    }

    /// オペレーターがデータベース本体もデプロイする種別か
    pub fn is_deployed(&self) -> bool {
        matches!(self, Self::Mysql | Self::Postgresql)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseObject {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DatabaseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_config: Option<ExternalDatabaseObject>,
}

/// 外部データベースの接続パラメータ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalDatabaseObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jdbc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// JMS（AMQ）連携設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieAppJmsObject {
    pub enable_integration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<bool>,
    #[serde(skip_serializing_if = "is_false")]
    pub executor_transacted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_transacted: Option<bool>,
    #[serde(skip_serializing_if = "is_false")]
    pub enable_signal: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub enable_audit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_executor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_signal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_audit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amq_secret_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amq_keystore_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amq_keystore_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amq_truststore_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amq_truststore_password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessMigrationObject {
    #[serde(flatten)]
    pub base: KieAppObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseObject>,
}
