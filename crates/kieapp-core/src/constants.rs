//! 定数定義
//!
//! プロダクトバージョン、既定値、オペレーターが参照する環境変数名など。

use std::collections::HashMap;
use std::sync::LazyLock;

/// このオペレーターが標準で展開するプロダクトバージョン
pub const CURRENT_VERSION: &str = "7.8.0";

/// 利用可能なプロダクトバージョン（新しい順）
pub const SUPPORTED_VERSIONS: &[&str] = &["7.8.0", "7.7.1", "7.7.0"];

/// オペレーター自身のバージョン（アノテーションに記録）
pub const OPERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// リソースのアノテーションキー
pub const API_GROUP: &str = "app.kiegroup.org";

pub const RHPAM_PREFIX: &str = "rhpam";
pub const RHDM_PREFIX: &str = "rhdm";
pub const RHEL_VERSION: &str = "-rhel8";

pub const IMAGE_STREAM_NAMESPACE: &str = "openshift";
pub const IMAGE_STREAM_TAG_KIND: &str = "ImageStreamTag";

pub const DEFAULT_ADMIN_USER: &str = "adminUser";
pub const DEFAULT_AMQ_USER: &str = "amqUser";
/// trial 環境で使う固定パスワード（デモ環境を再現可能にするため）
pub const DEFAULT_PASSWORD: &str = "RedHat";
pub const PASSWORD_LENGTH: usize = 8;
pub const TRIAL_ENV_SUFFIX: &str = "trial";

pub const DEFAULT_KIE_DEPLOYMENTS: u32 = 1;
pub const SMART_ROUTER_PROTOCOL: &str = "http";
pub const GIT_HOOKS_DEFAULT_DIR: &str = "/opt/kie/data/git/hooks";
pub const DEFAULT_EXTENSION_IMAGE_INSTALL_DIR: &str = "/extensions";

pub const DEFAULT_KIE_SERVER_DATABASE_USERNAME: &str = "rhpam";
pub const DEFAULT_KIE_SERVER_DATABASE_NAME: &str = "rhpam7";
pub const DEFAULT_PROCESS_MIGRATION_DATABASE_USERNAME: &str = "pim";
pub const DEFAULT_PROCESS_MIGRATION_DATABASE_NAME: &str = "pimdb";

/// 外部キー/バリューストアに置く ConfigMap 名の接頭辞
pub const CONFIG_MAP_PREFIX: &str = "kieconfigs";

/// ルーター未使用時に kieserver から取り除く環境変数
pub const ROUTER_ENV_VARS: &[&str] = &[
    "KIE_SERVER_ROUTER_SERVICE",
    "KIE_SERVER_ROUTER_PORT",
    "KIE_SERVER_ROUTER_PROTOCOL",
];

// オペレーターレベルのイメージ上書き（末尾にバージョンを付けて参照する）
pub const RELATED_IMAGE_PREFIX: &str = "RELATED_IMAGE_";
pub const PAM_KIE_IMAGE_VAR: &str = "RELATED_IMAGE_PAM_KIESERVER_IMAGE_";
pub const DM_KIE_IMAGE_VAR: &str = "RELATED_IMAGE_DM_KIESERVER_IMAGE_";
pub const PAM_BC_IMAGE_VAR: &str = "RELATED_IMAGE_PAM_BUSINESSCENTRAL_IMAGE_";
pub const PAM_BC_MONITORING_IMAGE_VAR: &str = "RELATED_IMAGE_PAM_BUSINESSCENTRAL_MONITORING_IMAGE_";
pub const DM_DC_IMAGE_VAR: &str = "RELATED_IMAGE_DM_DECISIONCENTRAL_IMAGE_";
pub const PAM_SMART_ROUTER_VAR: &str = "RELATED_IMAGE_PAM_SMARTROUTER_IMAGE_";
pub const PAM_PROCESS_MIGRATION_VAR: &str = "RELATED_IMAGE_PAM_PROCESS_MIGRATION_IMAGE_";
pub const OSE_CLI_VAR: &str = "RELATED_IMAGE_OSE_CLI_IMAGE_";
pub const MYSQL_VAR: &str = "RELATED_IMAGE_MYSQL_IMAGE_";
pub const POSTGRESQL_VAR: &str = "RELATED_IMAGE_POSTGRESQL_IMAGE_";
pub const DATAGRID_VAR: &str = "RELATED_IMAGE_DATAGRID_IMAGE_";
pub const BROKER_VAR: &str = "RELATED_IMAGE_BROKER_IMAGE_";

/// バージョン固有の付随イメージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstants {
    pub broker_image: &'static str,
    pub broker_image_tag: &'static str,
    pub datagrid_image: &'static str,
    pub datagrid_image_tag: &'static str,
    pub ose_cli_image_url: &'static str,
    pub mysql_image_url: &'static str,
    pub postgresql_image_url: &'static str,
    pub datagrid_image_url: &'static str,
    pub broker_image_url: &'static str,
}

static VERSION_CONSTANTS: LazyLock<HashMap<&'static str, VersionConstants>> =
    LazyLock::new(|| {
        let v7_8 = VersionConstants {
            broker_image: "amq-broker",
            broker_image_tag: "7.7",
            datagrid_image: "datagrid73-openshift",
            datagrid_image_tag: "1.5",
            ose_cli_image_url: "registry.redhat.io/openshift4/ose-cli:v4.5",
            mysql_image_url: "registry.redhat.io/rhscl/mysql-80-rhel7:latest",
            postgresql_image_url: "registry.redhat.io/rhscl/postgresql-10-rhel7:latest",
            datagrid_image_url: "registry.redhat.io/jboss-datagrid-7/datagrid73-openshift:1.5",
            broker_image_url: "registry.redhat.io/amq7/amq-broker:7.7",
        };
        let v7_7 = VersionConstants {
            broker_image_tag: "7.6",
            datagrid_image_tag: "1.4",
            ose_cli_image_url: "registry.redhat.io/openshift4/ose-cli:v4.4",
            mysql_image_url: "registry.redhat.io/rhscl/mysql-57-rhel7:latest",
            datagrid_image_url: "registry.redhat.io/jboss-datagrid-7/datagrid73-openshift:1.4",
            broker_image_url: "registry.redhat.io/amq7/amq-broker:7.6",
            ..v7_8.clone()
        };
        HashMap::from([
            ("7.8.0", v7_8),
            ("7.7.1", v7_7.clone()),
            ("7.7.0", v7_7),
        ])
    });

/// バージョン固有の定数を取得
pub fn version_constants(version: &str) -> Option<&'static VersionConstants> {
    VERSION_CONSTANTS.get(version)
}

/// keystore シークレット名の既定値
pub fn keystore_secret_name(base: &str) -> String {
    format!("{}-app-secret", base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_version_has_constants() {
        for version in SUPPORTED_VERSIONS {
            assert!(
                version_constants(version).is_some(),
                "{} の定数がありません",
                version
            );
        }
        assert!(SUPPORTED_VERSIONS.contains(&CURRENT_VERSION));
    }

    #[test]
    fn test_keystore_secret_name() {
        assert_eq!(
            keystore_secret_name("myapp-businesscentral"),
            "myapp-businesscentral-app-secret"
        );
    }
}
