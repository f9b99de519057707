//! 環境プロファイル表
//!
//! プロファイル識別子からレプリカ数の既定値、スケール可否、既定データベースを引く。
//! 未知の識別子は「プロファイルなし」として扱い、呼び出し側で既定値に落とす。

use super::spec::{DatabaseObject, DatabaseType};
use crate::constants::{
    DM_DC_IMAGE_VAR, DM_KIE_IMAGE_VAR, PAM_BC_IMAGE_VAR, PAM_BC_MONITORING_IMAGE_VAR,
    PAM_KIE_IMAGE_VAR, RHDM_PREFIX, RHPAM_PREFIX, TRIAL_ENV_SUFFIX,
};
use std::collections::HashMap;
use std::sync::LazyLock;

/// レプリカ数の既定値とスケール可否
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replicas {
    pub replicas: i32,
    /// true の場合、利用者の指定値は無視され `replicas` に固定される
    pub deny_scale: bool,
}

impl Replicas {
    const fn scalable(replicas: i32) -> Self {
        Self {
            replicas,
            deny_scale: false,
        }
    }

    const fn fixed(replicas: i32) -> Self {
        Self {
            replicas,
            deny_scale: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileReplicas {
    pub console: Replicas,
    pub smart_router: Replicas,
    pub server: Replicas,
    pub process_migration: Replicas,
}

/// 環境プロファイル
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// rhpam / rhdm
    pub product: &'static str,
    /// コンソールのワークロード名の接尾辞
    pub prefix: &'static str,
    /// コンソールイメージ名
    pub image_name: &'static str,
    /// コンソールイメージを上書きする環境変数の接頭辞
    pub image_var: &'static str,
    pub maven_repo: &'static str,
    pub replicas: ProfileReplicas,
    /// サーバーセットがデータベースを指定しなかった場合の既定値
    pub database: Option<DatabaseObject>,
}

impl Profile {
    pub fn is_rhpam(&self) -> bool {
        self.product == RHPAM_PREFIX
    }

    /// kieserver イメージを上書きする環境変数の接頭辞
    pub fn server_image_var(&self) -> &'static str {
        if self.product == RHDM_PREFIX {
            DM_KIE_IMAGE_VAR
        } else {
            PAM_KIE_IMAGE_VAR
        }
    }
}

fn database(kind: DatabaseType, size: &str) -> Option<DatabaseObject> {
    Some(DatabaseObject {
        kind: Some(kind),
        size: Some(size.to_string()),
        ..Default::default()
    })
}

static PROFILES: LazyLock<HashMap<&'static str, Profile>> = LazyLock::new(|| {
    let authoring = ProfileReplicas {
        console: Replicas::fixed(1),
        smart_router: Replicas::scalable(1),
        server: Replicas::scalable(1),
        process_migration: Replicas::scalable(1),
    };
    let authoring_ha = ProfileReplicas {
        console: Replicas::scalable(2),
        smart_router: Replicas::scalable(1),
        server: Replicas::scalable(2),
        process_migration: Replicas::scalable(1),
    };
    let production = ProfileReplicas {
        console: Replicas::scalable(1),
        smart_router: Replicas::scalable(1),
        server: Replicas::scalable(2),
        process_migration: Replicas::scalable(1),
    };

    let pam_central = |replicas, database| Profile {
        product: RHPAM_PREFIX,
        prefix: "rhpamcentr",
        image_name: "businesscentral",
        image_var: PAM_BC_IMAGE_VAR,
        maven_repo: "RHPAMCENTR",
        replicas,
        database,
    };
    let pam_monitoring = |replicas, database| Profile {
        product: RHPAM_PREFIX,
        prefix: "rhpamcentrmon",
        image_name: "businesscentral-monitoring",
        image_var: PAM_BC_MONITORING_IMAGE_VAR,
        maven_repo: "RHPAMCENTR",
        replicas,
        database,
    };
    let dm_central = |replicas| Profile {
        product: RHDM_PREFIX,
        prefix: "rhdmcentr",
        image_name: "decisioncentral",
        image_var: DM_DC_IMAGE_VAR,
        maven_repo: "RHDMCENTR",
        replicas,
        database: None,
    };

    HashMap::from([
        (
            "rhpam-trial",
            pam_central(authoring, database(DatabaseType::H2, "")),
        ),
        (
            "rhpam-authoring",
            pam_central(authoring, database(DatabaseType::H2, "1Gi")),
        ),
        (
            "rhpam-authoring-ha",
            pam_central(authoring_ha, database(DatabaseType::Mysql, "1Gi")),
        ),
        (
            "rhpam-production",
            pam_monitoring(production, database(DatabaseType::Postgresql, "1Gi")),
        ),
        (
            "rhpam-production-immutable",
            pam_monitoring(production, database(DatabaseType::H2, "1Gi")),
        ),
        ("rhdm-trial", dm_central(authoring)),
        ("rhdm-authoring", dm_central(authoring)),
        ("rhdm-authoring-ha", dm_central(authoring_ha)),
        ("rhdm-production-immutable", dm_central(production)),
    ])
});

/// プロファイルを検索
///
/// 未知の識別子は `None`（プロファイルなし）。
pub fn lookup_profile(environment: &str) -> Option<&'static Profile> {
    PROFILES.get(environment)
}

/// 対応しているプロファイル識別子（ソート済み）
pub fn profile_names() -> Vec<&'static str> {
    let mut names: Vec<_> = PROFILES.keys().copied().collect();
    names.sort_unstable();
    names
}

/// trial プロファイルかどうか
pub fn is_trial(environment: &str) -> bool {
    environment.ends_with(TRIAL_ENV_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_profiles() {
        assert_eq!(profile_names().len(), 9);

        let trial = lookup_profile("rhpam-trial").unwrap();
        assert_eq!(trial.product, "rhpam");
        assert_eq!(trial.prefix, "rhpamcentr");
        assert!(trial.is_rhpam());
        assert_eq!(trial.server_image_var(), PAM_KIE_IMAGE_VAR);

        let dm = lookup_profile("rhdm-production-immutable").unwrap();
        assert!(!dm.is_rhpam());
        assert!(dm.database.is_none());
        assert_eq!(dm.server_image_var(), DM_KIE_IMAGE_VAR);
    }

    #[test]
    fn test_unknown_profile_is_none() {
        assert!(lookup_profile("rhpam-nonexistent").is_none());
        assert!(lookup_profile("").is_none());
    }

    #[test]
    fn test_is_trial() {
        assert!(is_trial("rhpam-trial"));
        assert!(is_trial("rhdm-trial"));
        assert!(!is_trial("rhpam-production"));
    }

    #[test]
    fn test_production_console_is_monitoring() {
        let production = lookup_profile("rhpam-production").unwrap();
        assert_eq!(production.image_name, "businesscentral-monitoring");
        assert_eq!(production.image_var, PAM_BC_MONITORING_IMAGE_VAR);
        assert_eq!(
            production.database.as_ref().and_then(|db| db.kind),
            Some(DatabaseType::Postgresql)
        );
    }
}
