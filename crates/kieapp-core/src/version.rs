//! プロダクトバージョンの解決とアップグレード判定

use crate::catalogue::TemplateCatalogue;
use crate::constants::SUPPORTED_VERSIONS;
use crate::error::{KieError, Result};
use crate::model::KieApp;
use semver::Version;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// `7.8.0` を ("7", "8", "0") に分解
///
/// semver として解釈できない場合はドット区切りで読み、欠けた要素は空文字。
pub fn major_minor_micro(version: &str) -> (String, String, String) {
    if let Ok(parsed) = Version::parse(version) {
        return (
            parsed.major.to_string(),
            parsed.minor.to_string(),
            parsed.patch.to_string(),
        );
    }
    let mut parts = version.splitn(3, '.').map(str::to_string);
    (
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
    )
}

/// マイナー系列の識別子（`7.8.0` → `78`）
pub fn minor_tier(version: &str) -> String {
    let (major, minor, _) = major_minor_micro(version);
    format!("{}{}", major, minor)
}

/// 対象のバージョン（Spec の固定値、保存値、現行の順）
pub fn effective_version<'a>(app: &'a KieApp, current_version: &'a str) -> &'a str {
    [
        app.spec.version.as_deref(),
        app.status.generated.version.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|v| !v.is_empty())
    .unwrap_or(current_version)
}

/// 2 つのカタログバージョン間のフラグメント差分
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiff {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub changed: Vec<String>,
}

impl ConfigDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.changed.is_empty()
    }
}

/// 必要と判定されたバージョン移行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTransition {
    pub from: String,
    pub to: String,
    pub diff: ConfigDiff,
}

/// バージョン移行が必要か判定し、必要なら差分を取得
///
/// メジャーバージョンをまたぐ移行は行わない。差分の取得に失敗した場合は
/// Status を変更する前にエラーを返す。
#[tracing::instrument(skip(app, catalogue), fields(app = %app.metadata.name))]
pub fn resolve_version_transition(
    app: &KieApp,
    current_version: &str,
    catalogue: &dyn TemplateCatalogue,
) -> Result<Option<VersionTransition>> {
    let version = effective_version(app, current_version);
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(KieError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_VERSIONS.join(", "),
        });
    }

    let upgrades = app.spec.upgrades.clone().unwrap_or_default();
    let micro = upgrades.enabled && version != current_version;
    let minor = micro && upgrades.minor;

    let (major, _, _) = major_minor_micro(version);
    let (current_major, _, _) = major_minor_micro(current_version);
    let same_tier = minor_tier(version) == minor_tier(current_version);

    let required = (micro && same_tier) || (minor && !same_tier && major == current_major);
    if !required {
        debug!(version, micro, minor, "No version transition required");
        return Ok(None);
    }

    let diff = config_version_diffs(catalogue, version, current_version)?;
    info!(
        from = version,
        to = current_version,
        removed = diff.removed.len(),
        added = diff.added.len(),
        changed = diff.changed.len(),
        "Upgrading product version"
    );
    Ok(Some(VersionTransition {
        from: version.to_string(),
        to: current_version.to_string(),
        diff,
    }))
}

/// 旧バージョンと新バージョンのカタログを比較
pub fn config_version_diffs(
    catalogue: &dyn TemplateCatalogue,
    from: &str,
    to: &str,
) -> Result<ConfigDiff> {
    let diff_error = |e: KieError| KieError::UpgradeDiff {
        from: from.to_string(),
        to: to.to_string(),
        message: e.to_string(),
    };

    let old_keys: BTreeSet<String> = catalogue.keys(from).map_err(diff_error)?.into_iter().collect();
    let new_keys: BTreeSet<String> = catalogue.keys(to).map_err(diff_error)?.into_iter().collect();

    let mut diff = ConfigDiff {
        removed: old_keys.difference(&new_keys).cloned().collect(),
        added: new_keys.difference(&old_keys).cloned().collect(),
        changed: Vec::new(),
    };
    for key in old_keys.intersection(&new_keys) {
        let old = catalogue.get(from, key).map_err(diff_error)?;
        let new = catalogue.get(to, key).map_err(diff_error)?;
        if old != new {
            diff.changed.push(key.clone());
        }
    }

    for key in &diff.removed {
        debug!(key, from, to, "Fragment removed in new version");
    }
    for key in &diff.changed {
        debug!(key, from, to, "Fragment changed in new version");
    }
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::BundleCatalogue;
    use crate::model::KieAppUpgrades;

    fn catalogue() -> BundleCatalogue {
        BundleCatalogue::from_entries([
            ("7.7.1", "common.yaml", "console: {}"),
            ("7.7.1", "envs/rhpam-trial.yaml", "old"),
            ("7.7.1", "jms/legacy.yaml", "legacy"),
            ("7.8.0", "common.yaml", "console: {}"),
            ("7.8.0", "envs/rhpam-trial.yaml", "new"),
            ("7.8.0", "pim/process-migration.yaml", "pim"),
        ])
    }

    fn app(version: &str, enabled: bool, minor: bool) -> KieApp {
        let mut app = KieApp::default();
        app.metadata.name = "myapp".to_string();
        app.spec.version = Some(version.to_string());
        app.spec.upgrades = Some(KieAppUpgrades { enabled, minor });
        app
    }

    #[test]
    fn test_major_minor_micro() {
        assert_eq!(
            major_minor_micro("7.8.0"),
            ("7".to_string(), "8".to_string(), "0".to_string())
        );
        assert_eq!(
            major_minor_micro("7.8"),
            ("7".to_string(), "8".to_string(), String::new())
        );
        assert_eq!(minor_tier("7.7.1"), "77");
    }

    #[test]
    fn test_effective_version_order() {
        let mut app = KieApp::default();
        assert_eq!(effective_version(&app, "7.8.0"), "7.8.0");
        app.status.generated.version = Some("7.7.1".to_string());
        assert_eq!(effective_version(&app, "7.8.0"), "7.7.1");
        app.spec.version = Some("7.7.0".to_string());
        assert_eq!(effective_version(&app, "7.8.0"), "7.7.0");
    }

    #[test]
    fn test_unsupported_version() {
        let err = resolve_version_transition(&app("6.4.0", true, true), "7.8.0", &catalogue())
            .unwrap_err();
        assert!(matches!(err, KieError::UnsupportedVersion { .. }));
        assert!(err.to_string().contains("7.8.0"));
    }

    #[test]
    fn test_no_transition_without_opt_in() {
        let result =
            resolve_version_transition(&app("7.7.1", false, false), "7.8.0", &catalogue()).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_minor_tier_change_requires_minor_opt_in() {
        let result =
            resolve_version_transition(&app("7.7.1", true, false), "7.8.0", &catalogue()).unwrap();
        assert_eq!(result, None);

        let transition =
            resolve_version_transition(&app("7.7.1", true, true), "7.8.0", &catalogue())
                .unwrap()
                .unwrap();
        assert_eq!(transition.from, "7.7.1");
        assert_eq!(transition.to, "7.8.0");
        assert_eq!(transition.diff.removed, vec!["jms/legacy.yaml"]);
        assert_eq!(transition.diff.added, vec!["pim/process-migration.yaml"]);
        assert_eq!(transition.diff.changed, vec!["envs/rhpam-trial.yaml"]);
    }

    #[test]
    fn test_micro_transition_within_tier() {
        let catalogue = BundleCatalogue::from_entries([
            ("7.7.0", "common.yaml", "a"),
            ("7.7.1", "common.yaml", "a"),
        ]);
        let transition = resolve_version_transition(&app("7.7.0", true, false), "7.7.1", &catalogue)
            .unwrap()
            .unwrap();
        assert!(transition.diff.is_empty());
    }

    #[test]
    fn test_diff_failure_aborts() {
        let catalogue = BundleCatalogue::from_entries([("7.8.0", "common.yaml", "a")]);
        let err = resolve_version_transition(&app("7.7.1", true, true), "7.8.0", &catalogue)
            .unwrap_err();
        assert!(matches!(err, KieError::UpgradeDiff { ref from, .. } if from == "7.7.1"));
    }
}
