//! オペレーター設定の読み込みとカタログのバックエンド選択

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 同梱カタログの既定ディレクトリ
pub const DEFAULT_CATALOGUE_DIR: &str = "config";

/// オペレーターの実行設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorSettings {
    /// 監視対象の名前空間
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_name: Option<String>,
    /// 同梱カタログのディレクトリ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalogue_dir: Option<PathBuf>,
}

impl OperatorSettings {
    /// 設定ファイルから読み込む
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded operator settings");
        Ok(settings)
    }

    /// `WATCH_NAMESPACE` / `OPERATOR_NAME` で上書き
    pub fn with_env_overrides(mut self) -> Self {
        for (var, target) in [
            ("WATCH_NAMESPACE", &mut self.watch_namespace),
            ("OPERATOR_NAME", &mut self.operator_name),
        ] {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                *target = Some(value);
            }
        }
        self
    }
}

/// 設定を読み込む
///
/// 設定ファイルがなければ既定値に環境変数の上書きだけを適用する。
pub fn load_settings() -> Result<OperatorSettings> {
    let settings = match crate::find_settings_file() {
        Ok(path) => OperatorSettings::from_file(&path)?,
        Err(ConfigError::SettingsFileNotFound) => {
            debug!("No settings file found, using defaults");
            OperatorSettings::default()
        }
        Err(e) => return Err(e),
    };
    Ok(settings.with_env_overrides())
}

/// フラグメントの取得元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueSource {
    /// 同梱バンドル
    Embedded { dir: PathBuf },
    /// 外部キー/バリューストア（ConfigMap）
    ConfigMaps {
        namespace: String,
        operator_name: String,
    },
}

impl CatalogueSource {
    /// 名前空間とオペレーター名が両方分かる場合だけ外部ストアを使う
    pub fn select(settings: &OperatorSettings) -> Self {
        let known = |v: &Option<String>| v.clone().filter(|v| !v.is_empty());
        match (known(&settings.watch_namespace), known(&settings.operator_name)) {
            (Some(namespace), Some(operator_name)) => Self::ConfigMaps {
                namespace,
                operator_name,
            },
            _ => Self::Embedded {
                dir: settings
                    .catalogue_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOGUE_DIR)),
            },
        }
    }
}
