//! オペレーターの設定
//!
//! 設定ファイルの探索と読み込み、カタログのバックエンド選択を扱います。

pub mod error;
pub mod settings;

pub use error::*;
pub use settings::*;

use std::path::PathBuf;

const SETTINGS_FILE_NAMES: [&str; 2] = ["kieapp.yaml", ".kieapp.yaml"];
const SETTINGS_PATH_ENV: &str = "KIEAPP_CONFIG_PATH";

/// グローバル設定ファイルのパス（`~/.config/kieapp/kieapp.yaml`）
pub fn global_settings_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(dir.join("kieapp").join(SETTINGS_FILE_NAMES[0]))
}

/// 設定ファイルの候補を優先順に列挙
///
/// 1. 環境変数 KIEAPP_CONFIG_PATH
/// 2. カレントディレクトリの kieapp.yaml, .kieapp.yaml
/// 3. ./.kieapp/ 内の同名ファイル
/// 4. グローバル設定
fn settings_candidates() -> Result<Vec<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::env::var_os(SETTINGS_PATH_ENV)
        .map(PathBuf::from)
        .into_iter()
        .collect();

    let current_dir = std::env::current_dir()?;
    for dir in [current_dir.clone(), current_dir.join(".kieapp")] {
        candidates.extend(SETTINGS_FILE_NAMES.iter().map(|name| dir.join(name)));
    }
    if let Ok(global) = global_settings_path() {
        candidates.push(global);
    }
    Ok(candidates)
}

/// 最初に見つかった設定ファイル
pub fn find_settings_file() -> Result<PathBuf> {
    settings_candidates()?
        .into_iter()
        .find(|path| path.is_file())
        .ok_or(ConfigError::SettingsFileNotFound)
}
