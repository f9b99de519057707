//! 設定の読み込みエラー

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// OS の設定ディレクトリを特定できない
    #[error("OS の設定ディレクトリを特定できません")]
    ConfigDirNotFound,

    /// どの候補にも設定ファイルがない（既定値で動作する）
    #[error("kieapp.yaml が見つかりません（KIEAPP_CONFIG_PATH、カレントディレクトリ、./.kieapp/、~/.config/kieapp/ を探索）")]
    SettingsFileNotFound,

    #[error("{path} を読み込めません: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
