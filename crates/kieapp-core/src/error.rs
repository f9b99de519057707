use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KieError {
    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("kieserver 名が重複しています: {0}")]
    DuplicateServerName(String),

    #[error("ビルド設定を持つサーバーセット '{set}' に {deployments} 個のデプロイは要求できません")]
    BuildDeploymentConflict { set: String, deployments: u32 },

    #[error("{0} の external データベースには externalConfig の指定が必須です")]
    ExternalDatabaseConfigMissing(String),

    #[error(
        "プロダクトバージョン {version} はこのオペレーターでは使用できません\n対応バージョン: {supported}"
    )]
    UnsupportedVersion { version: String, supported: String },

    #[error("認証設定エラー: {0}")]
    AuthConfig(String),

    #[error("ワークロード名が重複しています: {0}")]
    DuplicateWorkloadName(String),

    #[error("プロダクトバージョン {0} のテンプレートはカタログに含まれていません")]
    VersionNotAvailable(String),

    #[error("テンプレートが見つかりません: {version}/{key}")]
    FragmentNotFound { version: String, key: String },

    #[error("{namespace}/{name} ConfigMap にまだアクセスできません。再試行します")]
    CatalogueNotReady { namespace: String, name: String },

    #[error("テンプレートエラー: {key}\n理由: {message}")]
    TemplateError { key: String, message: String },

    #[error("テンプレートのパースエラー: {key}\n理由: {message}")]
    FragmentParse { key: String, message: String },

    #[error("バージョン {from} から {to} への設定差分の取得に失敗しました\n理由: {message}")]
    UpgradeDiff {
        from: String,
        to: String,
        message: String,
    },

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },
}

impl KieError {
    /// 次回の reconcile で再試行すれば解消し得るエラーかどうか
    ///
    /// 外部ストアは収束途中の可能性があるため、ConfigMap の未検出だけが該当します。
    pub fn is_retryable(&self) -> bool {
        matches!(self, KieError::CatalogueNotReady { .. })
    }
}

pub type Result<T> = std::result::Result<T, KieError>;
