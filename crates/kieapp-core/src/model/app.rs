use super::meta::ObjectMeta;
use super::spec::KieAppSpec;
use serde::{Deserialize, Serialize};

/// KIE アプリケーションのリソース
///
/// `spec` は利用者の要求、`status` はオペレーターが生成して保存する既定値。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieApp {
    pub metadata: ObjectMeta,
    pub spec: KieAppSpec,
    pub status: KieAppStatus,
}

impl KieApp {
    /// YAML 文字列からリソースを読み込む
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KieAppStatus {
    /// 生成された既定値（利用者が指定した項目は常に空）
    pub generated: KieAppSpec,
    /// ビルド用 webhook の生成シークレット
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}
