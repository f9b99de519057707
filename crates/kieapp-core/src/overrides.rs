//! オペレーターレベルのイメージ上書き
//!
//! `RELATED_IMAGE_<COMPONENT>_IMAGE_<version>` 形式の環境変数で、
//! 既定のイメージ参照を事前取得済みのイメージに置き換える。

use crate::constants::RELATED_IMAGE_PREFIX;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOverrides {
    values: HashMap<String, String>,
}

impl ImageOverrides {
    /// 上書きなし
    pub fn none() -> Self {
        Self::default()
    }

    /// プロセス環境変数から収集
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// 変数の列から `RELATED_IMAGE_` で始まるものだけを取り込む
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .filter(|(key, _)| key.starts_with(RELATED_IMAGE_PREFIX))
            .collect();
        Self { values }
    }

    /// `prefix + version` の上書きを取得
    pub fn lookup(&self, prefix: &str, version: &str) -> Option<&str> {
        self.values
            .get(&format!("{}{}", prefix, version))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
