//! テンプレートカタログ
//!
//! バージョンごとのフラグメントを `<version>/<key>` で取得する。
//! 同梱バンドルと外部キー/バリューストア（ConfigMap）の 2 種類のバックエンドを持つ。

use crate::constants::{API_GROUP, CONFIG_MAP_PREFIX, OPERATOR_VERSION};
use crate::error::{KieError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// ConfigMap に元のディレクトリを記録するアノテーション
const CATALOGUE_DIR_ANNOTATION: &str = "app.kiegroup.org/catalogue-dir";

/// フラグメントの取得元
pub trait TemplateCatalogue {
    /// `version` の `key`（例: `envs/rhpam-trial.yaml`）の本文を取得
    fn get(&self, version: &str, key: &str) -> Result<String>;

    /// `version` に含まれる全キー（ソート済み）
    fn keys(&self, version: &str) -> Result<Vec<String>>;
}

/// 同梱バンドル
#[derive(Debug, Clone, Default)]
pub struct BundleCatalogue {
    versions: BTreeMap<String, BTreeMap<String, String>>,
}

impl BundleCatalogue {
    pub fn from_entries<V, K, T>(entries: impl IntoIterator<Item = (V, K, T)>) -> Self
    where
        V: Into<String>,
        K: Into<String>,
        T: Into<String>,
    {
        let mut catalogue = Self::default();
        for (version, key, text) in entries {
            catalogue.insert(version, key, text);
        }
        catalogue
    }

    /// `<root>/<version>/**/*.yaml` を読み込む
    pub fn from_dir(root: &Path) -> Result<Self> {
        let pattern = root.join("*").join("**").join("*.yaml");
        let pattern = pattern.to_string_lossy();
        let paths = glob::glob(&pattern).map_err(|e| KieError::IoError {
            path: root.to_path_buf(),
            message: format!("検索パターンが不正です: {}", e),
        })?;

        let mut catalogue = Self::default();
        for entry in paths {
            let path = entry.map_err(|e| KieError::IoError {
                path: e.path().to_path_buf(),
                message: e.to_string(),
            })?;
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let mut components = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned());
            let Some(version) = components.next() else {
                continue;
            };
            let key = components.collect::<Vec<_>>().join("/");
            let text = std::fs::read_to_string(&path).map_err(|e| KieError::IoError {
                path: path.clone(),
                message: e.to_string(),
            })?;
            catalogue.insert(version, key, text);
        }

        if catalogue.versions.is_empty() {
            warn!(root = %root.display(), "No catalogue fragments found");
        }
        debug!(
            root = %root.display(),
            versions = catalogue.versions.len(),
            "Loaded template bundle"
        );
        Ok(catalogue)
    }

    pub fn insert(&mut self, version: impl Into<String>, key: impl Into<String>, text: impl Into<String>) {
        self.versions
            .entry(version.into())
            .or_default()
            .insert(key.into(), text.into());
    }

    /// 含まれるバージョン（昇順）
    pub fn versions(&self) -> Vec<&str> {
        self.versions.keys().map(String::as_str).collect()
    }

    fn version(&self, version: &str) -> Result<&BTreeMap<String, String>> {
        self.versions
            .get(version)
            .ok_or_else(|| KieError::VersionNotAvailable(version.to_string()))
    }
}

impl TemplateCatalogue for BundleCatalogue {
    fn get(&self, version: &str, key: &str) -> Result<String> {
        self.version(version)?
            .get(key)
            .cloned()
            .ok_or_else(|| KieError::FragmentNotFound {
                version: version.to_string(),
                key: key.to_string(),
            })
    }

    fn keys(&self, version: &str) -> Result<Vec<String>> {
        Ok(self.version(version)?.keys().cloned().collect())
    }
}

/// キー/バリューストアのエントリ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigMap {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

/// 外部キー/バリューストア
pub trait ConfigMapStore {
    fn get_config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap>;

    fn list_config_maps(&self, namespace: &str) -> Vec<ConfigMap>;
}

/// メモリ上のストア（テストとローカル実行用）
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigMapStore {
    maps: HashMap<(String, String), ConfigMap>,
}

impl InMemoryConfigMapStore {
    pub fn new(maps: impl IntoIterator<Item = ConfigMap>) -> Self {
        let mut store = Self::default();
        for map in maps {
            store.insert(map);
        }
        store
    }

    pub fn insert(&mut self, map: ConfigMap) {
        self.maps
            .insert((map.namespace.clone(), map.name.clone()), map);
    }
}

impl ConfigMapStore for InMemoryConfigMapStore {
    fn get_config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.maps
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    fn list_config_maps(&self, namespace: &str) -> Vec<ConfigMap> {
        let mut maps: Vec<_> = self
            .maps
            .values()
            .filter(|map| map.namespace == namespace)
            .cloned()
            .collect();
        maps.sort_by(|a, b| a.name.cmp(&b.name));
        maps
    }
}

/// `<version>/<dir>/<file>` から (ConfigMap 名, フィールドキー) を導出
///
/// ディレクトリ要素は `-` で連結し、最後の要素をフィールドキーにする。
pub fn config_map_name(path: &str) -> (String, String) {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let field = segments.pop().unwrap_or_default().to_string();
    let name = std::iter::once(CONFIG_MAP_PREFIX)
        .chain(segments)
        .collect::<Vec<_>>()
        .join("-");
    (name, field)
}

/// 外部ストア上のカタログ
///
/// 見つからない場合はストアの収束待ちとして再試行可能なエラーを返す。
pub struct ConfigMapCatalogue<S> {
    store: S,
    namespace: String,
}

impl<S: ConfigMapStore> ConfigMapCatalogue<S> {
    pub fn new(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    fn not_ready(&self, name: &str) -> KieError {
        KieError::CatalogueNotReady {
            namespace: self.namespace.clone(),
            name: name.to_string(),
        }
    }
}

impl<S: ConfigMapStore> TemplateCatalogue for ConfigMapCatalogue<S> {
    fn get(&self, version: &str, key: &str) -> Result<String> {
        let (name, field) = config_map_name(&format!("{}/{}", version, key));
        let map = self
            .store
            .get_config_map(&self.namespace, &name)
            .ok_or_else(|| self.not_ready(&name))?;
        map.data.get(&field).cloned().ok_or_else(|| {
            debug!(config_map = %name, field, "Field not present yet");
            self.not_ready(&name)
        })
    }

    fn keys(&self, version: &str) -> Result<Vec<String>> {
        let (root, _) = config_map_name(&format!("{}/_", version));
        let mut keys = Vec::new();
        for map in self.store.list_config_maps(&self.namespace) {
            let Some(rest) = map.name.strip_prefix(&root) else {
                continue;
            };
            if !(rest.is_empty() || rest.starts_with('-')) {
                continue;
            }
            let dir = match map.annotations.get(CATALOGUE_DIR_ANNOTATION) {
                Some(dir) => dir.clone(),
                None => rest.trim_start_matches('-').replace('-', "/"),
            };
            for field in map.data.keys() {
                keys.push(if dir.is_empty() {
                    field.clone()
                } else {
                    format!("{}/{}", dir, field)
                });
            }
        }
        if keys.is_empty() {
            return Err(self.not_ready(&root));
        }
        keys.sort();
        Ok(keys)
    }
}

/// 同梱バンドルを外部ストア用の ConfigMap 群に変換
pub fn config_maps_from_bundle(bundle: &BundleCatalogue, namespace: &str) -> Vec<ConfigMap> {
    let mut maps: BTreeMap<String, ConfigMap> = BTreeMap::new();
    for (version, entries) in &bundle.versions {
        for (key, text) in entries {
            let (name, field) = config_map_name(&format!("{}/{}", version, key));
            let dir = key.rsplit_once('/').map(|(dir, _)| dir).unwrap_or_default();
            let map = maps.entry(name.clone()).or_insert_with(|| ConfigMap {
                name,
                namespace: namespace.to_string(),
                annotations: BTreeMap::from([
                    (API_GROUP.to_string(), OPERATOR_VERSION.to_string()),
                    (CATALOGUE_DIR_ANNOTATION.to_string(), dir.to_string()),
                ]),
                data: BTreeMap::new(),
            });
            map.data.insert(field, text.clone());
        }
    }
    maps.into_values().collect()
}
