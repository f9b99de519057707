use crate::OutputFormat;
use anyhow::Context;
use kieapp_config::{CatalogueSource, DEFAULT_CATALOGUE_DIR, OperatorSettings};
use kieapp_core::{
    BundleCatalogue, ConfigMapCatalogue, InMemoryConfigMapStore, KieApp, KieError,
    TemplateCatalogue, config_maps_from_bundle,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// 使用するカタログのディレクトリ（コマンドライン指定を優先）
pub fn catalogue_dir(cli: Option<&Path>, settings: &OperatorSettings) -> PathBuf {
    if let Some(dir) = cli {
        return dir.to_path_buf();
    }
    settings
        .catalogue_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOGUE_DIR))
}

/// カタログを開く
///
/// 外部ストアが選ばれた場合は、同梱バンドルから作った ConfigMap をストアとして使う。
pub fn open_catalogue(
    cli: Option<&Path>,
    settings: &OperatorSettings,
) -> anyhow::Result<Box<dyn TemplateCatalogue>> {
    let dir = catalogue_dir(cli, settings);
    let bundle = BundleCatalogue::from_dir(&dir)
        .with_context(|| format!("カタログの読み込みに失敗しました: {}", dir.display()))?;

    if cli.is_some() {
        return Ok(Box::new(bundle));
    }
    match CatalogueSource::select(settings) {
        CatalogueSource::Embedded { .. } => Ok(Box::new(bundle)),
        CatalogueSource::ConfigMaps {
            namespace,
            operator_name,
        } => {
            info!(%namespace, operator = %operator_name, "Using config map catalogue");
            let store = InMemoryConfigMapStore::new(config_maps_from_bundle(&bundle, &namespace));
            Ok(Box::new(ConfigMapCatalogue::new(store, namespace)))
        }
    }
}

/// リソースファイルを読み込む（拡張子 .json なら JSON）
pub fn load_app(path: &Path) -> anyhow::Result<KieApp> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("ファイルを読み込めません: {}", path.display()))?;
    let app = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&content)
            .with_context(|| format!("JSON のパースに失敗しました: {}", path.display()))?
    } else {
        KieApp::from_yaml(&content)
            .with_context(|| format!("YAML のパースに失敗しました: {}", path.display()))?
    };
    Ok(app)
}

pub fn to_string(value: &impl Serialize, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
    })
}

pub fn print(value: &impl Serialize, format: OutputFormat) -> anyhow::Result<()> {
    print!("{}", to_string(value, format)?);
    Ok(())
}

/// 再実行で解消し得るエラーか
pub fn is_retryable(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<KieError>()
        .is_some_and(KieError::is_retryable)
}
