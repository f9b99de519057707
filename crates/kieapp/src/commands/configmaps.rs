use crate::OutputFormat;
use crate::utils;
use anyhow::Context;
use colored::Colorize;
use kieapp_core::{BundleCatalogue, config_maps_from_bundle};
use std::path::Path;

pub fn handle(dir: &Path, namespace: &str, format: OutputFormat) -> anyhow::Result<()> {
    let bundle = BundleCatalogue::from_dir(dir)
        .with_context(|| format!("カタログの読み込みに失敗しました: {}", dir.display()))?;
    if bundle.versions().is_empty() {
        anyhow::bail!("カタログにフラグメントがありません: {}", dir.display());
    }

    let maps = config_maps_from_bundle(&bundle, namespace);
    utils::print(&maps, format)?;

    eprintln!(
        "{} {} 個の ConfigMap (versions: {})",
        "✓".green().bold(),
        maps.len(),
        bundle.versions().join(", ").cyan()
    );
    Ok(())
}
