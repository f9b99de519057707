use crate::OutputFormat;
use crate::utils;
use anyhow::Context;
use kieapp_core::{OsPasswordGenerator, ResolveOptions, TemplateCatalogue, resolve_kieapp};
use kieapp_core::overrides::ImageOverrides;
use std::path::Path;

/// フラグメントに渡される値を確認する
pub fn handle(
    file: &Path,
    catalogue: &dyn TemplateCatalogue,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let app = utils::load_app(file)?;
    let options = ResolveOptions {
        image_overrides: ImageOverrides::from_env(),
        ..Default::default()
    };
    let resolution = resolve_kieapp(&app, catalogue, &options, &mut OsPasswordGenerator)
        .with_context(|| format!("{} の解決に失敗しました", app.metadata.name))?;
    utils::print(&resolution.context, format)
}
