use crate::OutputFormat;
use crate::utils;
use anyhow::Context;
use colored::Colorize;
use kieapp_core::{OsPasswordGenerator, ResolveOptions, TemplateCatalogue, resolve_kieapp};
use kieapp_core::overrides::ImageOverrides;
use std::path::Path;

pub fn handle(
    file: &Path,
    catalogue: &dyn TemplateCatalogue,
    app_out: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let app = utils::load_app(file)?;
    let options = ResolveOptions {
        image_overrides: ImageOverrides::from_env(),
        ..Default::default()
    };
    let resolution = resolve_kieapp(&app, catalogue, &options, &mut OsPasswordGenerator)
        .with_context(|| format!("{} の解決に失敗しました", app.metadata.name))?;

    if let Some(path) = app_out {
        std::fs::write(path, utils::to_string(&resolution.app, format)?)
            .with_context(|| format!("書き込みに失敗しました: {}", path.display()))?;
        eprintln!(
            "  {} {}",
            "更新後のリソース:".dimmed(),
            path.display().to_string().cyan()
        );
    }

    utils::print(&resolution.environment, format)?;

    eprintln!(
        "{} {} を解決しました (version: {}, servers: {}, databases: {})",
        "✓".green().bold(),
        app.metadata.name.cyan(),
        resolution.context.version,
        resolution.environment.servers.len(),
        resolution.environment.databases.len()
    );
    Ok(())
}
