mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kie")]
#[command(about = "KIE アプリケーションの設定を解決する", long_about = None)]
struct Cli {
    /// カタログのディレクトリ（省略時は設定ファイルの値、なければ ./config）
    #[arg(long, global = true, env = "KIEAPP_CATALOGUE_DIR")]
    catalogue: Option<PathBuf>,

    /// ログを詳細にする（-v: debug, -vv: trace）
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// リソースを解決して環境を出力
    Resolve {
        /// KieApp リソースのファイル（YAML / JSON）
        file: PathBuf,
        /// 更新後のリソース（Status を含む）の書き出し先
        #[arg(long)]
        app_out: Option<PathBuf>,
        /// 出力形式
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },
    /// レンダーコンテキストを出力
    Context {
        /// KieApp リソースのファイル（YAML / JSON）
        file: PathBuf,
        /// 出力形式
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// カタログを ConfigMap として出力
    Configmaps {
        /// ConfigMap の名前空間
        #[arg(short, long, default_value = "default")]
        namespace: String,
        /// 出力形式
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if utils::is_retryable(&e) {
            eprintln!(
                "{}",
                "ヒント: カタログの ConfigMap が揃うまで待ってから再実行してください".yellow()
            );
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("kie {}", env!("CARGO_PKG_VERSION"));
        println!(
            "product version {} (supported: {})",
            kieapp_core::constants::CURRENT_VERSION,
            kieapp_core::constants::SUPPORTED_VERSIONS.join(", ")
        );
        return Ok(());
    }

    let settings = kieapp_config::load_settings()?;

    match cli.command {
        Commands::Resolve {
            file,
            app_out,
            format,
        } => {
            let catalogue = utils::open_catalogue(cli.catalogue.as_deref(), &settings)?;
            commands::resolve::handle(&file, catalogue.as_ref(), app_out.as_deref(), format)?;
        }
        Commands::Context { file, format } => {
            let catalogue = utils::open_catalogue(cli.catalogue.as_deref(), &settings)?;
            commands::context::handle(&file, catalogue.as_ref(), format)?;
        }
        Commands::Configmaps { namespace, format } => {
            let dir = utils::catalogue_dir(cli.catalogue.as_deref(), &settings);
            commands::configmaps::handle(&dir, &namespace, format)?;
        }
        Commands::Version => unreachable!("Version is handled before settings loading"),
    }

    Ok(())
}
