//! mediadrop command-line uploader entry point.

mod app;
mod config;
mod terminal;

use std::path::PathBuf;

use clap::Parser;
use mediadrop_presenter::Locale;
use tracing_subscriber::EnvFilter;

use crate::app::Output;
use crate::config::UploaderConfig;

/// Upload images and videos straight to storage and print embed snippets.
#[derive(Debug, Parser)]
#[command(name = "mediadrop", version)]
struct Args {
    /// Configuration file (defaults to the platform config path).
    #[arg(long)]
    config: Option<PathBuf>,

    /// UI language for progress and notices (en, ru).
    #[arg(long)]
    locale: Option<Locale>,

    /// Print one JSON outcome per file instead of HTML snippets.
    #[arg(long)]
    json: bool,

    /// Files to upload, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is reserved for snippets.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = UploaderConfig::load(args.config.as_deref())?;
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        files = args.files.len(),
        locale = %config.locale,
        "starting mediadrop"
    );

    let output = if args.json { Output::Json } else { Output::Html };
    let rt = tokio::runtime::Runtime::new()?;
    let outcomes = rt.block_on(app::run(config, args.files, output))?;

    let failed = app::failure_count(&outcomes);
    if failed > 0 {
        anyhow::bail!("{failed} of {} uploads failed", outcomes.len());
    }
    Ok(())
}
