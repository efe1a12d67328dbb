//! rowsync-replay: run a scripted query stream through a result view and
//! print the resulting rows.

mod error;
mod render;
mod runner;
mod script;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use rowsync_core::{ConfigError, ViewConfig};

use error::ReplayError;
use script::Script;

#[derive(Parser, Debug)]
#[command(
    name = "rowsync-replay",
    version,
    about = "Replay a scripted query stream through a rowsync result view"
)]
struct Args {
    /// JSON script of query events.
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// View config file; overrides the script's inline config.
    #[arg(short, long, value_name = "FILE", env = "ROWSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

// =============================================================================
// Config Resolution
// =============================================================================

/// Explicit file, then the script's inline config, then the user config.
fn resolve_config(args: &Args, script: &Script) -> Result<ViewConfig, ReplayError> {
    if let Some(path) = &args.config {
        tracing::info!("Loading config from {}", path.display());
        return Ok(ViewConfig::load_from(path)?);
    }
    if let Some(config) = &script.config {
        config.validate()?;
        return Ok(config.clone());
    }
    match ViewConfig::load() {
        Ok(config) => Ok(config),
        Err(ConfigError::NoConfigDir) => {
            tracing::warn!("No config directory; using defaults");
            Ok(ViewConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

async fn replay(args: Args) -> Result<String, ReplayError> {
    let script = Script::load(&args.script)?;
    let config = resolve_config(&args, &script)?;
    tracing::info!(
        "Replaying {} steps from {} (max_results {})",
        script.steps.len(),
        args.script.display(),
        config.max_results
    );

    let outcome = runner::run(&script, config).await?;
    match args.format {
        Format::Text => Ok(render::render_text(&outcome)),
        Format::Json => render::render_json(&outcome),
    }
}

// =============================================================================
// Entry Point
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(replay(args)) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Replay failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
