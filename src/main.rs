// cachebench - prompt-cache benchmark harness for Anthropic-style Messages APIs

use anyhow::Result;
use cachebench::analysis;
use cachebench::cli::{Args, Command};
use cachebench::config::AppConfig;
use cachebench::runner;
use cachebench::utils::logging;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Phase 1: Parse CLI arguments
    let args = Args::parse();

    // Phase 2: Load configuration and apply flag overrides
    let mut config = AppConfig::load()?;
    args.command.apply_overrides(&mut config);

    // Phase 3: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting cachebench v{}", env!("CARGO_PKG_VERSION"));

    // Phase 4: Dispatch
    match &args.command {
        Command::Run { .. } => {
            let result_dir = runner::run(&config).await?;
            info!("Results written to {}", result_dir.display());
        }
        Command::Analyze {
            baseline,
            dirs,
            summary,
        } => {
            analysis::run(baseline, dirs, summary.as_deref())?;
            if let Some(path) = summary {
                info!("Summary written to {}", path.display());
            }
        }
    }

    Ok(())
}
