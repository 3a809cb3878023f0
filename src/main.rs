//! Knowledge Curator binary entrypoint.
//!
//! `knowledge-curator`            scheduled digest over the configured channels
//! `knowledge-curator <VIDEO>`    notes for one video, mailed on demand

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use knowledge_curator::bootstrap::build_curator;
use knowledge_curator::config::curator::load_config;
use knowledge_curator::metrics::{Metrics, ENV_METRICS_FILE};
use knowledge_curator::{RunMode, RunOutcome, DEFAULT_LOG_FILTER};

#[derive(Debug, Parser)]
#[command(name = "knowledge-curator", version, about)]
struct Cli {
    /// Video link or id for an on-demand run; omit for the scheduled digest.
    item: Option<String>,

    /// Config file (TOML or JSON). Defaults to $CURATOR_CONFIG_PATH, then config/curator.{toml,json}.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

/// Compact logs by default; CURATOR_LOG_JSON=1 switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("CURATOR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    info!("Knowledge Curator agent is waking up");

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = %e, "metrics recorder unavailable");
            None
        }
    };

    let cfg = load_config(cli.config.as_deref())?;
    let curator = build_curator(&cfg)?;

    let mode = match cli.item {
        Some(item) => RunMode::OnDemand(item),
        None => RunMode::Scheduled,
    };

    let report = curator.run(mode).await?;
    match &report.outcome {
        RunOutcome::NothingToSend => info!("no new relevant videos; going back to sleep"),
        RunOutcome::Delivered => info!(
            items = report.results.len(),
            placeholders = report.placeholders(),
            "digest delivered"
        ),
        RunOutcome::DeliveryFailed(e) => {
            error!(error = %e, "digest could not be delivered");
            warn!(items = report.results.len(), "run finished without delivery");
        }
    }

    if let (Some(m), Ok(path)) = (&metrics, std::env::var(ENV_METRICS_FILE)) {
        if let Err(e) = m.write_snapshot(Path::new(&path)) {
            warn!(error = %e, "metrics snapshot not written");
        }
    }

    info!(state = ?report.state(), "agent's work is done");
    Ok(())
}
