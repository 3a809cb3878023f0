// src/bootstrap.rs
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analyze::ai_adapter::build_client_from_config;
use crate::config::CuratorConfig;
use crate::ingest::providers::youtube_rss::YoutubeRssProvider;
use crate::notify::EmailSender;
use crate::pipeline::{Curator, PipelineDeps, RunSettings};
use crate::transcript::youtube::YoutubeTranscriptFetcher;

/// Build the production adapters for `cfg` and wire them into a `Curator`.
pub fn build_curator(cfg: &CuratorConfig) -> anyhow::Result<Curator> {
    let feed = YoutubeRssProvider::youtube()?;
    let fetcher = YoutubeTranscriptFetcher::youtube(cfg.transcript.languages.clone())
        .context("building transcript fetcher")?;
    let summarizer = build_client_from_config(&cfg.summarizer).context("building summarizer")?;
    let notifier = EmailSender::from_env(&cfg.smtp);

    // Safe diagnostics only: names, counts, presence flags.
    info!(
        provider = summarizer.provider_name(),
        channels = cfg.channels.len(),
        keywords = cfg.keywords.len(),
        concurrency = cfg.pipeline.concurrency,
        window_h = cfg.pipeline.recency_window_hours,
        "curator configured"
    );
    if !notifier.has_credentials() {
        warn!("SENDER_EMAIL / SENDER_APP_PASSWORD not set; delivery will fail");
    }

    let deps = PipelineDeps {
        feed: Arc::new(feed),
        fetcher: Arc::new(fetcher),
        summarizer,
        notifier: Arc::new(notifier),
    };
    Ok(Curator::new(deps, RunSettings::from(cfg)))
}
