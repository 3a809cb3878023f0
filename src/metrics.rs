use std::path::Path;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// Env var naming a file that receives the Prometheus text snapshot at the
/// end of a run (node-exporter textfile collector layout).
pub const ENV_METRICS_FILE: &str = "CURATOR_METRICS_FILE";

/// Process-wide Prometheus recorder. One-shot runs have no scrape endpoint,
/// so the snapshot is rendered once and written out.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the recorder. Fails if another recorder is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .with_context(|| format!("writing metrics snapshot to {}", path.display()))
    }
}

/// One-time metric descriptions, so series carry help text in whatever
/// recorder the host installs.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "curator_items_discovered_total",
            "Entries parsed from source feeds."
        );
        describe_counter!(
            "curator_items_relevant_total",
            "Discovered items that matched a keyword."
        );
        describe_counter!(
            "curator_feed_errors_total",
            "Feed reads that failed or could not be parsed."
        );
        describe_counter!(
            "curator_transcript_failures_total",
            "Items whose transcript could not be fetched."
        );
        describe_counter!(
            "curator_enrich_failures_total",
            "Items that ended up with a placeholder."
        );
        describe_counter!("curator_digests_sent_total", "Digests delivered.");
        describe_counter!(
            "curator_delivery_failures_total",
            "Digests that could not be delivered."
        );
        describe_histogram!("curator_feed_parse_ms", "Feed parse time in milliseconds.");
        describe_histogram!("curator_run_ms", "Whole run time in milliseconds.");
    });
}
