//! # Pipeline Orchestrator
//! Discovery -> relevance filter -> per-item enrichment -> assembly -> delivery.
//!
//! Per-item failures degrade to placeholders and never abort the batch. Only a
//! malformed on-demand reference fails a run before it starts; every other
//! path ends in `RunState::Done` with a `RunReport`.

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::analyze::Summarizer;
use crate::config::CuratorConfig;
use crate::digest;
use crate::error::{ItemRefError, NotifyError};
use crate::ingest::{self, types::FeedReader};
use crate::model::{CandidateItem, DigestDocument, EnrichedItem, Source, SummaryResult, TitlePreference};
use crate::notify::Notifier;
use crate::relevance::RelevanceFilter;
use crate::transcript::{item_ref, ContentFetcher};

pub const TRANSCRIPT_UNAVAILABLE: &str = "Could not process this video: Transcript not available.";
pub const SUMMARY_FAILED: &str = "Could not generate notes: summarization failed.";
pub const PROCESSING_TIMED_OUT: &str = "Could not process this video: processing timed out.";
pub const PROCESSING_FAILED: &str = "Could not process this video: internal error.";

pub fn on_demand_fallback_title(item_id: &str) -> String {
    format!("On-Demand Analysis for video ID: {item_id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Scheduled,
    /// Raw, unparsed item reference as supplied by the caller.
    OnDemand(String),
}

impl RunMode {
    /// Scheduled blocks keep the title the keyword matched; on-demand blocks
    /// use the canonical one.
    pub fn title_preference(&self) -> TitlePreference {
        match self {
            RunMode::Scheduled => TitlePreference::Feed,
            RunMode::OnDemand(_) => TitlePreference::Resolved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    Filtering,
    Enriching,
    Assembling,
    Delivering,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing relevant; no digest assembled, no delivery attempted.
    NothingToSend,
    Delivered,
    DeliveryFailed(NotifyError),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: RunMode,
    /// Every state visited, `Idle` first and `Done` last.
    pub trace: Vec<RunState>,
    pub results: Vec<SummaryResult>,
    pub digest: Option<DigestDocument>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn state(&self) -> RunState {
        self.trace.last().copied().unwrap_or(RunState::Idle)
    }

    pub fn placeholders(&self) -> usize {
        self.results.iter().filter(|r| r.is_placeholder()).count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid on-demand item reference: {0}")]
    InvalidItemRef(#[from] ItemRefError),
}

/// External collaborators, injected so tests can swap in fakes.
#[derive(Clone)]
pub struct PipelineDeps {
    pub feed: Arc<dyn FeedReader>,
    pub fetcher: Arc<dyn ContentFetcher>,
    pub summarizer: Arc<dyn Summarizer>,
    pub notifier: Arc<dyn Notifier>,
}

/// Plain run inputs, read once at start.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub recipient: String,
    pub sources: Vec<Source>,
    pub filter: RelevanceFilter,
    pub recency_window: chrono::Duration,
    pub concurrency: usize,
    pub run_timeout: Option<Duration>,
    pub summary_attempts: u32,
}

impl RunSettings {
    pub fn new(recipient: impl Into<String>, sources: Vec<Source>, keywords: &[String]) -> Self {
        Self {
            recipient: recipient.into(),
            sources,
            filter: RelevanceFilter::new(keywords),
            recency_window: chrono::Duration::hours(24),
            concurrency: 3,
            run_timeout: None,
            summary_attempts: 1,
        }
    }
}

impl From<&CuratorConfig> for RunSettings {
    fn from(cfg: &CuratorConfig) -> Self {
        Self {
            recipient: cfg.recipient_email.clone(),
            sources: cfg.channels.clone(),
            filter: RelevanceFilter::new(&cfg.keywords),
            recency_window: cfg.pipeline.recency_window(),
            concurrency: cfg.pipeline.concurrency.max(1),
            run_timeout: cfg.pipeline.run_timeout(),
            summary_attempts: cfg.pipeline.summary_attempts.max(1),
        }
    }
}

struct Tracker {
    trace: Vec<RunState>,
}

impl Tracker {
    fn new() -> Self {
        Self {
            trace: vec![RunState::Idle],
        }
    }

    fn enter(&mut self, next: RunState) {
        let from = self.trace.last().copied().unwrap_or(RunState::Idle);
        debug!(target: "pipeline", ?from, to = ?next, "state transition");
        self.trace.push(next);
    }
}

pub struct Curator {
    deps: PipelineDeps,
    settings: RunSettings,
}

impl Curator {
    pub fn new(deps: PipelineDeps, settings: RunSettings) -> Self {
        Self { deps, settings }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Whole-run deadline, taken before the first stage.
    fn deadline(&self) -> Option<Instant> {
        self.settings.run_timeout.map(|t| Instant::now() + t)
    }

    /// Entry point for both modes.
    pub async fn run(&self, mode: RunMode) -> Result<RunReport, RunError> {
        match mode {
            RunMode::Scheduled => Ok(self.run_scheduled_at(Utc::now()).await),
            RunMode::OnDemand(reference) => self.run_on_demand(&reference).await,
        }
    }

    pub async fn run_scheduled(&self) -> RunReport {
        self.run_scheduled_at(Utc::now()).await
    }

    /// Scheduled batch with an explicit clock, for deterministic windows and subjects.
    pub async fn run_scheduled_at(&self, now: DateTime<Utc>) -> RunReport {
        crate::metrics::ensure_metrics_described();
        let t0 = std::time::Instant::now();
        let deadline = self.deadline();
        let mut tracker = Tracker::new();
        info!(target: "pipeline", sources = self.settings.sources.len(), "scheduled run started");

        tracker.enter(RunState::Discovering);
        let discovered = ingest::discover(
            Arc::clone(&self.deps.feed),
            &self.settings.sources,
            self.settings.recency_window,
            now,
            deadline,
        )
        .await;

        tracker.enter(RunState::Filtering);
        let relevant = self.settings.filter.apply(discovered);

        let subject = digest::scheduled_subject(now.date_naive());
        let report = self
            .finish(RunMode::Scheduled, tracker, relevant, subject, deadline)
            .await;
        histogram!("curator_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        report
    }

    /// Single externally supplied item; no discovery, no filter.
    pub async fn run_on_demand(&self, reference: &str) -> Result<RunReport, RunError> {
        crate::metrics::ensure_metrics_described();
        let item_id = item_ref::parse_item_ref(reference).map_err(|e| {
            error!(target: "pipeline", reference, error = %e, "on-demand reference rejected");
            e
        })?;
        let t0 = std::time::Instant::now();
        let deadline = self.deadline();
        info!(target: "pipeline", %item_id, "on-demand run started");

        let reference = reference.trim();
        let link = if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            item_ref::canonical_link(&item_id)
        };
        let item = CandidateItem {
            title: on_demand_fallback_title(&item_id),
            id: item_id,
            link,
            published_at: Utc::now(),
        };

        let mode = RunMode::OnDemand(reference.to_string());
        let fallback_subject = digest::on_demand_subject(&item.title);
        let report = self
            .finish(mode, Tracker::new(), vec![item], fallback_subject, deadline)
            .await;
        histogram!("curator_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(report)
    }

    /// Shared tail: enrich, assemble, deliver. On demand, the subject is
    /// re-derived from the single result's final title.
    async fn finish(
        &self,
        mode: RunMode,
        mut tracker: Tracker,
        items: Vec<CandidateItem>,
        subject: String,
        deadline: Option<Instant>,
    ) -> RunReport {
        if items.is_empty() {
            info!(target: "pipeline", "no relevant items; nothing to send");
            tracker.enter(RunState::Done);
            return RunReport {
                mode,
                trace: tracker.trace,
                results: Vec::new(),
                digest: None,
                outcome: RunOutcome::NothingToSend,
            };
        }

        info!(target: "pipeline", items = items.len(), "enriching relevant items");
        tracker.enter(RunState::Enriching);
        let results = self.enrich_all(items, mode.title_preference(), deadline).await;

        tracker.enter(RunState::Assembling);
        let subject = match (&mode, results.first()) {
            (RunMode::OnDemand(_), Some(first)) => digest::on_demand_subject(&first.title),
            _ => subject,
        };
        let doc = digest::assemble(subject, &results);

        tracker.enter(RunState::Delivering);
        let outcome = match self
            .deps
            .notifier
            .deliver(&doc.subject, &doc.body, &self.settings.recipient)
            .await
        {
            Ok(()) => {
                counter!("curator_digests_sent_total").increment(1);
                info!(
                    target: "pipeline",
                    notifier = self.deps.notifier.name(),
                    items = results.len(),
                    "digest delivered"
                );
                RunOutcome::Delivered
            }
            Err(e) => {
                counter!("curator_delivery_failures_total").increment(1);
                error!(
                    target: "pipeline",
                    notifier = self.deps.notifier.name(),
                    error = %e,
                    "digest delivery failed"
                );
                RunOutcome::DeliveryFailed(e)
            }
        };

        tracker.enter(RunState::Done);
        RunReport {
            mode,
            trace: tracker.trace,
            results,
            digest: Some(doc),
            outcome,
        }
    }

    /// Bounded-concurrency enrichment. Results land in slots indexed by input
    /// position, so output order never depends on completion order.
    async fn enrich_all(
        &self,
        items: Vec<CandidateItem>,
        titles: TitlePreference,
        deadline: Option<Instant>,
    ) -> Vec<SummaryResult> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let attempts = self.settings.summary_attempts.max(1);

        let mut pending: Vec<(CandidateItem, JoinHandle<SummaryResult>)> = Vec::with_capacity(items.len());
        for item in items {
            let sem = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&self.deps.fetcher);
            let summarizer = Arc::clone(&self.deps.summarizer);
            let task_item = item.clone();
            let handle = tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                enrich_one(fetcher.as_ref(), summarizer.as_ref(), task_item, attempts, titles).await
            });
            pending.push((item, handle));
        }

        let mut slots: Vec<Option<SummaryResult>> = vec![None; pending.len()];
        for (idx, (item, mut handle)) in pending.into_iter().enumerate() {
            let joined = match deadline {
                Some(d) => match tokio::time::timeout_at(d, &mut handle).await {
                    Ok(j) => j.map_err(|e| e.to_string()),
                    Err(_) => {
                        handle.abort();
                        warn!(target: "pipeline", item = %item.id, "run budget exhausted; item cancelled");
                        counter!("curator_enrich_failures_total").increment(1);
                        slots[idx] = Some(SummaryResult::placeholder(
                            item.title,
                            item.link,
                            PROCESSING_TIMED_OUT,
                        ));
                        continue;
                    }
                },
                None => handle.await.map_err(|e| e.to_string()),
            };
            slots[idx] = Some(match joined {
                Ok(result) => result,
                Err(e) => {
                    error!(target: "pipeline", item = %item.id, error = %e, "enrichment task failed");
                    counter!("curator_enrich_failures_total").increment(1);
                    SummaryResult::placeholder(item.title, item.link, PROCESSING_FAILED)
                }
            });
        }

        slots.into_iter().flatten().collect()
    }
}

/// Fetch content, then summarize. Either failure yields a placeholder.
pub async fn enrich_one(
    fetcher: &dyn ContentFetcher,
    summarizer: &dyn Summarizer,
    item: CandidateItem,
    attempts: u32,
    titles: TitlePreference,
) -> SummaryResult {
    let fetched = fetcher.fetch(&item.id).await;
    let text = match fetched.text {
        Ok(t) => Some(t),
        Err(e) => {
            debug!(target: "pipeline", item = %item.id, error = %e, "content unavailable");
            None
        }
    };
    let enriched = EnrichedItem {
        item,
        text,
        resolved_title: fetched.title,
    };
    let title = enriched.display_title(titles).to_string();
    let link = enriched.item.link.clone();

    let Some(text) = enriched.text.as_deref() else {
        warn!(target: "pipeline", %title, "transcript not available; placeholder used");
        counter!("curator_enrich_failures_total").increment(1);
        return SummaryResult::placeholder(title, link, TRANSCRIPT_UNAVAILABLE);
    };

    let mut last_err = None;
    for attempt in 1..=attempts.max(1) {
        match summarizer.summarize(text, &title).await {
            Ok(notes) => {
                info!(target: "pipeline", %title, attempt, "notes generated");
                return SummaryResult::notes(title, link, notes);
            }
            Err(e) => {
                warn!(
                    target: "pipeline",
                    %title,
                    attempt,
                    provider = summarizer.provider_name(),
                    error = %e,
                    "summarization failed"
                );
                last_err = Some(e);
            }
        }
    }
    debug!(target: "pipeline", error = ?last_err, "giving up on summary");
    counter!("curator_enrich_failures_total").increment(1);
    SummaryResult::placeholder(title, link, SUMMARY_FAILED)
}
