// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use knowledge_curator::ai_adapter::{Summarizer, SummaryFuture};
use knowledge_curator::error::{FetchError, NotifyError, SummaryError};
use knowledge_curator::ingest::types::FeedReader;
use knowledge_curator::notify::Notifier;
use knowledge_curator::transcript::{ContentFetcher, FetchedContent};
use knowledge_curator::{CandidateItem, Curator, PipelineDeps, RunSettings, Source};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap()
}

pub fn source(id: &str) -> Source {
    Source {
        id: id.to_string(),
        name: format!("Channel {id}"),
    }
}

pub fn item(id: &str, title: &str, hours_ago: i64) -> CandidateItem {
    CandidateItem {
        id: id.to_string(),
        title: title.to_string(),
        link: format!("https://www.youtube.com/watch?v={id}"),
        published_at: now() - chrono::Duration::hours(hours_ago),
    }
}

// ---------------- feed ----------------

/// Per-source canned items; a source listed in `failing` errors out, one
/// listed in `delays` answers late.
#[derive(Default)]
pub struct FakeFeed {
    pub feeds: HashMap<String, Vec<CandidateItem>>,
    pub failing: Vec<String>,
    pub delays: HashMap<String, Duration>,
}

impl FakeFeed {
    pub fn with(mut self, source_id: &str, items: Vec<CandidateItem>) -> Self {
        self.feeds.insert(source_id.to_string(), items);
        self
    }

    pub fn failing(mut self, source_id: &str) -> Self {
        self.failing.push(source_id.to_string());
        self
    }

    pub fn delay(mut self, source_id: &str, d: Duration) -> Self {
        self.delays.insert(source_id.to_string(), d);
        self
    }
}

#[async_trait]
impl FeedReader for FakeFeed {
    async fn fetch_feed(&self, source: &Source) -> anyhow::Result<Vec<CandidateItem>> {
        if let Some(d) = self.delays.get(&source.id) {
            tokio::time::sleep(*d).await;
        }
        if self.failing.contains(&source.id) {
            anyhow::bail!("upstream down for {}", source.id);
        }
        Ok(self.feeds.get(&source.id).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "fake-feed"
    }
}

// ---------------- fetcher ----------------

#[derive(Clone)]
pub enum Canned {
    Text(&'static str),
    Missing,
}

/// Transcript per item id, with optional canonical titles and delays.
#[derive(Default)]
pub struct FakeFetcher {
    pub texts: HashMap<String, Canned>,
    pub titles: HashMap<String, String>,
    pub delays: HashMap<String, Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn text(mut self, id: &str, text: &'static str) -> Self {
        self.texts.insert(id.to_string(), Canned::Text(text));
        self
    }

    pub fn missing(mut self, id: &str) -> Self {
        self.texts.insert(id.to_string(), Canned::Missing);
        self
    }

    pub fn title(mut self, id: &str, title: &str) -> Self {
        self.titles.insert(id.to_string(), title.to_string());
        self
    }

    pub fn delay(mut self, id: &str, d: Duration) -> Self {
        self.delays.insert(id.to_string(), d);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetcher for FakeFetcher {
    async fn fetch(&self, item_id: &str) -> FetchedContent {
        self.calls.lock().unwrap().push(item_id.to_string());
        if let Some(d) = self.delays.get(item_id) {
            tokio::time::sleep(*d).await;
        }
        let title = self.titles.get(item_id).cloned();
        match self.texts.get(item_id) {
            Some(Canned::Text(t)) => FetchedContent::available(*t, title),
            _ => FetchedContent::unavailable(FetchError::NoTranscript(item_id.to_string()), title),
        }
    }

    fn name(&self) -> &'static str {
        "fake-fetcher"
    }
}

// ---------------- summarizer ----------------

/// Echoes a note per title; titles in `fail_for` always error.
#[derive(Default)]
pub struct FakeSummarizer {
    pub fail_for: Vec<String>,
    /// Fail this many calls before succeeding (per summarizer, not per item).
    pub fail_first: AtomicUsize,
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
}

impl FakeSummarizer {
    pub fn failing_for(title: &str) -> Self {
        Self {
            fail_for: vec![title.to_string()],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Summarizer for FakeSummarizer {
    fn summarize<'a>(&'a self, text: &'a str, title: &'a str) -> SummaryFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.fail_for.iter().any(|t| t == title) {
                return Err(SummaryError::Status(500));
            }
            let remaining = self.fail_first.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_first.store(remaining - 1, Ordering::SeqCst);
                return Err(SummaryError::Transport("flaky".into()));
            }
            Ok(format!("### Core Concepts\n* **{title}:** {text}"))
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

// ---------------- notifier ----------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

/// Records every delivery; optionally fails each one.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, subject: &str, body: &str, recipient: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Sent {
            subject: subject.to_string(),
            body: body.to_string(),
            recipient: recipient.to_string(),
        });
        if self.fail {
            return Err(NotifyError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ---------------- wiring ----------------

pub struct Harness {
    pub curator: Curator,
    pub fetcher: Arc<FakeFetcher>,
    pub summarizer: Arc<FakeSummarizer>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(
    feed: FakeFeed,
    fetcher: FakeFetcher,
    summarizer: FakeSummarizer,
    notifier: RecordingNotifier,
    settings: RunSettings,
) -> Harness {
    let fetcher = Arc::new(fetcher);
    let summarizer = Arc::new(summarizer);
    let notifier = Arc::new(notifier);
    let deps = PipelineDeps {
        feed: Arc::new(feed),
        fetcher: fetcher.clone(),
        summarizer: summarizer.clone(),
        notifier: notifier.clone(),
    };
    Harness {
        curator: Curator::new(deps, settings),
        fetcher,
        summarizer,
        notifier,
    }
}

pub fn settings(sources: &[&str], keywords: &[&str]) -> RunSettings {
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
    RunSettings::new(
        "learner@example.com",
        sources.iter().map(|s| source(s)).collect(),
        &keywords,
    )
}
