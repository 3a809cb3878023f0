// src/ingest/mod.rs
pub mod providers;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::counter;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::ingest::types::FeedReader;
use crate::model::{CandidateItem, Source};

const MAX_TITLE_CHARS: usize = 300;

/// Normalize a feed title: decode entities, strip tags, collapse whitespace.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TITLE_CHARS {
        out = out.chars().take(MAX_TITLE_CHARS).collect();
    }
    out
}

/// True when `published_at` falls inside `(now - window, now + window]`.
/// Small future skews from the upstream clock are tolerated.
pub fn is_recent(published_at: DateTime<Utc>, now: DateTime<Utc>, window: chrono::Duration) -> bool {
    published_at > now - window && published_at <= now + window
}

/// One source's items inside the recency window. Upstream errors and
/// malformed feeds come back as an empty batch.
pub async fn fetch_recent(
    reader: &dyn FeedReader,
    source: &Source,
    window: chrono::Duration,
    now: DateTime<Utc>,
) -> Vec<CandidateItem> {
    match reader.fetch_feed(source).await {
        Ok(items) => items
            .into_iter()
            .filter(|it| is_recent(it.published_at, now, window))
            .collect(),
        Err(e) => {
            tracing::warn!(
                target: "ingest",
                error = ?e,
                provider = reader.name(),
                source = %source.name,
                "feed unavailable, treating as empty"
            );
            counter!("curator_feed_errors_total").increment(1);
            Vec::new()
        }
    }
}

/// Fan out one read per source, fan in by source order then feed order.
/// An item id seen under an earlier source is not repeated. Sources still
/// in flight at `deadline` are cancelled and count as empty.
pub async fn discover(
    reader: Arc<dyn FeedReader>,
    sources: &[Source],
    window: chrono::Duration,
    now: DateTime<Utc>,
    deadline: Option<Instant>,
) -> Vec<CandidateItem> {
    let mut set = JoinSet::new();
    for (idx, source) in sources.iter().cloned().enumerate() {
        let reader = Arc::clone(&reader);
        set.spawn(async move {
            let items = fetch_recent(reader.as_ref(), &source, window, now).await;
            tracing::debug!(target: "ingest", source = %source.name, found = items.len(), "source checked");
            (idx, items)
        });
    }

    let mut slots: Vec<Vec<CandidateItem>> = vec![Vec::new(); sources.len()];
    loop {
        let next = match deadline {
            Some(d) => match tokio::time::timeout_at(d, set.join_next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::warn!(target: "ingest", pending = set.len(), "run budget exhausted during discovery");
                    counter!("curator_feed_errors_total").increment(set.len() as u64);
                    set.abort_all();
                    break;
                }
            },
            None => set.join_next().await,
        };
        match next {
            Some(Ok((idx, items))) => slots[idx] = items,
            Some(Err(e)) => {
                tracing::warn!(target: "ingest", error = ?e, "feed task failed");
                counter!("curator_feed_errors_total").increment(1);
            }
            None => break,
        }
    }

    let mut seen = HashSet::new();
    slots
        .into_iter()
        .flatten()
        .filter(|it| seen.insert(it.id.clone()))
        .collect()
}
