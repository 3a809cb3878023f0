// src/ingest/types.rs
use anyhow::Result;

use crate::model::{CandidateItem, Source};

/// Reads one source's upstream feed.
///
/// Implementations may fail; `ingest::fetch_recent` turns any error into an
/// empty batch so discovery never aborts on a bad feed.
#[async_trait::async_trait]
pub trait FeedReader: Send + Sync {
    async fn fetch_feed(&self, source: &Source) -> Result<Vec<CandidateItem>>;
    fn name(&self) -> &'static str;
}
