//! Content fetcher: transcript text plus an optional canonical title.

pub mod item_ref;
pub mod youtube;

use crate::error::FetchError;

/// Result of one content lookup. `title` is reported even when the text
/// could not be fetched, so callers can still label the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub text: Result<String, FetchError>,
    pub title: Option<String>,
}

impl FetchedContent {
    pub fn available(text: impl Into<String>, title: Option<String>) -> Self {
        Self {
            text: Ok(text.into()),
            title,
        }
    }

    pub fn unavailable(err: FetchError, title: Option<String>) -> Self {
        Self {
            text: Err(err),
            title,
        }
    }
}

#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Never fails as a call; failures live inside `FetchedContent::text`.
    async fn fetch(&self, item_id: &str) -> FetchedContent;
    fn name(&self) -> &'static str;
}
