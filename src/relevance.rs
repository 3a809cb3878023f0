// src/relevance.rs
//! Keyword relevance gate: an item passes when any keyword is a
//! case-insensitive substring of its title.

use metrics::counter;

use crate::model::CandidateItem;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    /// Keywords are case-folded; blanks are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First keyword contained in `title`, if any.
    pub fn matched_keyword(&self, title: &str) -> Option<&str> {
        let folded = title.to_lowercase();
        self.keywords
            .iter()
            .find(|k| folded.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn is_relevant(&self, title: &str) -> bool {
        self.matched_keyword(title).is_some()
    }

    /// Keep relevant items, preserving input order.
    pub fn apply(&self, items: Vec<CandidateItem>) -> Vec<CandidateItem> {
        let total = items.len();
        let kept: Vec<CandidateItem> = items
            .into_iter()
            .filter(|it| match self.matched_keyword(&it.title) {
                Some(kw) => {
                    tracing::info!(target: "relevance", title = %it.title, keyword = kw, "match found");
                    true
                }
                None => false,
            })
            .collect();
        counter!("curator_items_relevant_total").increment(kept.len() as u64);
        tracing::debug!(target: "relevance", total, kept = kept.len(), "relevance filter applied");
        kept
    }
}
