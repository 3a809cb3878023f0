//! Domain records passed between pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One subscribed content channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub name: String,
}

/// An item discovered in a source feed. Read-only after discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateItem {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

/// A candidate plus whatever the content fetcher managed to resolve.
/// `text == None` means the transcript was unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedItem {
    pub item: CandidateItem,
    pub text: Option<String>,
    pub resolved_title: Option<String>,
}

/// Which title a summary block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitlePreference {
    /// The title the relevance filter matched; resolved title only if it is blank.
    Feed,
    /// The fetcher's canonical title; the candidate's own title otherwise.
    Resolved,
}

fn non_blank(t: &str) -> Option<&str> {
    Some(t).filter(|t| !t.trim().is_empty())
}

impl EnrichedItem {
    pub fn display_title(&self, pref: TitlePreference) -> &str {
        let feed = non_blank(&self.item.title);
        let resolved = self.resolved_title.as_deref().and_then(non_blank);
        let picked = match pref {
            TitlePreference::Feed => feed.or(resolved),
            TitlePreference::Resolved => resolved.or(feed),
        };
        picked.unwrap_or(&self.item.title)
    }
}

/// Either generated notes or a placeholder explaining why there are none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum SummaryBody {
    Notes(String),
    Placeholder(String),
}

/// The unit the digest assembler consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub title: String,
    pub link: String,
    pub body: SummaryBody,
}

impl SummaryResult {
    pub fn notes(title: impl Into<String>, link: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            body: SummaryBody::Notes(notes.into()),
        }
    }

    pub fn placeholder(
        title: impl Into<String>,
        link: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            body: SummaryBody::Placeholder(message.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, SummaryBody::Placeholder(_))
    }
}

/// Rendered digest, immutable once assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestDocument {
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> CandidateItem {
        CandidateItem {
            id: "abc".into(),
            title: title.into(),
            link: "https://example.com/abc".into(),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn resolved_preference_takes_canonical_non_blank() {
        let mut e = EnrichedItem {
            item: item("Feed Title"),
            text: None,
            resolved_title: Some("Canonical".into()),
        };
        assert_eq!(e.display_title(TitlePreference::Resolved), "Canonical");

        e.resolved_title = Some("   ".into());
        assert_eq!(e.display_title(TitlePreference::Resolved), "Feed Title");

        e.resolved_title = None;
        assert_eq!(e.display_title(TitlePreference::Resolved), "Feed Title");
    }

    #[test]
    fn feed_preference_keeps_matched_title() {
        let mut e = EnrichedItem {
            item: item("Intro to Testing"),
            text: None,
            resolved_title: Some("Some Other Name".into()),
        };
        assert_eq!(e.display_title(TitlePreference::Feed), "Intro to Testing");

        e.item.title = "  ".into();
        assert_eq!(e.display_title(TitlePreference::Feed), "Some Other Name");

        e.resolved_title = None;
        assert_eq!(e.display_title(TitlePreference::Feed), "  ");
    }

    #[test]
    fn constructors_populate_exactly_one_body_kind() {
        assert!(!SummaryResult::notes("t", "l", "n").is_placeholder());
        assert!(SummaryResult::placeholder("t", "l", "p").is_placeholder());
    }
}
