// src/transcript/youtube.rs
//! Caption-track transcript fetcher.
//!
//! Two independent lookups per video:
//! - transcript: watch page -> player response -> caption track -> timedtext XML
//! - title: oEmbed for the exact watch URL (keyed by video id, never positional)

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

use crate::error::FetchError;
use crate::transcript::{ContentFetcher, FetchedContent};

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: Option<TrackList>,
}

#[derive(Debug, Deserialize)]
struct TrackList {
    #[serde(rename = "captionTracks", default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode", default)]
    language_code: String,
    /// "asr" for auto-generated tracks.
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(rename = "text", default)]
    cues: Vec<Cue>,
}

#[derive(Debug, Deserialize)]
struct Cue {
    #[serde(rename = "$text", default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: Option<String>,
}

pub struct YoutubeTranscriptFetcher {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<String>,
}

impl YoutubeTranscriptFetcher {
    pub fn new(base_url: impl Into<String>, languages: Vec<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("knowledge-curator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            languages,
        })
    }

    pub fn youtube(languages: Vec<String>) -> Result<Self, FetchError> {
        Self::new(DEFAULT_BASE_URL, languages)
    }

    fn watch_url(&self, video_id: &str) -> String {
        format!("{}/watch?v={video_id}", self.base_url)
    }

    fn absolutize(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{url}", self.base_url)
        } else {
            url.to_string()
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.8")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(FetchError::Transport(format!("HTTP {}", resp.status())));
        }
        resp.text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }

    /// Transcript text and, as a by-product, the player's title when its
    /// `videoId` matches the requested one.
    async fn lookup_transcript(&self, video_id: &str) -> (Result<String, FetchError>, Option<String>) {
        let page = match self.get_text(&self.watch_url(video_id)).await {
            Ok(p) => p,
            Err(e) => return (Err(e), None),
        };
        let player = match extract_player_response(&page) {
            Ok(p) => p,
            Err(e) => return (Err(e), None),
        };

        let page_title = player
            .video_details
            .as_ref()
            .filter(|d| d.video_id.as_deref() == Some(video_id))
            .and_then(|d| d.title.clone())
            .filter(|t| !t.trim().is_empty());

        let tracks = player
            .captions
            .and_then(|c| c.renderer)
            .map(|r| r.caption_tracks)
            .unwrap_or_default();
        let Some(track) = pick_track(&tracks, &self.languages) else {
            return (Err(FetchError::NoTranscript(video_id.to_string())), page_title);
        };

        let text = match self.get_text(&self.absolutize(&track.base_url)).await {
            Ok(xml) => parse_timedtext(&xml).and_then(|t| {
                if t.is_empty() {
                    Err(FetchError::NoTranscript(video_id.to_string()))
                } else {
                    Ok(t)
                }
            }),
            Err(e) => Err(e),
        };
        (text, page_title)
    }

    async fn lookup_title(&self, video_id: &str) -> Option<String> {
        let resp = self
            .client
            .get(format!("{}/oembed", self.base_url))
            .query(&[("url", self.watch_url(video_id).as_str()), ("format", "json")])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let body: OEmbed = resp.json().await.ok()?;
        body.title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn player_response_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)ytInitialPlayerResponse\s*=\s*(\{.+?\})\s*;\s*(?:var\s|</script>)").unwrap()
    })
}

fn extract_player_response(page: &str) -> Result<PlayerResponse, FetchError> {
    let json = player_response_re()
        .captures(page)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| FetchError::Malformed("player response not found".into()))?;
    serde_json::from_str(json).map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Manual tracks in preferred-language order, then auto-generated ones,
/// then whatever comes first.
fn pick_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    let is_asr = |t: &CaptionTrack| t.kind.as_deref() == Some("asr");
    let lang_match = |t: &CaptionTrack, lang: &str| {
        t.language_code.eq_ignore_ascii_case(lang)
            || t.language_code
                .split('-')
                .next()
                .is_some_and(|base| base.eq_ignore_ascii_case(lang))
    };
    for want_asr in [false, true] {
        for lang in languages {
            if let Some(t) = tracks
                .iter()
                .find(|t| is_asr(t) == want_asr && lang_match(t, lang))
            {
                return Some(t);
            }
        }
    }
    tracks.first()
}

/// Join caption cues into one space-separated body.
pub fn parse_timedtext(xml: &str) -> Result<String, FetchError> {
    let doc: TimedText = from_str(xml).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let parts: Vec<String> = doc
        .cues
        .iter()
        .map(|c| {
            html_escape::decode_html_entities(&c.body)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|s| !s.is_empty())
        .collect();
    Ok(parts.join(" "))
}

#[async_trait]
impl ContentFetcher for YoutubeTranscriptFetcher {
    async fn fetch(&self, item_id: &str) -> FetchedContent {
        let ((text, page_title), oembed_title) =
            tokio::join!(self.lookup_transcript(item_id), self.lookup_title(item_id));
        let title = oembed_title.or(page_title);

        if let Err(e) = &text {
            tracing::warn!(target: "transcript", video_id = item_id, error = %e, "transcript unavailable");
            counter!("curator_transcript_failures_total").increment(1);
        }
        FetchedContent { text, title }
    }

    fn name(&self) -> &'static str {
        "youtube-captions"
    }
}
