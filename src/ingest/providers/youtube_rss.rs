// src/ingest/providers/youtube_rss.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::ingest::normalize_title;
use crate::ingest::types::FeedReader;
use crate::model::{CandidateItem, Source};
use crate::transcript::item_ref::canonical_link;

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    #[serde(rename = "videoId", alias = "yt:videoId")]
    video_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "link", default)]
    link: Vec<Link>,
    published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339)
        .ok()
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), 0))
}

/// Channel upload feed (Atom) reader.
pub struct YoutubeRssProvider {
    mode: Mode,
}

enum Mode {
    /// Feed bodies keyed by source id; a `None` key answers every source.
    Fixture(HashMap<Option<String>, String>),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl YoutubeRssProvider {
    /// Serve the same XML for every source.
    pub fn from_fixture_str(s: &str) -> Self {
        let mut map = HashMap::new();
        map.insert(None, s.to_string());
        Self {
            mode: Mode::Fixture(map),
        }
    }

    /// Serve per-source XML; unknown sources get an empty feed.
    pub fn from_fixtures<I, K, V>(feeds: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = feeds
            .into_iter()
            .map(|(k, v)| (Some(k.into()), v.into()))
            .collect();
        Self {
            mode: Mode::Fixture(map),
        }
    }

    pub fn from_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("knowledge-curator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building feed http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                client,
            },
        })
    }

    pub fn youtube() -> Result<Self> {
        Self::from_url(DEFAULT_BASE_URL)
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<CandidateItem>> {
        let t0 = std::time::Instant::now();
        let feed: Feed = from_str(s).context("parsing channel atom feed")?;

        let mut out = Vec::with_capacity(feed.entry.len());
        for it in feed.entry {
            let Some(id) = entry_video_id(&it) else {
                tracing::debug!(target: "ingest", "feed entry without video id skipped");
                continue;
            };
            let Some(published_at) = it.published.as_deref().and_then(parse_rfc3339) else {
                tracing::debug!(target: "ingest", %id, "feed entry without valid publish date skipped");
                continue;
            };
            let title = normalize_title(it.title.as_deref().unwrap_or_default());
            let link = pick_link(&it.link).unwrap_or_else(|| canonical_link(&id));

            out.push(CandidateItem {
                id,
                title,
                link,
                published_at,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("curator_feed_parse_ms").record(ms);
        counter!("curator_items_discovered_total").increment(out.len() as u64);
        Ok(out)
    }
}

fn entry_video_id(it: &Entry) -> Option<String> {
    it.video_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| {
            it.id
                .as_deref()
                .and_then(|raw| raw.trim().strip_prefix("yt:video:"))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
}

fn pick_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
        .or_else(|| links.first())
        .and_then(|l| l.href.clone())
        .filter(|h| !h.trim().is_empty())
}

#[async_trait]
impl FeedReader for YoutubeRssProvider {
    async fn fetch_feed(&self, source: &Source) -> Result<Vec<CandidateItem>> {
        match &self.mode {
            Mode::Fixture(map) => {
                let body = map
                    .get(&Some(source.id.clone()))
                    .or_else(|| map.get(&None));
                match body {
                    Some(xml) => Self::parse_items_from_str(xml),
                    None => Ok(Vec::new()),
                }
            }
            Mode::Http { base_url, client } => {
                let url = format!("{base_url}/feeds/videos.xml");
                let resp = client
                    .get(&url)
                    .query(&[("channel_id", source.id.as_str())])
                    .send()
                    .await
                    .context("feed http get()")?;
                if !resp.status().is_success() {
                    bail!("feed http status {}", resp.status());
                }
                let body = resp.text().await.context("feed http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "youtube-rss"
    }
}
