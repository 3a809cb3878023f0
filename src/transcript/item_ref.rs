// src/transcript/item_ref.rs
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Url;

use crate::error::ItemRefError;

fn video_id_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap())
}

fn checked(candidate: &str, original: &str) -> Result<String, ItemRefError> {
    if video_id_re().is_match(candidate) {
        Ok(candidate.to_string())
    } else {
        Err(ItemRefError::Unrecognized(original.to_string()))
    }
}

/// Watch URL for a bare video id.
pub fn canonical_link(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Resolve a user-supplied reference to a video id.
///
/// Accepts `watch?v=` links, `youtu.be/` short links, `/shorts/`, `/embed/`,
/// `/live/` paths and bare 11-char ids. Scheme is optional.
pub fn parse_item_ref(input: &str) -> Result<String, ItemRefError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(ItemRefError::Empty);
    }
    if video_id_re().is_match(raw) {
        return Ok(raw.to_string());
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let url = Url::parse(&with_scheme).map_err(|_| ItemRefError::Unrecognized(raw.to_string()))?;
    let host = url
        .host_str()
        .unwrap_or_default()
        .trim_start_matches("www.")
        .trim_start_matches("m.")
        .trim_start_matches("music.")
        .to_ascii_lowercase();
    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    match host.as_str() {
        "youtu.be" => match segments.next() {
            Some(id) => checked(id, raw),
            None => Err(ItemRefError::Unrecognized(raw.to_string())),
        },
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => match url.query_pairs().find(|(k, _)| k == "v") {
                Some((_, v)) => checked(&v, raw),
                None => Err(ItemRefError::Unrecognized(raw.to_string())),
            },
            Some("shorts" | "embed" | "live" | "v") => match segments.next() {
                Some(id) => checked(id, raw),
                None => Err(ItemRefError::Unrecognized(raw.to_string())),
            },
            _ => Err(ItemRefError::Unrecognized(raw.to_string())),
        },
        _ => Err(ItemRefError::Unrecognized(raw.to_string())),
    }
}
