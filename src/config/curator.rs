// src/config/curator.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ai::SummarizerConfig;
use crate::model::Source;

pub const ENV_CONFIG_PATH: &str = "CURATOR_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/curator.toml";
pub const DEFAULT_JSON_PATH: &str = "config/curator.json";

fn default_recency_window_hours() -> u64 {
    24
}
fn default_concurrency() -> usize {
    3
}
fn default_summary_attempts() -> u32 {
    1
}
fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}
fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    465
}

/// Knobs for the orchestrator.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PipelineSettings {
    #[serde(default = "default_recency_window_hours")]
    pub recency_window_hours: u64,
    /// Max enrichment tasks in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Whole-run budget; in-flight enrichment is cancelled when it runs out.
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
    /// Summarizer calls per item. No backoff between attempts.
    #[serde(default = "default_summary_attempts")]
    pub summary_attempts: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            recency_window_hours: default_recency_window_hours(),
            concurrency: default_concurrency(),
            run_timeout_secs: None,
            summary_attempts: default_summary_attempts(),
        }
    }
}

impl PipelineSettings {
    pub fn recency_window(&self) -> chrono::Duration {
        // Capped well inside chrono's range.
        chrono::Duration::hours(self.recency_window_hours.min(24 * 365 * 100) as i64)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TranscriptSettings {
    /// Caption languages in order of preference.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: default_languages(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
        }
    }
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct CuratorConfig {
    pub recipient_email: String,
    pub channels: Vec<Source>,
    /// Lower-cased, trimmed, de-duplicated.
    pub keywords: Vec<String>,
    pub pipeline: PipelineSettings,
    pub summarizer: SummarizerConfig,
    pub transcript: TranscriptSettings,
    pub smtp: SmtpSettings,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    recipient_email: String,
    #[serde(default)]
    channels: Vec<Source>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    pipeline: PipelineSettings,
    #[serde(default)]
    summarizer: SummarizerConfig,
    #[serde(default)]
    transcript: TranscriptSettings,
    #[serde(default)]
    smtp: SmtpSettings,
}

/// Load configuration from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<CuratorConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading curator config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing curator config {}", path.display()))
}

/// Load configuration using env var + fallbacks:
/// 1) $CURATOR_CONFIG_PATH
/// 2) config/curator.toml
/// 3) config/curator.json
pub fn load_config_default() -> Result<CuratorConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Err(anyhow!(
        "no configuration found (set {ENV_CONFIG_PATH} or create {DEFAULT_TOML_PATH})"
    ))
}

/// Explicit path wins; otherwise the default lookup chain.
pub fn load_config(explicit: Option<&Path>) -> Result<CuratorConfig> {
    match explicit {
        Some(p) if p.exists() => load_config_from(p),
        Some(p) => Err(anyhow!("config file {} does not exist", p.display())),
        None => load_config_default(),
    }
}

pub fn parse_config(s: &str, hint_ext: &str) -> Result<CuratorConfig> {
    let raw: RawConfig = match hint_ext {
        "json" => serde_json::from_str(s)?,
        "toml" => toml::from_str(s)?,
        _ => match serde_json::from_str(s) {
            Ok(v) => v,
            Err(_) => toml::from_str(s).context("config is neither JSON nor TOML")?,
        },
    };
    validate(raw)
}

fn validate(raw: RawConfig) -> Result<CuratorConfig> {
    let recipient_email = raw.recipient_email.trim().to_string();
    if recipient_email.is_empty() {
        bail!("recipient_email must not be empty");
    }

    let mut pipeline = raw.pipeline;
    pipeline.concurrency = pipeline.concurrency.max(1);
    pipeline.summary_attempts = pipeline.summary_attempts.max(1);

    let mut transcript = raw.transcript;
    transcript.languages = transcript
        .languages
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    Ok(CuratorConfig {
        recipient_email,
        channels: clean_channels(raw.channels),
        keywords: clean_keywords(raw.keywords),
        pipeline,
        summarizer: raw.summarizer.normalized(),
        transcript,
        smtp: raw.smtp,
    })
}

fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() {
            set.insert(t);
        }
    }
    set.into_iter().collect()
}

/// Keeps declaration order; drops blank ids and repeats.
fn clean_channels(items: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|s| {
            let id = s.id.trim().to_string();
            if id.is_empty() || !seen.insert(id.clone()) {
                return None;
            }
            let name = match s.name.trim() {
                "" => id.clone(),
                n => n.to_string(),
            };
            Some(Source { id, name })
        })
        .collect()
}
