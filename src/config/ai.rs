// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_transcript_chars() -> usize {
    120_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// "gemini" | "openai" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider-specific model name; each provider has its own default.
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from GEMINI_API_KEY / OPENAI_API_KEY (by provider)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Transcripts are cut to this many chars before prompting.
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
            max_transcript_chars: default_max_transcript_chars(),
        }
    }
}

impl SummarizerConfig {
    /// Lower-case the provider name and repair out-of-range knobs.
    pub fn normalized(mut self) -> Self {
        self.provider = self.provider.trim().to_lowercase();
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.max_transcript_chars == 0 {
            self.max_transcript_chars = default_max_transcript_chars();
        }
        self
    }

    /// Env var holding the key for the configured provider.
    pub fn key_env_var(&self) -> Option<&'static str> {
        match self.provider.as_str() {
            "gemini" => Some("GEMINI_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }

    /// Resolve the API key. A missing key is not an error here: the provider
    /// reports it per call so the run still degrades to placeholders.
    pub fn resolve_api_key(&self) -> Option<String> {
        let raw = self.api_key.trim();
        if raw.eq_ignore_ascii_case("env") {
            self.key_env_var()
                .and_then(|name| env::var(name).ok())
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        } else if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }
}
