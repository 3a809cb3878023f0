//! Summarizer adapter: provider abstraction + study-note client.
//!
//! A `Provider` does one raw remote call for a prompt. `NotesClient` wraps a
//! provider with the study-note template and response cleanup, and is what
//! the pipeline sees through the `Summarizer` trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analyze::prompt::{build_prompt, SYSTEM_ROLE};
use crate::config::ai::SummarizerConfig;
use crate::error::SummaryError;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

pub type SummaryFuture<'a> = Pin<Box<dyn Future<Output = Result<String, SummaryError>> + Send + 'a>>;

/// Trait object used by the pipeline and tests.
pub trait Summarizer: Send + Sync {
    /// One attempt: returns study notes for `text`, or the reason it could not.
    fn summarize<'a>(&'a self, text: &'a str, title: &'a str) -> SummaryFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com";

/// Factory: build a summarizer according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else builds the configured provider wrapped with the study-note template.
/// * Unknown providers yield a disabled client (every item gets a placeholder).
pub fn build_client_from_config(config: &SummarizerConfig) -> Result<DynSummarizer, SummaryError> {
    let mock_mode = std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false);
    if mock_mode || config.provider == "mock" {
        return Ok(Arc::new(NotesClient::new(
            MockProvider::default(),
            config.max_transcript_chars,
        )));
    }

    let timeout = Duration::from_secs(config.timeout_secs);
    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        tracing::warn!(
            target: "analyze",
            provider = %config.provider,
            env = config.key_env_var().unwrap_or("-"),
            "summarizer API key missing; every item will get a placeholder"
        );
    }

    match config.provider.as_str() {
        "gemini" => {
            let provider = GeminiProvider::new(
                api_key,
                config.model.as_deref(),
                GEMINI_ENDPOINT,
                timeout,
            )?;
            Ok(Arc::new(NotesClient::new(provider, config.max_transcript_chars)))
        }
        "openai" => {
            let provider = OpenAiProvider::new(
                api_key,
                config.model.as_deref(),
                OPENAI_ENDPOINT,
                timeout,
            )?;
            Ok(Arc::new(NotesClient::new(provider, config.max_transcript_chars)))
        }
        other => {
            tracing::warn!(target: "analyze", provider = other, "unknown summarizer provider; disabled");
            Ok(Arc::new(DisabledClient))
        }
    }
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: does a *real* remote call for a finished prompt.
pub trait Provider: Send + Sync + 'static {
    fn generate<'a>(&'a self, prompt: &'a str) -> SummaryFuture<'a>;
    fn name(&self) -> &'static str;
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, SummaryError> {
    reqwest::Client::builder()
        .user_agent(concat!("knowledge-curator/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(timeout)
        .build()
        .map_err(|e| SummaryError::Transport(e.to_string()))
}

fn transport(e: reqwest::Error) -> SummaryError {
    if e.is_timeout() {
        SummaryError::Transport("request timed out".to_string())
    } else {
        SummaryError::Transport(e.to_string())
    }
}

/// Gemini `generateContent` provider. Requires `GEMINI_API_KEY`.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: Option<String>,
        model_override: Option<&str>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, SummaryError> {
        Ok(Self {
            http: build_http(timeout)?,
            api_key,
            model: model_override.unwrap_or(GEMINI_DEFAULT_MODEL).to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

impl Provider for GeminiProvider {
    fn generate<'a>(&'a self, prompt: &'a str) -> SummaryFuture<'a> {
        Box::pin(async move {
            let Some(api_key) = self.api_key.as_deref() else {
                return Err(SummaryError::MissingCredentials("GEMINI_API_KEY"));
            };

            #[derive(Serialize)]
            struct Part<'a> {
                text: &'a str,
            }
            #[derive(Serialize)]
            struct Content<'a> {
                role: &'a str,
                parts: Vec<Part<'a>>,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                contents: Vec<Content<'a>>,
            }
            #[derive(Deserialize)]
            struct Resp {
                #[serde(default)]
                candidates: Vec<Candidate>,
            }
            #[derive(Deserialize)]
            struct Candidate {
                content: Option<RespContent>,
            }
            #[derive(Deserialize)]
            struct RespContent {
                #[serde(default)]
                parts: Vec<RespPart>,
            }
            #[derive(Deserialize)]
            struct RespPart {
                text: Option<String>,
            }

            let req = Req {
                contents: vec![Content {
                    role: "user",
                    parts: vec![Part { text: prompt }],
                }],
            };

            let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
            let resp = self
                .http
                .post(url)
                .header("x-goog-api-key", api_key)
                .json(&req)
                .send()
                .await
                .map_err(transport)?;

            if !resp.status().is_success() {
                return Err(SummaryError::Status(resp.status().as_u16()));
            }
            let body: Resp = resp.json().await.map_err(|_| SummaryError::EmptyResponse)?;
            let text: String = body
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .map(|c| {
                    c.parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();
            Ok(text)
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// OpenAI provider (uses Chat Completions API). Requires `OPENAI_API_KEY`.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl OpenAiProvider {
    /// `model_override`: pass Some("gpt-4o") to override; defaults to gpt-4o-mini.
    pub fn new(
        api_key: Option<String>,
        model_override: Option<&str>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, SummaryError> {
        Ok(Self {
            http: build_http(timeout)?,
            api_key,
            model: model_override.unwrap_or(OPENAI_DEFAULT_MODEL).to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

impl Provider for OpenAiProvider {
    fn generate<'a>(&'a self, prompt: &'a str) -> SummaryFuture<'a> {
        Box::pin(async move {
            let Some(api_key) = self.api_key.as_deref() else {
                return Err(SummaryError::MissingCredentials("OPENAI_API_KEY"));
            };

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
            }
            #[derive(Deserialize)]
            struct Resp {
                #[serde(default)]
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: Option<String>,
            }

            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: SYSTEM_ROLE,
                    },
                    Msg {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: 0.3,
            };

            let resp = self
                .http
                .post(format!("{}/v1/chat/completions", self.endpoint))
                .bearer_auth(api_key)
                .json(&req)
                .send()
                .await
                .map_err(transport)?;

            if !resp.status().is_success() {
                return Err(SummaryError::Status(resp.status().as_u16()));
            }
            let body: Resp = resp.json().await.map_err(|_| SummaryError::EmptyResponse)?;
            Ok(body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default())
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Fails every call; used when no usable provider is configured.
pub struct DisabledClient;

impl Summarizer for DisabledClient {
    fn summarize<'a>(&'a self, _text: &'a str, _title: &'a str) -> SummaryFuture<'a> {
        Box::pin(async { Err(SummaryError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic provider for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            fixed: "### Core Concepts\n*   **Mock:** Generated without a model.\n\n### Key Takeaways\n*   **Mock:** Nothing to take away.\n\n### Notable Examples or Analogies\n*   **Mock:** None.".to_string(),
        }
    }
}

impl Provider for MockProvider {
    fn generate<'a>(&'a self, _prompt: &'a str) -> SummaryFuture<'a> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Study-note client
// ------------------------------------------------------------

pub struct NotesClient<P: Provider> {
    inner: P,
    max_transcript_chars: usize,
}

impl<P: Provider> NotesClient<P> {
    pub fn new(inner: P, max_transcript_chars: usize) -> Self {
        Self {
            inner,
            max_transcript_chars,
        }
    }

    async fn summarize_impl(&self, text: &str, title: &str) -> Result<String, SummaryError> {
        let prompt = build_prompt(text, title, self.max_transcript_chars);
        let raw = self.inner.generate(&prompt).await?;
        let cleaned = clean_notes(&raw);
        if cleaned.is_empty() {
            Err(SummaryError::EmptyResponse)
        } else {
            Ok(cleaned)
        }
    }
}

impl<P: Provider> Summarizer for NotesClient<P> {
    fn summarize<'a>(&'a self, text: &'a str, title: &'a str) -> SummaryFuture<'a> {
        Box::pin(self.summarize_impl(text, title))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// Sanitization
// ------------------------------------------------------------

/// Trim, normalize line endings and drop a wrapping ``` fence if the model
/// added one.
pub fn clean_notes(input: &str) -> String {
    let s = input.replace("\r\n", "\n");
    let mut s = s.trim();
    if let Some(rest) = s.strip_prefix("```") {
        let rest = rest.split_once('\n').map_or("", |(_, body)| body);
        s = rest.strip_suffix("```").unwrap_or(rest).trim();
    }
    s.to_string()
}
