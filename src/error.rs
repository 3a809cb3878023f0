//! Typed outcomes reported by the adapter boundaries.
//!
//! Transport and parse failures are converted into these enums inside the
//! adapters, so the pipeline only ever matches on domain variants.

/// Content fetcher could not produce a transcript.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("no caption track available for {0}")]
    NoTranscript(String),
    #[error("transcript request failed: {0}")]
    Transport(String),
    #[error("unexpected transcript payload: {0}")]
    Malformed(String),
}

/// Summarizer did not return usable notes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummaryError {
    #[error("summarizer credentials missing ({0})")]
    MissingCredentials(&'static str),
    #[error("summarizer request failed: {0}")]
    Transport(String),
    #[error("summarizer returned HTTP {0}")]
    Status(u16),
    #[error("summarizer returned an empty or malformed response")]
    EmptyResponse,
    #[error("summarizer disabled")]
    Disabled,
}

/// Digest could not be delivered. Terminal for the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery credentials missing ({0})")]
    MissingCredentials(&'static str),
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// On-demand item reference could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemRefError {
    #[error("empty item reference")]
    Empty,
    #[error("unrecognized item reference: {0}")]
    Unrecognized(String),
}
