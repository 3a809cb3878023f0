// src/lib.rs
//! Knowledge curator: discovers new videos from subscribed channels, keeps the
//! ones whose titles match a keyword, turns their transcripts into study notes
//! and mails one digest per run.

pub mod analyze;
pub mod bootstrap;
pub mod config;
pub mod digest;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod relevance;
pub mod transcript;

/// Default `EnvFilter` directives: the binary's own events plus every
/// library target, `warn` for dependencies.
pub const DEFAULT_LOG_FILTER: &str =
    "knowledge_curator=info,pipeline=info,ingest=info,relevance=info,transcript=info,notify=info,analyze=info,warn";

// ---- Re-exports for stable public API ----
pub use crate::analyze::ai_adapter;
pub use crate::model::{
    CandidateItem, DigestDocument, EnrichedItem, Source, SummaryBody, SummaryResult, TitlePreference,
};
pub use crate::pipeline::{Curator, PipelineDeps, RunMode, RunOutcome, RunReport, RunSettings, RunState};
