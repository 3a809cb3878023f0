//! Summarizer: study-note generation over a generative text service.

pub mod ai_adapter;
pub mod prompt;

pub use ai_adapter::{build_client_from_config, DynSummarizer, Summarizer};
