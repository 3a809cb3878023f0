pub mod ai;
pub mod curator;

pub use ai::SummarizerConfig;
pub use curator::{CuratorConfig, PipelineSettings, SmtpSettings, TranscriptSettings};
