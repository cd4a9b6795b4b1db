//! Reddit keyword mention tracker.
//!
//! This crate provides:
//! - Reddit search over a bounded time window, optionally including comment threads
//! - Keyword filtering with per-run de-duplication
//! - Suggested replies drafted by Claude
//! - One markdown or JSON report per run

pub mod ai;
pub mod config;
pub mod drafting;
pub mod errors;
pub mod pipeline;
pub mod records;
pub mod reddit;
pub mod source;
pub mod storage;

// Re-export main types
pub use config::{Config, ConfigError, OutputFormat};
pub use errors::{MentionsError, MentionsResult};
pub use pipeline::{Pipeline, PipelineConfig, RunSummary};
pub use records::{ItemKind, MatchRecord, SuggestedReply};
pub use source::{MentionSource, SourceItem, TimeWindow};
pub use storage::RunReport;
