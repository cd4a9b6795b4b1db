//! Error types for the mention tracker.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during a tracking run.
#[derive(Debug, Error)]
pub enum MentionsError {
    /// Configuration is missing or malformed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API answered with a non-success status
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Model answered but produced no text
    #[error("{0} returned an empty reply")]
    EmptyReply(&'static str),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prompt template failed to render
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Prompt file is unusable
    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl MentionsError {
    /// Whether this error must abort the whole run.
    ///
    /// Connection failures, timeouts and rejected credentials are fatal.
    /// Anything else that happens while handling a single record only
    /// affects that record.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Io(_) | Self::Prompt(_) => true,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            Self::Api { status, .. } => matches!(status, 401 | 403),
            Self::EmptyReply(_) | Self::Json(_) | Self::Template(_) => false,
        }
    }
}

/// Result type used throughout the crate.
pub type MentionsResult<T> = Result<T, MentionsError>;
