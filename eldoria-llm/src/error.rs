//! Transport error types.

use eldoria_core::stream::StreamError;
use thiserror::Error;

/// Errors that can occur while opening or consuming a turn's stream.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("Dialogue request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status.
    #[error("Dialogue endpoint returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, if it could be read.
        body: String,
    },

    /// Request timed out.
    #[error("Dialogue request timed out after {0}ms")]
    Timeout(u64),

    /// Endpoint or model server is unreachable.
    #[error("Dialogue endpoint unavailable: {0}")]
    Unavailable(String),

    /// An upstream chunk was not the JSON we expected.
    #[error("Failed to parse upstream chunk: {0}")]
    ParseError(String),

    /// First message to an NPC without the lore needed to seed its history.
    #[error("No active conversation for NPC {0}. System prompt is required.")]
    MissingSystemPrompt(String),

    /// The inbound stream could not be framed.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Configuration error.
    #[error("Dialogue configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

impl LlmError {
    /// Classify a reqwest error, reporting a timeout against the configured
    /// budget rather than the placeholder `From` uses.
    pub(crate) fn with_timeout(err: reqwest::Error, timeout_ms: u64) -> Self {
        match Self::from(err) {
            Self::Timeout(_) => Self::Timeout(timeout_ms),
            other => other,
        }
    }
}
