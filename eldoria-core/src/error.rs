//! Error types for the Eldoria core library.

use thiserror::Error;

/// Top-level error type for core operations.
#[derive(Error, Debug)]
pub enum EldoriaError {
    /// Configuration could not be parsed or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, EldoriaError>;
