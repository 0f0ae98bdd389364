//! Error types for voice-qa

use thiserror::Error;

/// Result type alias for voice-qa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voice-qa
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech recognition error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Answer service error (non-success status, unusable reply)
    #[error("answer service error: {0}")]
    Dispatch(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing error
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
