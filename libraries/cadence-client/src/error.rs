//! Error types for track providers.

use thiserror::Error;

/// Errors that can occur when fetching tracks.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Authentication required but no token available
    #[error("Authentication required")]
    AuthRequired,

    /// Requested track does not exist
    #[error("Track not found: {0}")]
    NotFound(String),

    /// Invalid provider URL
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
