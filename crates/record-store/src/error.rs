//! Error types for record-store.

use thiserror::Error;

/// Errors that can occur when talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-2xx response from the API.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The API rejected our credentials.
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Too many records in a single update call.
    #[error("cannot update more than {max} records at once (got {count})")]
    BatchTooLarge { count: usize, max: usize },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether this error means the credentials are bad rather than the
    /// request or the network.
    pub fn is_auth(&self) -> bool {
        matches!(self, StoreError::Unauthorized { .. })
    }
}
