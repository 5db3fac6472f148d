//! Error types for payment-processor.

use thiserror::Error;

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// HTTP request failed before a response was received.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor answered with an error object.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        /// Error type, e.g. "card_error".
        kind: Option<String>,
        /// Machine-readable code, e.g. "card_declined".
        code: Option<String>,
        message: String,
    },

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl ProcessorError {
    /// Whether the processor is unreachable or refusing this client, as
    /// opposed to rejecting one particular request.
    ///
    /// Network failures, undecodable responses, bad configuration, 401, 403,
    /// 429 and 5xx count as unavailable. A declined card (402) does not.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ProcessorError::Http(_)
            | ProcessorError::InvalidResponse(_)
            | ProcessorError::Configuration(_) => true,
            ProcessorError::Api { status, .. } => {
                matches!(status, 401 | 403 | 429) || *status >= 500
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, kind: &str) -> ProcessorError {
        ProcessorError::Api {
            status,
            kind: Some(kind.to_string()),
            code: None,
            message: "msg".to_string(),
        }
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(!api(402, "card_error").is_unavailable());
        assert!(!api(400, "invalid_request_error").is_unavailable());
        assert!(!api(404, "invalid_request_error").is_unavailable());
        assert!(api(401, "authentication_error").is_unavailable());
        assert!(api(403, "invalid_request_error").is_unavailable());
        assert!(api(429, "rate_limit_error").is_unavailable());
        assert!(api(500, "api_error").is_unavailable());
        assert!(api(503, "api_error").is_unavailable());
        assert!(ProcessorError::InvalidResponse("eof".to_string()).is_unavailable());
        assert!(ProcessorError::Configuration("no key".to_string()).is_unavailable());
    }
}
