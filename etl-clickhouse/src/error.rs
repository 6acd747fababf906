//! Error types for the ClickHouse client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to ClickHouse
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("ClickHouse error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error text returned by the server
        message: String,
    },

    /// Failed to encode rows for insertion
    #[error("Failed to encode rows: {0}")]
    EncodeError(#[from] serde_json::Error),

    /// Server did not answer the ping with the expected body
    #[error("Unexpected ping response: {0}")]
    UnexpectedPing(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_includes_server_text() {
        let err = ClientError::api_error(401, "Authentication failed");
        assert_eq!(
            err.to_string(),
            "ClickHouse error (status 401): Authentication failed"
        );
    }
}
