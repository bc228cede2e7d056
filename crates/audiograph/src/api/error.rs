//! Error types for collection API operations.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when talking to the collection API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response was produced.
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// Response body could not be decoded as the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// API returned a non-success status.
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },
}

/// Whether a response status is worth retrying at the transport layer.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Get a short error message suitable for display.
pub fn short_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Transport(_) => "Network error".to_string(),
        ApiError::Decode(_) => "JSON decode error".to_string(),
        ApiError::Status { status, message } => {
            if message.len() > 50 {
                // Use chars to avoid panicking on multi-byte UTF-8
                let truncated: String = message.chars().take(47).collect();
                format!("HTTP {}: {}...", status, truncated)
            } else {
                format!("HTTP {}: {}", status, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_cover_throttling_and_server_errors() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(401));
    }

    #[test]
    fn short_message_truncates_long_api_bodies() {
        let err = ApiError::Status {
            status: 502,
            message: "x".repeat(80),
        };
        let msg = short_error_message(&err);
        assert!(msg.starts_with("HTTP 502: "));
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 70, "message should be truncated: {msg}");
    }

    #[test]
    fn short_message_keeps_short_api_bodies() {
        let err = ApiError::Status {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(short_error_message(&err), "HTTP 404: not found");
    }

    #[test]
    fn short_message_survives_multibyte_bodies() {
        let err = ApiError::Status {
            status: 500,
            message: "é".repeat(60),
        };
        // Must not panic on a char boundary.
        let msg = short_error_message(&err);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn transport_error_converts_via_from() {
        let err: ApiError = HttpError::Transport("connection refused".to_string()).into();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(short_error_message(&err), "Network error");
    }
}
