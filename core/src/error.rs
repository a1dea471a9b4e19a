//! Error types for the Webflow API client.
//!
//! # Design
//! Every failure a call can hit maps to exactly one variant. Non-2xx
//! responses all land in `Http` with the raw status code and body; the client
//! does no status-specific handling, so callers branch on `status()` or
//! inspect `json_body()` themselves.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by `WebflowClient` and its transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials or other settings are missing or invalid. Raised before
    /// any request is attempted.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never produced a response (DNS, connection, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A 2xx response body was not the JSON shape expected.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Status code of an upstream HTTP error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Upstream error body parsed as JSON, when it is JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Http { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_exposes_status_and_json_body() {
        let err = ApiError::Http {
            status: 404,
            body: r#"{"msg":"Item not found","code":404}"#.to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.json_body().unwrap()["msg"], "Item not found");
        assert_eq!(err.to_string(), r#"HTTP 404: {"msg":"Item not found","code":404}"#);
    }

    #[test]
    fn non_json_error_body_has_no_json_view() {
        let err = ApiError::Http {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert!(err.json_body().is_none());
        assert!(!err.is_not_found());
    }

    #[test]
    fn non_http_errors_have_no_status() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
