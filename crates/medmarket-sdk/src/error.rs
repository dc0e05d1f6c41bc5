//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. Failed requests keep the original status and body
//! so callers see exactly what the gateway answered, even after a refresh
//! attempt.

use reqwest::{Method, StatusCode};

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad URL, missing field).
    #[error("configuration error: {0}")]
    Config(String),

    /// Login failed or no session is available.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// An access token could not be decoded.
    #[error("invalid token: {0}")]
    Token(String),

    /// The request never produced a response (connection error, timeout).
    #[error("{source}")]
    Transport {
        /// Request method.
        method: Method,
        /// Full request URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The gateway answered with a non-success status.
    #[error("request failed with status code {}", status.as_u16())]
    Status {
        /// Request method.
        method: Method,
        /// Full request URL.
        url: String,
        /// Response status.
        status: StatusCode,
        /// Raw response body, possibly empty.
        body: String,
    },

    /// HTTP client construction failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Token store I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Response status, when the gateway answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a 401 from the gateway.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display_mentions_code() {
        let err = SdkError::Status {
            method: Method::GET,
            url: "http://localhost/api/x".into(),
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "request failed with status code 404");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn unauthorized_detection() {
        let err = SdkError::Status {
            method: Method::POST,
            url: "http://localhost/api/x".into(),
            status: StatusCode::UNAUTHORIZED,
            body: "{}".into(),
        };
        assert!(err.is_unauthorized());
        assert!(!SdkError::Auth("x".into()).is_unauthorized());
    }
}
