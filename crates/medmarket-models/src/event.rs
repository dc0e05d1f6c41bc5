//! Events broadcast by the API client.

use serde::{Deserialize, Serialize};

/// A failed request, as announced on the client error channel.
///
/// `status` is absent for transport failures (connection refused,
/// timeout); `url` and `method` describe the request that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Human-readable message extracted from the response.
    pub message: String,
    /// HTTP status code, if a response was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Full request URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Request method in lower case (`get`, `post`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl ErrorEvent {
    /// An event carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            url: None,
            method: None,
        }
    }

    /// Whether the failure was an authorization rejection (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}
