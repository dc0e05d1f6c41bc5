//! Request descriptors and responses.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::SdkError;

/// Everything needed to (re)send one request.
///
/// Descriptors are plain data so the client can rebuild the HTTP request
/// when it has to resend with a renewed token.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Value>,
    /// Set once the request has been resent after a 401.
    pub(crate) retried: bool,
}

impl ApiRequest {
    /// A request with no query, headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append every non-null field of `params` as query parameters.
    ///
    /// Arrays are sent comma-separated (`ids=1,2,3`).
    pub fn query_params<T: Serialize>(mut self, params: &T) -> Result<Self, SdkError> {
        match serde_json::to_value(params)? {
            Value::Object(map) => {
                for (key, value) in map {
                    if let Some(value) = query_value(&value) {
                        self.query.push((key, value));
                    }
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(SdkError::Config(format!(
                "query parameters must be an object, got {other}"
            ))),
        }
    }

    /// Add a header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, SdkError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SdkError::Config(format!("invalid header name \"{name}\": {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SdkError::Config(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, SdkError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Use an already-built JSON value as the request body.
    #[must_use]
    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Never answer a 401 with refresh-and-resend (credential endpoints).
    #[must_use]
    pub fn skip_refresh(mut self) -> Self {
        self.retried = true;
        self
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the API base.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Whether this request was already resent after a 401.
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

/// A successful response with its body read into memory.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub(crate) status: StatusCode,
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: String,
}

impl ApiResponse {
    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Final request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body text.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, SdkError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
