//! Client configuration.
//!
//! [`ClientConfig`] holds the gateway base URLs and the timing knobs of the
//! refresh logic. It is built from environment variables (see
//! [`ClientConfig::from_env`]) and refined with the `with_*` builders.

use std::time::Duration;

use crate::error::SdkError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Tokens expiring within this margin are refreshed before sending.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Gateway base path when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8085/api";

/// Connection parameters for an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto.
    pub api_url: String,
    /// Base URL of the auth service (`{auth_url}/refresh`).
    pub auth_url: String,
    /// Per-request timeout, refresh calls included.
    pub timeout: Duration,
    /// Safety margin before token expiry.
    pub refresh_margin: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Configuration for the given API base; the auth base is `{api_url}/auth`.
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            auth_url: format!("{api_url}/auth"),
            api_url,
            timeout: DEFAULT_TIMEOUT,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        }
    }

    /// Build the configuration from environment variables.
    ///
    /// | Variable                        | Default                      |
    /// |---------------------------------|------------------------------|
    /// | `MEDMARKET_API_URL`             | `http://localhost:8085/api`  |
    /// | `MEDMARKET_AUTH_URL`            | `{MEDMARKET_API_URL}/auth`   |
    /// | `MEDMARKET_TIMEOUT_SECS`        | `15`                         |
    /// | `MEDMARKET_REFRESH_MARGIN_SECS` | `30`                         |
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("MEDMARKET_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);

        if let Ok(auth_url) = std::env::var("MEDMARKET_AUTH_URL") {
            config = config.with_auth_url(auth_url);
        }
        if let Some(secs) = env_secs("MEDMARKET_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs("MEDMARKET_REFRESH_MARGIN_SECS") {
            config.refresh_margin = Duration::from_secs(secs);
        }
        config
    }

    /// Override the auth service base URL.
    #[must_use]
    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the expiry safety margin.
    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Full URL of the refresh endpoint.
    pub fn refresh_url(&self) -> String {
        format!("{}/refresh", self.auth_url)
    }

    /// Join a request path onto the API base.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Check that both base URLs parse.
    pub fn validate(&self) -> Result<(), SdkError> {
        for (name, url) in [("api_url", &self.api_url), ("auth_url", &self.auth_url)] {
            reqwest::Url::parse(url)
                .map_err(|e| SdkError::Config(format!("invalid {name} \"{url}\": {e}")))?;
        }
        if self.timeout.is_zero() {
            return Err(SdkError::Config("timeout must be non-zero".into()));
        }
        Ok(())
    }
}

fn env_secs(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_url_follows_api_url() {
        let cfg = ClientConfig::new("http://gateway:8080/api/");
        assert_eq!(cfg.api_url, "http://gateway:8080/api");
        assert_eq!(cfg.refresh_url(), "http://gateway:8080/api/auth/refresh");
    }

    #[test]
    fn url_for_handles_leading_slash() {
        let cfg = ClientConfig::default();
        assert_eq!(
            cfg.url_for("/product-service/cart"),
            "http://localhost:8085/api/product-service/cart"
        );
        assert_eq!(
            cfg.url_for("auth/password/a@b.c"),
            "http://localhost:8085/api/auth/password/a@b.c"
        );
    }

    #[test]
    fn defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.timeout, Duration::from_secs(15));
        assert_eq!(cfg.refresh_margin, Duration::from_secs(30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let cfg = ClientConfig::new("not a url");
        assert!(matches!(cfg.validate(), Err(SdkError::Config(_))));
    }

    #[test]
    fn builders_override() {
        let cfg = ClientConfig::default()
            .with_auth_url("http://auth:9000/")
            .with_timeout(Duration::from_secs(3))
            .with_refresh_margin(Duration::ZERO);
        assert_eq!(cfg.refresh_url(), "http://auth:9000/refresh");
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert!(cfg.refresh_margin.is_zero());
    }
}
