//! Gateway configuration.
//!
//! Built from environment variables at startup and shared with the
//! handlers through [`crate::state::AppState`].

/// Global configuration shared across all handlers.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port to listen on (default `8085`).
    pub listen_port: u16,
    /// HMAC secret used to sign tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: i64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_port: 8085,
            jwt_secret: "medmarket-dev-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86_400,
        }
    }
}

impl GatewayConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                   | Default                |
    /// |----------------------------|------------------------|
    /// | `GATEWAY_PORT`             | `8085`                 |
    /// | `GATEWAY_JWT_SECRET`       | `medmarket-dev-secret` |
    /// | `GATEWAY_ACCESS_TTL_SECS`  | `900`                  |
    /// | `GATEWAY_REFRESH_TTL_SECS` | `86400`                |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_port: env_parse("GATEWAY_PORT").unwrap_or(defaults.listen_port),
            jwt_secret: std::env::var("GATEWAY_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            access_ttl_secs: env_parse("GATEWAY_ACCESS_TTL_SECS")
                .unwrap_or(defaults.access_ttl_secs),
            refresh_ttl_secs: env_parse("GATEWAY_REFRESH_TTL_SECS")
                .unwrap_or(defaults.refresh_ttl_secs),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listen_port() {
        assert_eq!(GatewayConfig::default().listen_port, 8085);
    }

    #[test]
    fn access_tokens_outlive_the_client_margin() {
        let cfg = GatewayConfig::default();
        assert!(cfg.access_ttl_secs > 30);
        assert!(cfg.refresh_ttl_secs > cfg.access_ttl_secs);
    }
}
