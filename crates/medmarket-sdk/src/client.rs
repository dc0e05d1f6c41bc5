//! Authenticated HTTP client for the MedMarket gateway.
//!
//! [`ApiClient`] attaches the stored access token to every request and
//! keeps it fresh:
//!
//! * **proactively**: a token that is undecodable or expires within the
//!   configured margin is refreshed before the request is sent;
//! * **reactively**: a 401 triggers one refresh and one resend.
//!
//! Refreshes are single-flight (see [`crate::refresh`]). Every failure is
//! announced on the [`AuthEvents::errors`] channel and returned to the
//! caller; a failed refresh additionally clears the stored tokens and
//! fires [`AuthEvents::force_logout`].
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use medmarket_sdk::{ApiClient, AuthEvents, ClientConfig, FileTokenStore};
//!
//! # async fn run() -> Result<(), medmarket_sdk::SdkError> {
//! let store = Arc::new(FileTokenStore::open_default()?);
//! let client = ApiClient::new(ClientConfig::from_env(), store, AuthEvents::new())?;
//!
//! let cart = client.get("/product-service/cart").await?;
//! println!("{}", cart.text());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::Utc;
use medmarket_models::{ErrorEvent, TokenKey};
use serde::Serialize;
use tracing::{debug, warn};

use crate::claims;
use crate::config::ClientConfig;
use crate::error::SdkError;
use crate::events::AuthEvents;
use crate::message::extract_message;
use crate::refresh::{RefreshGate, TokenExchange};
use crate::request::{ApiRequest, ApiResponse};
use crate::store::TokenStore;

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    events: AuthEvents,
    refresh: RefreshGate,
}

/// Gateway client. Cheap to clone; clones share the token store, the
/// event channels and the refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Build a client over `store`, publishing on `events`.
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
        events: AuthEvents,
    ) -> Result<Self, SdkError> {
        config.validate()?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        let refresh = RefreshGate::new(TokenExchange {
            http: http.clone(),
            refresh_url: config.refresh_url(),
            store: Arc::clone(&store),
            events: events.clone(),
        });

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                store,
                events,
                refresh,
            }),
        })
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Send a request with the current credentials.
    ///
    /// Returns the response for any 2xx status. On failure the error is
    /// published on the error channel, and a first 401 is answered with a
    /// refresh and exactly one resend. If that refresh fails, the original
    /// 401 is returned.
    pub async fn dispatch(&self, mut request: ApiRequest) -> Result<ApiResponse, SdkError> {
        let token = self.token_for_send().await;

        let err = match self.execute(&request, token.as_deref()).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };
        if !err.is_unauthorized() || request.retried {
            return Err(err);
        }
        request.retried = true;

        // Another request may already have renewed the token we were
        // rejected with; the gate only starts a cycle if the store still
        // holds it.
        match self.inner.refresh.refresh(token.as_deref()).await {
            Some(fresh) => {
                debug!(method = %request.method, path = %request.path, "resending after refresh");
                self.execute(&request, Some(&fresh)).await
            }
            None => Err(err),
        }
    }

    /// The token to attach, refreshed first if it is about to expire.
    async fn token_for_send(&self) -> Option<String> {
        let token = self.inner.store.get(TokenKey::Access)?;

        let margin = i64::try_from(self.inner.config.refresh_margin.as_secs()).unwrap_or(i64::MAX);
        if claims::is_expired(&token, Utc::now().timestamp(), margin) {
            debug!("access token expired or expiring, refreshing before send");
            return self.inner.refresh.refresh(Some(&token)).await;
        }
        Some(token)
    }

    /// Send once; report failures on the error channel.
    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, SdkError> {
        let result = self.send(request, token).await;
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<ApiResponse, SdkError> {
        let url = self.inner.config.url_for(&request.path);

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let transport = |source: reqwest::Error| SdkError::Transport {
            method: request.method.clone(),
            url: url.clone(),
            source,
        };

        let res = builder.send().await.map_err(transport)?;
        let status = res.status();
        let headers = res.headers().clone();
        let final_url = res.url().to_string();
        let body = res.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(SdkError::Status {
                method: request.method.clone(),
                url: final_url,
                status,
                body,
            });
        }

        Ok(ApiResponse {
            status,
            url: final_url,
            headers,
            body,
        })
    }

    /// Publish `err` on the error channel. Never fails.
    fn report(&self, err: &SdkError) {
        let event = match err {
            SdkError::Status {
                method,
                url,
                status,
                body,
            } => ErrorEvent {
                message: extract_message(Some(body), &err.to_string()),
                status: Some(status.as_u16()),
                url: Some(url.clone()),
                method: Some(method.as_str().to_lowercase()),
            },
            SdkError::Transport { method, url, source } => ErrorEvent {
                message: extract_message(None, &source.to_string()),
                status: None,
                url: Some(url.clone()),
                method: Some(method.as_str().to_lowercase()),
            },
            other => ErrorEvent::new(extract_message(None, &other.to_string())),
        };

        warn!(
            status = ?event.status,
            url = event.url.as_deref().unwrap_or_default(),
            message = %event.message,
            "request failed"
        );
        self.inner.events.errors.emit(&event);
    }

    // ------------------------------------------------------------------
    // Convenience verbs
    // ------------------------------------------------------------------

    /// `GET path`.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, SdkError> {
        self.dispatch(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse, SdkError> {
        self.dispatch(ApiRequest::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse, SdkError> {
        self.dispatch(ApiRequest::put(path).json(body)?).await
    }

    /// `PATCH path` with a JSON body.
    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse, SdkError> {
        self.dispatch(ApiRequest::patch(path).json(body)?).await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, SdkError> {
        self.dispatch(ApiRequest::delete(path)).await
    }

    /// Send `request` and deserialize the JSON response.
    pub async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, SdkError> {
        self.dispatch(request).await?.json()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The shared token store.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    /// The channels this client publishes on.
    pub fn events(&self) -> &AuthEvents {
        &self.inner.events
    }

    /// Whether a token refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Force a refresh cycle (or join the running one).
    pub async fn refresh_access_token(&self) -> Option<String> {
        let current = self.inner.store.get(TokenKey::Access);
        self.inner.refresh.refresh(current.as_deref()).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.inner.config.api_url)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}
