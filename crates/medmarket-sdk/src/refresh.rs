//! Single-flight access-token refresh.
//!
//! A refresh cycle moves `Idle → Refreshing → {Succeeded, Failed} → Idle`.
//! While a cycle is running, every caller of [`RefreshGate::refresh`]
//! receives a clone of the same shared future, so the auth endpoint is
//! called at most once per cycle and every waiter sees the same outcome.
//!
//! The exchange runs on its own task: it completes (and the gate returns to
//! `Idle`) even if every waiter gives up.
//!
//! Callers pass the access token they saw. If the store already holds a
//! different one when the gate is idle, a cycle finished in between and
//! that token is handed back without contacting the auth endpoint.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use medmarket_models::TokenKey;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SdkError;
use crate::events::AuthEvents;
use crate::store::TokenStore;

/// Outcome of a refresh cycle, shared by every waiter.
pub type RefreshFuture = Shared<BoxFuture<'static, Option<String>>>;

/// Body of `POST {auth}/refresh`.
#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// The refresh-token exchange and its side effects.
#[derive(Clone)]
pub(crate) struct TokenExchange {
    pub(crate) http: reqwest::Client,
    pub(crate) refresh_url: String,
    pub(crate) store: Arc<dyn TokenStore>,
    pub(crate) events: AuthEvents,
}

impl TokenExchange {
    /// Run one cycle: `Some(token)` on success, `None` after forcing logout.
    async fn run(&self) -> Option<String> {
        match self.request_new_token().await {
            Ok(token) => {
                self.store.set(TokenKey::Access, &token);
                info!("access token refreshed");
                self.events.token_refreshed.emit(&token);
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, ending session");
                self.store.clear();
                self.events.force_logout.emit(&());
                None
            }
        }
    }

    async fn request_new_token(&self) -> Result<String, SdkError> {
        let refresh = self
            .store
            .get(TokenKey::Refresh)
            .ok_or_else(|| SdkError::Auth("no refresh token stored".into()))?;

        debug!(url = %self.refresh_url, "requesting new access token");
        let res = self
            .http
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await
            .map_err(|source| SdkError::Transport {
                method: reqwest::Method::POST,
                url: self.refresh_url.clone(),
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| SdkError::Transport {
            method: reqwest::Method::POST,
            url: self.refresh_url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(SdkError::Status {
                method: reqwest::Method::POST,
                url: self.refresh_url.clone(),
                status,
                body,
            });
        }

        // The endpoint answers with the bare token as the body text.
        let token = body.trim();
        if token.is_empty() {
            return Err(SdkError::Auth("refresh endpoint returned an empty token".into()));
        }
        Ok(token.to_string())
    }
}

struct GateInner {
    in_flight: Mutex<Option<RefreshFuture>>,
    exchange: TokenExchange,
}

/// Coordinates refresh cycles for one client and all its clones.
#[derive(Clone)]
pub(crate) struct RefreshGate {
    inner: Arc<GateInner>,
}

impl RefreshGate {
    pub(crate) fn new(exchange: TokenExchange) -> Self {
        Self {
            inner: Arc::new(GateInner {
                in_flight: Mutex::new(None),
                exchange,
            }),
        }
    }

    /// Join the running cycle, reuse a token that replaced `observed`, or
    /// start a new cycle.
    pub(crate) fn refresh(&self, observed: Option<&str>) -> RefreshFuture {
        let mut slot = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(in_flight) = slot.as_ref() {
            debug!("joining in-flight token refresh");
            return in_flight.clone();
        }

        if let Some(current) = self.inner.exchange.store.get(TokenKey::Access) {
            if observed != Some(current.as_str()) {
                debug!("access token already renewed, skipping refresh");
                return future::ready(Some(current)).boxed().shared();
            }
        }

        let gate = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(gate.exchange.run())
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    warn!("token refresh task panicked");
                    None
                });
            // The spawner holds the lock until this cycle's future is stored.
            *gate.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = None;
            outcome
        });

        let shared = task
            .map(|joined| joined.unwrap_or(None))
            .boxed()
            .shared();
        *slot = Some(shared.clone());
        shared
    }

    /// Whether a cycle is currently running.
    pub(crate) fn is_refreshing(&self) -> bool {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gate(store: &Arc<MemoryTokenStore>, events: &AuthEvents) -> RefreshGate {
        let store: Arc<dyn TokenStore> = Arc::clone(store) as Arc<dyn TokenStore>;
        RefreshGate::new(TokenExchange {
            http: reqwest::Client::new(),
            // Nothing listens on the discard port, so any exchange fails.
            refresh_url: "http://127.0.0.1:9/api/auth/refresh".into(),
            store,
            events: events.clone(),
        })
    }

    fn count(events: &AuthEvents) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let refreshed = Arc::new(AtomicUsize::new(0));
        let logouts = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&refreshed);
        events
            .token_refreshed
            .subscribe(move |_: &String| {
                r.fetch_add(1, Ordering::SeqCst);
            })
            .detach();
        let l = Arc::clone(&logouts);
        events
            .force_logout
            .subscribe(move |()| {
                l.fetch_add(1, Ordering::SeqCst);
            })
            .detach();
        (refreshed, logouts)
    }

    #[tokio::test]
    async fn token_renewed_since_observed_is_reused() {
        let store = Arc::new(MemoryTokenStore::new());
        store.set(TokenKey::Access, "renewed");
        store.set(TokenKey::Refresh, "refresh");
        let events = AuthEvents::new();
        let (refreshed, logouts) = count(&events);
        let gate = gate(&store, &events);

        let token = gate.refresh(Some("stale")).await;

        assert_eq!(token.as_deref(), Some("renewed"));
        assert!(!gate.is_refreshing());
        assert_eq!(refreshed.load(Ordering::SeqCst), 0);
        assert_eq!(logouts.load(Ordering::SeqCst), 0);
        assert_eq!(store.get(TokenKey::Refresh).as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn unchanged_token_starts_a_cycle() {
        let store = Arc::new(MemoryTokenStore::new());
        store.set(TokenKey::Access, "stale");
        store.set(TokenKey::Refresh, "refresh");
        let events = AuthEvents::new();
        let (refreshed, logouts) = count(&events);
        let gate = gate(&store, &events);

        assert_eq!(gate.refresh(Some("stale")).await, None);
        assert_eq!(refreshed.load(Ordering::SeqCst), 0);
        assert_eq!(logouts.load(Ordering::SeqCst), 1);
        assert!(store.get(TokenKey::Access).is_none());
    }
}
