//! A throwaway gateway for client tests.
//!
//! Serves `POST /api/auth/refresh` and a bearer-protected
//! `GET /api/protected`, counting calls so tests can assert how often the
//! client reached each endpoint.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use medmarket_sdk::{ApiClient, AuthEvents, ClientConfig, CredentialPair, ErrorEvent, MemoryTokenStore};
use serde_json::{json, Value};

/// How the refresh endpoint answers.
#[derive(Debug, Clone)]
pub enum RefreshReply {
    Token(String),
    Fail(StatusCode),
}

pub struct GatewayState {
    pub refresh_calls: AtomicUsize,
    pub protected_calls: AtomicUsize,
    /// Bearer token `/api/protected` accepts.
    pub accepted: Mutex<String>,
    pub refresh_reply: Mutex<RefreshReply>,
    pub refresh_delay: Mutex<Duration>,
    /// Refresh tokens presented to `/api/auth/refresh`.
    pub refresh_bodies: Mutex<Vec<Value>>,
    /// `Authorization` headers seen by `/api/protected`.
    pub seen_auth: Mutex<Vec<Option<String>>>,
}

impl GatewayState {
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn protected_count(&self) -> usize {
        self.protected_calls.load(Ordering::SeqCst)
    }

    pub fn seen_auth(&self) -> Vec<Option<String>> {
        self.seen_auth.lock().unwrap().clone()
    }
}

pub struct Gateway {
    pub state: Arc<GatewayState>,
    pub api_url: String,
}

impl Gateway {
    /// Start a gateway that accepts `accepted` and refreshes to `reply`.
    pub async fn start(accepted: &str, reply: RefreshReply) -> Self {
        let state = Arc::new(GatewayState {
            refresh_calls: AtomicUsize::new(0),
            protected_calls: AtomicUsize::new(0),
            accepted: Mutex::new(accepted.to_string()),
            refresh_reply: Mutex::new(reply),
            refresh_delay: Mutex::new(Duration::ZERO),
            refresh_bodies: Mutex::new(Vec::new()),
            seen_auth: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/auth/refresh", post(refresh))
            .route("/api/protected", get(protected))
            .route("/api/missing", get(missing))
            .route("/api/flaky", get(flaky))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            api_url: format!("http://{addr}/api"),
        }
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.state.refresh_delay.lock().unwrap() = delay;
    }

    /// A client over a fresh memory store holding `credentials`.
    pub fn client(&self, credentials: Option<CredentialPair>) -> ApiClient {
        let store = match credentials {
            Some(pair) => MemoryTokenStore::with_credentials(&pair),
            None => MemoryTokenStore::new(),
        };
        ApiClient::new(
            ClientConfig::new(&self.api_url),
            Arc::new(store),
            AuthEvents::new(),
        )
        .unwrap()
    }
}

async fn refresh(State(state): State<Arc<GatewayState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    state.refresh_bodies.lock().unwrap().push(body);

    let delay = *state.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = state.refresh_reply.lock().unwrap().clone();
    match reply {
        RefreshReply::Token(token) => token.into_response(),
        RefreshReply::Fail(status) => {
            (status, Json(json!({"message": "refresh token expired"}))).into_response()
        }
    }
}

async fn protected(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    state.protected_calls.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state.seen_auth.lock().unwrap().push(auth.clone());

    let expected = format!("Bearer {}", state.accepted.lock().unwrap());
    if auth.as_deref() == Some(expected.as_str()) {
        Json(json!({"ok": true})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "token expired"})),
        )
            .into_response()
    }
}

async fn missing() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"errors": {"id": "Product not found"}})),
    )
        .into_response()
}

async fn flaky() -> Response {
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

/// Unsigned JWT-shaped token with the given claims.
pub fn jwt(claims: &Value) -> String {
    format!(
        "{}.{}.unsigned",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

/// Token for `sub` expiring `secs` from now.
pub fn jwt_expiring_in(sub: &str, secs: i64) -> String {
    jwt(&json!({"sub": sub, "exp": chrono::Utc::now().timestamp() + secs}))
}

/// Collects every event published on a channel.
pub fn record_errors(client: &ApiClient) -> Arc<Mutex<Vec<ErrorEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    client
        .events()
        .errors
        .subscribe(move |e: &ErrorEvent| sink.lock().unwrap().push(e.clone()))
        .detach();
    seen
}

/// Counts forced-logout signals.
pub fn count_logouts(client: &ApiClient) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    client
        .events()
        .force_logout
        .subscribe(move |()| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .detach();
    count
}
