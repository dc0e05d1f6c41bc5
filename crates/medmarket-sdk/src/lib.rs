//! # MedMarket SDK
//!
//! Authenticated client for the **MedMarket** B2B marketplace gateway.
//!
//! The SDK provides:
//!
//! * [`ApiClient`]: sends requests with the stored bearer token,
//!   refreshing it before expiry or after a 401, one refresh at a time.
//! * [`TokenStore`]: where credentials live ([`FileTokenStore`],
//!   [`MemoryTokenStore`]).
//! * [`AuthEvents`]: error, forced-logout and token-refreshed channels.
//! * [`Session`]: decoded view of the signed-in user.
//! * [`services`]: typed product, category, cart, order, company and user
//!   calls.
//! * [`SdkError`]: unified error type for all SDK operations.
//!
//! Wire types from [`medmarket_models`] are re-exported for convenience.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use medmarket_sdk::{ApiClient, AuthEvents, ClientConfig, MemoryTokenStore, Session};
//!
//! # async fn run() -> Result<(), medmarket_sdk::SdkError> {
//! let events = AuthEvents::new();
//! events
//!     .errors
//!     .subscribe(|e| eprintln!("request failed: {}", e.message))
//!     .detach();
//!
//! let client = ApiClient::new(
//!     ClientConfig::from_env(),
//!     Arc::new(MemoryTokenStore::new()),
//!     events,
//! )?;
//! let session = Session::new(client.clone());
//! session.login_with_password("buyer@clinic.org", "secret").await?;
//!
//! let cart = client.cart().get().await?;
//! println!("{} item(s) in cart", cart.items.len());
//! # Ok(())
//! # }
//! ```

pub mod claims;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod refresh;
pub mod request;
pub mod services;
pub mod session;
pub mod store;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::SdkError;
pub use events::{AuthEvents, Channel, Subscription};
pub use request::{ApiRequest, ApiResponse};
pub use session::{Session, SessionClaims};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

// Re-export wire types for ergonomic usage.
pub use medmarket_models::{CredentialPair, ErrorEvent, TokenKey};

// Method type accepted by `ApiRequest::new`.
pub use reqwest::Method;
