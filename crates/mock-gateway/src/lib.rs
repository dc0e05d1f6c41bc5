//! # MedMarket mock gateway
//!
//! An in-memory stand-in for the MedMarket backend: login, refresh and a
//! bearer-protected slice of the product and user services. Used for local
//! development of the client and in its end-to-end tests.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod tokens;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use routes::router;
pub use state::AppState;
pub use tokens::{TokenIssuer, TokenKind};
