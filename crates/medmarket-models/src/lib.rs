#![deny(missing_docs)]

//! # MedMarket Models
//!
//! Wire types exchanged between the MedMarket client and the backend
//! gateway.
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`credentials`] | `CredentialPair` and the `TokenKey` storage keys |
//! | [`event`] | `ErrorEvent` published on the client error channel |
//! | [`catalog`] | Companies, categories, products and their DTOs |
//! | [`cart`] | Shopping cart and `AddToCart` |
//! | [`order`] | Orders, order status and receipts |
//! | [`users`] | Company staff, registration and password changes |
//! | [`stats`] | Seller sales statistics computed from orders |
//! | [`page`] | The paginated `Page<T>` envelope |

pub mod cart;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod event;
pub mod order;
pub mod page;
pub mod stats;
pub mod users;

// Re-export all public types at crate root for convenience.
pub use cart::*;
pub use catalog::*;
pub use credentials::*;
pub use error::*;
pub use event::*;
pub use order::*;
pub use page::*;
pub use stats::*;
pub use users::*;
