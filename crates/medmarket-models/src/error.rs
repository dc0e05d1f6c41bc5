//! Error types for the `medmarket-models` crate.

/// Errors produced when constructing or parsing model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// An order status string did not name a known status.
    #[error("unknown order status \"{value}\"")]
    UnknownOrderStatus {
        /// The value that failed to parse.
        value: String,
    },

    /// A cart quantity was zero.
    #[error("invalid quantity {value}: must be at least 1")]
    InvalidQuantity {
        /// The rejected quantity.
        value: u32,
    },

    /// A new password and its repetition differ.
    #[error("passwords do not match")]
    PasswordMismatch,
}
