//! Cart error handling.
//!
//! Every failure inside a cart operation becomes a [`CartError`]. At the
//! operation boundary the error's [`ErrorKind`] decides which toast the
//! shopper sees; nothing is returned to the caller.

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// How an error surfaces to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Remote stock cannot cover the increase; shown as the out-of-stock toast.
    StockUnavailable,
    /// Anything else; shown as the operation's generic failure toast.
    OperationFailed,
}

/// Error raised inside a cart operation.
#[derive(Debug, Error)]
pub enum CartError {
    /// Remote stock is at or below the reserve threshold.
    #[error("Insufficient stock for product {product_id}: {available} available")]
    StockUnavailable {
        product_id: ProductId,
        available: i64,
    },

    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Resulting quantity would not be a positive integer.
    #[error("Invalid amount {amount} for product {product_id}")]
    InvalidAmount { product_id: ProductId, amount: i64 },

    /// Remote stock cannot absorb the quantity change without overflowing.
    #[error("Stock {available} for product {product_id} cannot absorb a change of {delta}")]
    StockOutOfRange {
        product_id: ProductId,
        available: i64,
        delta: i64,
    },

    /// Stock/product service call failed.
    #[error("Store API error: {0}")]
    Api(#[from] ApiError),

    /// Persisting the cart failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// Classify the error for reporting.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::StockUnavailable { .. } => ErrorKind::StockUnavailable,
            Self::NotInCart(_)
            | Self::InvalidAmount { .. }
            | Self::StockOutOfRange { .. }
            | Self::Api(_)
            | Self::Storage(_) => ErrorKind::OperationFailed,
        }
    }
}

/// Error obtaining the cart capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// No cart was provided to this context.
    #[error("cart requested outside of a cart provider")]
    MissingProvider,
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
