//! Client for the remote stock/product service.
//!
//! # Architecture
//!
//! - [`StoreApi`] is the seam the cart depends on; the cart never talks HTTP itself
//! - [`HttpStoreApi`] speaks the service's REST API with `reqwest`
//! - Product details are cached in memory via `moka`; stock is always read live
//!
//! # Endpoints
//!
//! - `GET stock/{id}` → `{ "id", "amount" }`
//! - `GET products/{id}` → product fields
//! - `GET products` → product array
//! - `PUT stock/{id}` with `{ "id", "amount" }`, response body ignored
//!
//! Every call is a single attempt: no retry, no timeout policy.

mod cache;
mod client;
#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;
use std::sync::Arc;

use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

pub use client::HttpStoreApi;

/// Errors that can occur when talking to the stock/product service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Operations the cart needs from the stock/product service.
pub trait StoreApi: Send + Sync {
    /// Current remote stock for a product.
    fn fetch_stock(&self, id: ProductId) -> impl Future<Output = Result<Stock, ApiError>> + Send;

    /// Product details.
    fn fetch_product(&self, id: ProductId)
    -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Full catalog listing.
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Overwrite the remote stock record for `stock.id`.
    fn update_stock(&self, stock: Stock) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl<T: StoreApi> StoreApi for Arc<T> {
    fn fetch_stock(&self, id: ProductId) -> impl Future<Output = Result<Stock, ApiError>> + Send {
        (**self).fetch_stock(id)
    }

    fn fetch_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send {
        (**self).fetch_product(id)
    }

    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send {
        (**self).fetch_products()
    }

    fn update_stock(&self, stock: Stock) -> impl Future<Output = Result<(), ApiError>> + Send {
        (**self).update_stock(stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("products/9".to_string());
        assert_eq!(err.to_string(), "Not found: products/9");

        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");
    }
}
