//! Catalog and cart entities.
//!
//! These mirror the JSON the stock/product service speaks. A [`CartItem`]
//! serializes flat: the product's fields with an `amount` alongside, which is
//! also the shape persisted in local storage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// A product as returned by `GET products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price, a plain JSON number on the wire.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Any further display fields the service sends, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Create a product with no extra display fields.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: None,
            extra: Map::new(),
        }
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Unit price in the storefront currency.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::brl(self.price)
    }
}

/// Remote stock level as returned by `GET stock/{id}`.
///
/// `amount` is signed: the service stores whatever the last write put there,
/// and cart writes can push it below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Product identifier.
    pub id: ProductId,
    /// Units available.
    pub amount: i64,
}

impl Stock {
    /// Create a stock record.
    #[must_use]
    pub const fn new(id: ProductId, amount: i64) -> Self {
        Self { id, amount }
    }
}

/// One cart line: a product and the quantity held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    /// Quantity in the cart, always at least 1.
    pub amount: u32,
}

impl CartItem {
    /// Create a cart line.
    #[must_use]
    pub const fn new(product: Product, amount: u32) -> Self {
        Self { product, amount }
    }

    /// Product identifier of this line.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// `price × amount` for this line.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.unit_price().times(self.amount)
    }
}
