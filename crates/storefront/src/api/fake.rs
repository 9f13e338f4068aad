//! In-memory [`StoreApi`] for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use rocketshoes_core::{Product, ProductId, Stock};
use rust_decimal::Decimal;

use super::{ApiError, StoreApi};

/// A request the fake received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchStock(ProductId),
    FetchProduct(ProductId),
    FetchProducts,
    UpdateStock(Stock),
}

#[derive(Default)]
struct FakeState {
    stock: HashMap<ProductId, i64>,
    products: HashMap<ProductId, Product>,
    calls: Vec<ApiCall>,
    fail_stock_reads: bool,
    fail_stock_updates: bool,
}

/// Stock and products held in maps, with a call log and failure switches.
#[derive(Default)]
pub struct FakeStoreApi {
    state: Mutex<FakeState>,
}

impl FakeStoreApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product named after its id with the given stock level.
    pub fn with_product(self, id: i32, stock: i64) -> Self {
        let id = ProductId::new(id);
        {
            let mut state = self.state.lock().unwrap();
            state.stock.insert(id, stock);
            state.products.insert(
                id,
                Product::new(id, format!("Tênis {id}"), Decimal::new(1799, 1)),
            );
        }
        self
    }

    pub fn set_stock(&self, id: i32, amount: i64) {
        self.state
            .lock()
            .unwrap()
            .stock
            .insert(ProductId::new(id), amount);
    }

    pub fn stock(&self, id: i32) -> Option<i64> {
        self.state
            .lock()
            .unwrap()
            .stock
            .get(&ProductId::new(id))
            .copied()
    }

    pub fn fail_stock_reads(&self) {
        self.state.lock().unwrap().fail_stock_reads = true;
    }

    pub fn fail_stock_updates(&self) {
        self.state.lock().unwrap().fail_stock_updates = true;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

impl StoreApi for FakeStoreApi {
    async fn fetch_stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::FetchStock(id));
        if state.fail_stock_reads {
            return Err(unavailable());
        }
        state
            .stock
            .get(&id)
            .map(|amount| Stock::new(id, *amount))
            .ok_or_else(|| ApiError::NotFound(format!("stock/{id}")))
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::FetchProduct(id));
        state
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("products/{id}")))
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::FetchProducts);
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn update_stock(&self, stock: Stock) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::UpdateStock(stock));
        if state.fail_stock_updates {
            return Err(unavailable());
        }
        state.stock.insert(stock.id, stock.amount);
        Ok(())
    }
}
