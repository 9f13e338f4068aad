//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! Each test starts its own [`FakeStoreService`], an in-process HTTP server
//! speaking the stock/product REST API on an ephemeral port, and keeps the
//! cart in a throwaway [`FileStore`] directory. Nothing external is needed.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rocketshoes_core::{Product, ProductId, Stock};
use rocketshoes_storefront::api::HttpStoreApi;
use rocketshoes_storefront::storage::{CartPersistence, FileStore};
use rocketshoes_storefront::{Cart, RecordingNotifier};
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

/// Storage key used by every test cart.
pub const CART_KEY: &str = "@RocketShoes:cart";

/// Cart wired to the fake service and a file store.
pub type TestCart = Cart<HttpStoreApi, FileStore, RecordingNotifier>;

// =============================================================================
// Fake service
// =============================================================================

#[derive(Default)]
struct ServiceState {
    stock: HashMap<ProductId, i64>,
    products: Vec<Product>,
    requests: Vec<String>,
    fail_stock_updates: bool,
}

type Shared = Arc<Mutex<ServiceState>>;

/// In-process stand-in for the stock/product REST service.
pub struct FakeStoreService {
    addr: SocketAddr,
    state: Shared,
}

impl FakeStoreService {
    /// Bind to `127.0.0.1:0` and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Shared::default();

        let app = Router::new()
            .route("/stock/{id}", get(get_stock).put(put_stock))
            .route("/products", get(list_products))
            .route("/products/{id}", get(get_product))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake store service");
        let addr = listener
            .local_addr()
            .expect("Failed to read fake store service address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Register a product with its remote stock.
    pub fn with_product(self, id: i32, title: &str, price: Decimal, stock: i64) -> Self {
        let id = ProductId::new(id);
        {
            let mut state = self.lock();
            state.products.push(
                Product::new(id, title, price)
                    .with_image(format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/tenis{id}.jpg")),
            );
            state.stock.insert(id, stock);
        }
        self
    }

    /// Base URL for [`HttpStoreApi`], ending in `/`.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("Invalid fake service URL")
    }

    /// Current remote stock for `id`.
    #[must_use]
    pub fn stock(&self, id: i32) -> Option<i64> {
        self.lock().stock.get(&ProductId::new(id)).copied()
    }

    /// Overwrite the remote stock for `id`.
    pub fn set_stock(&self, id: i32, amount: i64) {
        self.lock().stock.insert(ProductId::new(id), amount);
    }

    /// Make every `PUT stock/{id}` answer 500.
    pub fn fail_stock_updates(&self) {
        self.lock().fail_stock_updates = true;
    }

    /// Requests received so far, as `"METHOD path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// How many requests matched `"METHOD path"` exactly.
    #[must_use]
    pub fn count(&self, request: &str) -> usize {
        self.lock().requests.iter().filter(|r| *r == request).count()
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        lock(&self.state)
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, ServiceState> {
    state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

async fn get_stock(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Result<Json<Stock>, StatusCode> {
    let mut state = lock(&state);
    state.requests.push(format!("GET stock/{id}"));
    let id = ProductId::new(id);
    state
        .stock
        .get(&id)
        .map(|amount| Json(Stock::new(id, *amount)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn put_stock(
    State(state): State<Shared>,
    Path(id): Path<i32>,
    Json(stock): Json<Stock>,
) -> Result<Json<Stock>, StatusCode> {
    let mut state = lock(&state);
    state.requests.push(format!("PUT stock/{id}"));
    if state.fail_stock_updates {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let id = ProductId::new(id);
    if !state.stock.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    state.stock.insert(id, stock.amount);
    Ok(Json(Stock::new(id, stock.amount)))
}

async fn get_product(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Result<Json<Product>, StatusCode> {
    let mut state = lock(&state);
    state.requests.push(format!("GET products/{id}"));
    let id = ProductId::new(id);
    state
        .products
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn list_products(State(state): State<Shared>) -> Json<Vec<Product>> {
    let mut state = lock(&state);
    state.requests.push("GET products".to_string());
    Json(state.products.clone())
}

// =============================================================================
// Cart helpers
// =============================================================================

/// A unique, not yet created directory under the system temp dir.
#[must_use]
pub fn temp_storage_dir() -> PathBuf {
    std::env::temp_dir().join(format!("rocketshoes-it-{}", Uuid::new_v4()))
}

/// Client for `service` with the given product cache TTL.
#[must_use]
pub fn api(service: &FakeStoreService, cache_ttl: Option<Duration>) -> HttpStoreApi {
    HttpStoreApi::with_client(reqwest::Client::new(), service.base_url(), cache_ttl)
}

/// Build a cart against `service`, loading whatever `dir` already holds.
#[must_use]
pub fn cart(api: HttpStoreApi, dir: &std::path::Path, notifier: RecordingNotifier) -> TestCart {
    let persistence = CartPersistence::new(FileStore::new(dir), CART_KEY);
    Cart::new(api, persistence, notifier)
}

/// `(id, amount)` pairs of the current cart, in order.
#[must_use]
pub fn amounts(cart: &TestCart) -> Vec<(i32, u32)> {
    cart.cart()
        .iter()
        .map(|item| (item.id().as_i32(), item.amount))
        .collect()
}
