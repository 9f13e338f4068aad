//! Application wiring: builds the production cart from configuration.

use std::sync::Arc;

use crate::api::HttpStoreApi;
use crate::cart::{Cart, CartContext};
use crate::config::CartConfig;
use crate::notify::Notifier;
use crate::storage::{CartPersistence, FileStore};

/// Cart backed by the REST service and the file store.
pub type StorefrontCart<N> = Cart<HttpStoreApi, FileStore, N>;

/// Application state shared across UI components.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the cart context.
pub struct AppState<N> {
    inner: Arc<AppStateInner<N>>,
}

struct AppStateInner<N> {
    config: CartConfig,
    cart: CartContext<HttpStoreApi, FileStore, N>,
}

impl<N> Clone for AppState<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: Notifier> AppState<N> {
    /// Create application state, loading the persisted cart.
    ///
    /// # Arguments
    ///
    /// * `config` - Cart configuration
    /// * `notifier` - Where cart toasts are shown
    #[must_use]
    pub fn new(config: CartConfig, notifier: N) -> Self {
        let api = HttpStoreApi::new(&config);
        let persistence =
            CartPersistence::new(FileStore::new(config.storage_dir.clone()), config.cart_key.clone());
        let cart = Cart::new(api, persistence, notifier);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                cart: CartContext::provide(cart),
            }),
        }
    }

    /// Get a reference to the cart configuration.
    #[must_use]
    pub fn config(&self) -> &CartConfig {
        &self.inner.config
    }

    /// Get a reference to the cart context.
    #[must_use]
    pub fn cart_context(&self) -> &CartContext<HttpStoreApi, FileStore, N> {
        &self.inner.cart
    }
}
