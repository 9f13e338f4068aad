//! The cart state container.

use std::sync::Arc;

use rocketshoes_core::{CartItem, ProductId, Stock};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::state;
use super::summary::CartSummary;
use crate::api::StoreApi;
use crate::error::{CartError, ErrorKind, Result};
use crate::notify::{Notifier, Toast};
use crate::storage::{CartPersistence, KeyValueStore};

/// Remote stock at or below this level refuses any increase.
pub const STOCK_RESERVE: i64 = 1;

/// Request to set a product's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Requested quantity; zero or negative requests are ignored.
    pub amount: i64,
}

/// Cart operation, used to pick the failure toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    Update,
}

impl CartOperation {
    /// Toast shown when this operation fails for a reason other than stock.
    #[must_use]
    pub const fn failure_toast(self) -> Toast {
        match self {
            Self::Add => Toast::AddFailed,
            Self::Remove => Toast::RemoveFailed,
            Self::Update => Toast::UpdateFailed,
        }
    }
}

/// Shopping cart backed by a stock/product service and local storage.
///
/// Cheap to clone; clones share state. Operations snapshot the cart when
/// called, so two overlapping operations can overwrite each other's result.
pub struct Cart<A, S, N> {
    inner: Arc<CartInner<A, S, N>>,
}

struct CartInner<A, S, N> {
    api: A,
    persistence: CartPersistence<S>,
    notifier: N,
    items: watch::Sender<Vec<CartItem>>,
}

impl<A, S, N> Clone for Cart<A, S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: StoreApi, S: KeyValueStore, N: Notifier> Cart<A, S, N> {
    /// Create a cart, loading any persisted lines.
    pub fn new(api: A, persistence: CartPersistence<S>, notifier: N) -> Self {
        let loaded = persistence.load();
        info!(key = %persistence.key(), lines = loaded.len(), "Cart loaded");

        let (items, _) = watch::channel(loaded);

        Self {
            inner: Arc::new(CartInner {
                api,
                persistence,
                notifier,
                items,
            }),
        }
    }

    /// Current cart lines, in insertion order.
    #[must_use]
    pub fn cart(&self) -> Vec<CartItem> {
        self.inner.items.borrow().clone()
    }

    /// Receiver notified after every successful mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.inner.items.subscribe()
    }

    /// Totals and per-product amounts for the current cart.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from_items(&self.inner.items.borrow())
    }

    /// Stock/product service the cart talks to.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// Add one unit of a product.
    ///
    /// Refused with the out-of-stock toast when remote stock is at or below
    /// [`STOCK_RESERVE`]. On success the remote stock is decremented by one.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) {
        if let Err(e) = self.try_add_product(product_id).await {
            self.report(CartOperation::Add, &e);
        }
    }

    /// Drop a product's line. Remote stock is left as is.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) {
        if let Err(e) = self.try_remove_product(product_id) {
            self.report(CartOperation::Remove, &e);
        }
    }

    /// Set a product's quantity.
    ///
    /// Ignored when the requested amount is not positive. An increase is
    /// refused with the out-of-stock toast when remote stock is at or below
    /// [`STOCK_RESERVE`]. On success the remote stock absorbs the difference.
    #[instrument(skip(self), fields(product_id = %request.product_id, amount = request.amount))]
    pub async fn update_product_amount(&self, request: UpdateProductAmount) {
        if let Err(e) = self.try_update_product_amount(request).await {
            self.report(CartOperation::Update, &e);
        }
    }

    async fn try_add_product(&self, product_id: ProductId) -> Result<()> {
        let snapshot = self.cart();

        let stock = self.inner.api.fetch_stock(product_id).await?;
        ensure_available(stock)?;

        let remaining = remaining_stock(stock, 1)?;

        let next = if state::find(&snapshot, product_id).is_some() {
            state::increment(&snapshot, product_id)?
        } else {
            let product = self.inner.api.fetch_product(product_id).await?;
            state::insert(&snapshot, product)?
        };

        self.commit(next)?;

        self.inner.api.update_stock(remaining).await?;

        Ok(())
    }

    fn try_remove_product(&self, product_id: ProductId) -> Result<()> {
        let next = state::remove(&self.cart(), product_id)?;
        self.commit(next)
    }

    async fn try_update_product_amount(&self, request: UpdateProductAmount) -> Result<()> {
        let UpdateProductAmount { product_id, amount } = request;

        if amount <= 0 {
            debug!("Ignoring non-positive amount");
            return Ok(());
        }

        let snapshot = self.cart();
        let current = state::find(&snapshot, product_id)
            .ok_or(CartError::NotInCart(product_id))?
            .amount;

        let stock = self.inner.api.fetch_stock(product_id).await?;

        let delta = amount - i64::from(current);
        if delta > 0 {
            ensure_available(stock)?;
        }

        let target = i64::from(current) + delta;
        let target = u32::try_from(target).map_err(|_| CartError::InvalidAmount {
            product_id,
            amount: target,
        })?;

        let remaining = remaining_stock(stock, delta)?;

        let next = state::set_amount(&snapshot, product_id, target)?;
        self.commit(next)?;

        self.inner.api.update_stock(remaining).await?;

        Ok(())
    }

    /// Persist `next`, then publish it.
    fn commit(&self, next: Vec<CartItem>) -> Result<()> {
        self.inner.persistence.save(&next)?;
        debug!(lines = next.len(), "Cart persisted");
        self.inner.items.send_replace(next);
        Ok(())
    }

    fn report(&self, operation: CartOperation, err: &CartError) {
        let toast = match err.kind() {
            ErrorKind::StockUnavailable => {
                warn!(?operation, error = %err, "Cart operation refused");
                Toast::OutOfStock
            }
            ErrorKind::OperationFailed => {
                let event_id = sentry::capture_error(err);
                error!(
                    ?operation,
                    error = %err,
                    sentry_event_id = %event_id,
                    "Cart operation failed"
                );
                operation.failure_toast()
            }
        };

        self.inner.notifier.notify(toast);
    }
}

fn ensure_available(stock: Stock) -> Result<()> {
    if stock.amount <= STOCK_RESERVE {
        return Err(CartError::StockUnavailable {
            product_id: stock.id,
            available: stock.amount,
        });
    }
    Ok(())
}

/// Remote stock after `delta` more units go into the cart.
fn remaining_stock(stock: Stock, delta: i64) -> Result<Stock> {
    stock
        .amount
        .checked_sub(delta)
        .map(|amount| Stock::new(stock.id, amount))
        .ok_or(CartError::StockOutOfRange {
            product_id: stock.id,
            available: stock.amount,
            delta,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::fake::{ApiCall, FakeStoreApi};
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;

    const KEY: &str = "@RocketShoes:cart";

    type TestCart = Cart<Arc<FakeStoreApi>, MemoryStore, RecordingNotifier>;

    struct Harness {
        api: Arc<FakeStoreApi>,
        store: MemoryStore,
        notifier: RecordingNotifier,
        cart: TestCart,
    }

    impl Harness {
        fn new(api: FakeStoreApi) -> Self {
            Self::with_store(api, MemoryStore::new())
        }

        fn with_store(api: FakeStoreApi, store: MemoryStore) -> Self {
            let api = Arc::new(api);
            let notifier = RecordingNotifier::new();
            let cart = Cart::new(
                Arc::clone(&api),
                CartPersistence::new(store.clone(), KEY),
                notifier.clone(),
            );
            Self {
                api,
                store,
                notifier,
                cart,
            }
        }

        fn amounts(&self) -> Vec<(i32, u32)> {
            self.cart
                .cart()
                .iter()
                .map(|i| (i.id().as_i32(), i.amount))
                .collect()
        }

        fn persisted(&self) -> Vec<CartItem> {
            CartPersistence::new(self.store.clone(), KEY).load()
        }
    }

    fn id(n: i32) -> ProductId {
        ProductId::new(n)
    }

    fn update(n: i32, amount: i64) -> UpdateProductAmount {
        UpdateProductAmount {
            product_id: id(n),
            amount,
        }
    }

    #[tokio::test]
    async fn test_add_new_product() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));

        h.cart.add_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.persisted(), h.cart.cart());
        assert_eq!(h.api.stock(1), Some(4));
        assert!(h.notifier.toasts().is_empty());
        assert_eq!(
            h.api.calls(),
            vec![
                ApiCall::FetchStock(id(1)),
                ApiCall::FetchProduct(id(1)),
                ApiCall::UpdateStock(Stock::new(id(1), 4)),
            ]
        );
    }

    #[tokio::test]
    async fn test_add_twice_increments_without_refetching_product() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));

        h.cart.add_product(id(1)).await;
        h.cart.add_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(1, 2)]);
        let product_fetches = h
            .api
            .calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::FetchProduct(_)))
            .count();
        assert_eq!(product_fetches, 1);
    }

    #[tokio::test]
    async fn test_add_with_stock_of_one_is_out_of_stock() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 1));

        h.cart.add_product(id(1)).await;

        assert!(h.cart.cart().is_empty());
        assert!(h.store.get_item(KEY).unwrap().is_none());
        assert_eq!(h.notifier.toasts(), vec![Toast::OutOfStock]);
        assert_eq!(h.api.calls(), vec![ApiCall::FetchStock(id(1))]);
    }

    #[tokio::test]
    async fn test_add_with_stock_of_two_succeeds() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 2));

        h.cart.add_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.api.stock(1), Some(1));
    }

    #[tokio::test]
    async fn test_add_unknown_product_reports_add_failure() {
        let h = Harness::new(FakeStoreApi::new());

        h.cart.add_product(id(7)).await;

        assert!(h.cart.cart().is_empty());
        assert_eq!(h.notifier.toasts(), vec![Toast::AddFailed]);
    }

    #[tokio::test]
    async fn test_add_stock_write_failure_keeps_local_change() {
        let api = FakeStoreApi::new().with_product(1, 5);
        api.fail_stock_updates();
        let h = Harness::new(api);

        h.cart.add_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.persisted().len(), 1);
        assert_eq!(h.notifier.toasts(), vec![Toast::AddFailed]);
        assert_eq!(h.api.stock(1), Some(5));
    }

    #[tokio::test]
    async fn test_remove_product() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5).with_product(2, 5));
        h.cart.add_product(id(1)).await;
        h.cart.add_product(id(2)).await;
        let calls_before = h.api.calls().len();

        h.cart.remove_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(2, 1)]);
        assert_eq!(h.persisted(), h.cart.cart());
        // Removal never restocks
        assert_eq!(h.api.calls().len(), calls_before);
        assert_eq!(h.api.stock(1), Some(4));
    }

    #[tokio::test]
    async fn test_remove_absent_reports_remove_failure() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));
        h.cart.add_product(id(1)).await;

        h.cart.remove_product(id(2)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.toasts(), vec![Toast::RemoveFailed]);
    }

    #[tokio::test]
    async fn test_update_non_positive_is_noop() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));
        h.cart.add_product(id(1)).await;
        let calls_before = h.api.calls().len();

        h.cart.update_product_amount(update(1, 0)).await;
        h.cart.update_product_amount(update(1, -3)).await;
        // Also a no-op for products not in the cart
        h.cart.update_product_amount(update(9, 0)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert!(h.notifier.toasts().is_empty());
        assert_eq!(h.api.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_update_absent_reports_update_failure() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));

        h.cart.update_product_amount(update(1, 2)).await;

        assert!(h.cart.cart().is_empty());
        assert_eq!(h.notifier.toasts(), vec![Toast::UpdateFailed]);
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_increase_sets_amount_and_consumes_stock() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 10));
        h.cart.add_product(id(1)).await; // stock 9

        h.cart.update_product_amount(update(1, 4)).await;

        assert_eq!(h.amounts(), vec![(1, 4)]);
        assert_eq!(h.api.stock(1), Some(6));
        assert_eq!(h.persisted(), h.cart.cart());
    }

    #[tokio::test]
    async fn test_update_increase_with_low_stock_is_out_of_stock() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));
        h.cart.add_product(id(1)).await;
        h.api.set_stock(1, 1);

        h.cart.update_product_amount(update(1, 3)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.toasts(), vec![Toast::OutOfStock]);
        assert_eq!(h.api.stock(1), Some(1));
    }

    #[tokio::test]
    async fn test_update_decrease_allowed_with_low_stock() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 10));
        h.cart.add_product(id(1)).await;
        h.cart.update_product_amount(update(1, 3)).await;
        h.api.set_stock(1, 0);

        h.cart.update_product_amount(update(1, 1)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert!(h.notifier.toasts().is_empty());
        // Stock absorbs the negative delta
        assert_eq!(h.api.stock(1), Some(2));
    }

    #[tokio::test]
    async fn test_update_decrease_with_huge_remote_stock_reports_failure() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));
        h.cart.add_product(id(1)).await;
        h.cart.update_product_amount(update(1, 3)).await;
        assert_eq!(h.amounts(), vec![(1, 3)]);

        h.api.set_stock(1, i64::MAX);
        h.cart.update_product_amount(update(1, 1)).await;

        assert_eq!(h.amounts(), vec![(1, 3)]);
        assert_eq!(h.persisted(), h.cart.cart());
        assert_eq!(h.notifier.toasts(), vec![Toast::UpdateFailed]);
        assert_eq!(h.api.stock(1), Some(i64::MAX));
    }

    #[tokio::test]
    async fn test_add_with_lowest_remote_stock_is_refused() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, i64::MIN));

        h.cart.add_product(id(1)).await;

        assert!(h.cart.cart().is_empty());
        assert_eq!(h.notifier.toasts(), vec![Toast::OutOfStock]);
    }

    #[test]
    fn test_remaining_stock_overflow() {
        let err = remaining_stock(Stock::new(id(1), i64::MAX), -1).unwrap_err();
        assert!(matches!(
            err,
            CartError::StockOutOfRange { available: i64::MAX, delta: -1, .. }
        ));
        assert_eq!(
            remaining_stock(Stock::new(id(1), 5), 2).unwrap(),
            Stock::new(id(1), 3)
        );
    }

    #[tokio::test]
    async fn test_update_stock_read_failure_reports_update_failure() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));
        h.cart.add_product(id(1)).await;
        h.api.fail_stock_reads();

        h.cart.update_product_amount(update(1, 2)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.toasts(), vec![Toast::UpdateFailed]);
    }

    #[tokio::test]
    async fn test_add_add_update_remove() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));

        h.cart.add_product(id(1)).await;
        assert_eq!(h.amounts(), vec![(1, 1)]);

        h.cart.add_product(id(1)).await;
        assert_eq!(h.amounts(), vec![(1, 2)]);

        h.api.set_stock(1, 5);
        h.cart.update_product_amount(update(1, 5)).await;
        assert_eq!(h.amounts(), vec![(1, 5)]);

        h.cart.remove_product(id(1)).await;
        assert!(h.cart.cart().is_empty());
        assert!(h.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_reload_reproduces_cart() {
        let store = MemoryStore::new();
        let h = Harness::with_store(
            FakeStoreApi::new().with_product(1, 9).with_product(2, 9).with_product(3, 9),
            store.clone(),
        );
        h.cart.add_product(id(3)).await;
        h.cart.add_product(id(1)).await;
        h.cart.add_product(id(3)).await;
        h.cart.add_product(id(2)).await;
        h.cart.update_product_amount(update(1, 4)).await;

        let reloaded = Harness::with_store(FakeStoreApi::new(), store);

        assert_eq!(reloaded.cart.cart(), h.cart.cart());
        assert_eq!(reloaded.amounts(), vec![(3, 2), (1, 4), (2, 1)]);
    }

    #[tokio::test]
    async fn test_subscribers_see_mutations() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));
        let mut rx = h.cart.subscribe();

        h.cart.add_product(id(1)).await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        h.cart.add_product(id(2)).await; // unknown product, no change
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let h = Harness::new(FakeStoreApi::new().with_product(1, 5));
        let other = h.cart.clone();

        other.add_product(id(1)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
    }
}
