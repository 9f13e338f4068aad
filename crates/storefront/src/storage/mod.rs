//! Local durable key-value storage and the cart persistence step.
//!
//! [`KeyValueStore`] models a browser-style local storage slot: string keys,
//! string values, whole-value overwrites. [`CartPersistence`] reads and
//! writes the cart as one JSON array under a single key.

mod file;
mod memory;

use rocketshoes_core::CartItem;
use thiserror::Error;
use tracing::{debug, warn};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors that can occur reading or writing local storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized.
    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A previous writer panicked while holding the store.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// A durable string key-value slot.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Reads and writes the cart under one storage key.
#[derive(Debug, Clone)]
pub struct CartPersistence<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> CartPersistence<S> {
    /// Persist the cart in `store` under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Storage key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Load the persisted cart.
    ///
    /// An absent, unreadable or unparseable value yields an empty cart.
    /// Lines with a zero amount are dropped and repeated ids are merged into
    /// the first line for that id.
    #[must_use]
    pub fn load(&self) -> Vec<CartItem> {
        let raw = match self.store.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No persisted cart, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read persisted cart, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CartItem>>(&raw) {
            Ok(items) => {
                let loaded = items.len();
                let items = normalize(items);
                if items.len() != loaded {
                    warn!(
                        key = %self.key,
                        loaded,
                        kept = items.len(),
                        "Persisted cart had empty or repeated lines"
                    );
                }
                items
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Persisted cart is not valid JSON, starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the persisted cart with `items`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn save(&self, items: &[CartItem]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items)?;
        self.store.set_item(&self.key, &json)
    }
}

/// Drop zero-amount lines and fold repeated ids into their first line.
fn normalize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut kept: Vec<CartItem> = Vec::with_capacity(items.len());

    for item in items.into_iter().filter(|item| item.amount > 0) {
        match kept.iter_mut().find(|line| line.id() == item.id()) {
            Some(line) => line.amount = line.amount.saturating_add(item.amount),
            None => kept.push(item),
        }
    }

    kept
}
