//! User-facing toast notifications.
//!
//! Cart operations never hand errors back to the UI; they raise a [`Toast`]
//! through a [`Notifier`] instead.

use std::sync::{Arc, Mutex};

use tracing::warn;

/// A transient error message shown to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toast {
    /// Requested quantity exceeds what the remote stock allows.
    OutOfStock,
    /// Adding a product failed.
    AddFailed,
    /// Removing a product failed.
    RemoveFailed,
    /// Changing a product quantity failed.
    UpdateFailed,
}

impl Toast {
    /// Text shown to the shopper.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::OutOfStock => "Quantidade solicitada fora de estoque",
            Self::AddFailed => "Erro na adição do produto",
            Self::RemoveFailed => "Erro na remoção do produto",
            Self::UpdateFailed => "Erro na alteração de quantidade do produto",
        }
    }
}

impl std::fmt::Display for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Displays toasts to the shopper.
pub trait Notifier: Send + Sync {
    /// Show `toast`.
    fn notify(&self, toast: Toast);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, toast: Toast) {
        (**self).notify(toast);
    }
}

/// Emits each toast as a `warn` tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        warn!(toast = ?toast, message = toast.message(), "Toast");
    }
}

/// Keeps every toast it receives; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toasts received so far, oldest first.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .map(|toasts| toasts.clone())
            .unwrap_or_default()
    }

    /// Most recent toast.
    #[must_use]
    pub fn last(&self) -> Option<Toast> {
        self.toasts().last().copied()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(toast);
        }
    }
}
