//! Toasts rendered on the terminal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rocketshoes_storefront::{Notifier, Toast};

/// Prints toasts to stderr and remembers that one was shown.
#[derive(Debug, Clone, Default)]
pub struct ConsoleToast {
    raised: Arc<AtomicBool>,
}

impl ConsoleToast {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any toast has been shown.
    #[must_use]
    pub fn raised(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }
}

impl Notifier for ConsoleToast {
    #[allow(clippy::print_stderr)]
    fn notify(&self, toast: Toast) {
        self.raised.store(true, Ordering::Relaxed);
        eprintln!("✖ {}", toast.message());
    }
}
