//! Checked access to the cart capability.
//!
//! UI code receives a [`CartContext`] and asks it for the cart. A context
//! built without a cart answers with [`ContextError::MissingProvider`]
//! instead of a silently empty value.

use super::Cart;
use crate::error::ContextError;

/// Optional cart handed to UI consumers.
pub struct CartContext<A, S, N> {
    provider: Option<Cart<A, S, N>>,
}

impl<A, S, N> CartContext<A, S, N> {
    /// A context providing `cart`.
    #[must_use]
    pub const fn provide(cart: Cart<A, S, N>) -> Self {
        Self {
            provider: Some(cart),
        }
    }

    /// A context with no cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { provider: None }
    }

    /// The provided cart.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::MissingProvider` if no cart was provided.
    pub fn use_cart(&self) -> Result<&Cart<A, S, N>, ContextError> {
        self.provider.as_ref().ok_or(ContextError::MissingProvider)
    }
}

impl<A, S, N> Default for CartContext<A, S, N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<A, S, N> Clone for CartContext<A, S, N> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
        }
    }
}
