//! Pure cart transitions.
//!
//! Each function takes the current lines and returns the next lines without
//! touching storage or the network. Order is insertion order; a product id
//! appears at most once; every amount is at least 1.

use rocketshoes_core::{CartItem, Product, ProductId};

use crate::error::{CartError, Result};

/// The line for `id`, if any.
#[must_use]
pub fn find(items: &[CartItem], id: ProductId) -> Option<&CartItem> {
    items.iter().find(|item| item.id() == id)
}

/// Add one unit of a product already in the cart.
///
/// # Errors
///
/// `NotInCart` if there is no line for `id`, `InvalidAmount` on overflow.
pub fn increment(items: &[CartItem], id: ProductId) -> Result<Vec<CartItem>> {
    let current = find(items, id).ok_or(CartError::NotInCart(id))?.amount;
    let next = current
        .checked_add(1)
        .ok_or_else(|| CartError::InvalidAmount {
            product_id: id,
            amount: i64::from(current) + 1,
        })?;
    set_amount(items, id, next)
}

/// Append `product` with amount 1.
///
/// A product that already has a line is incremented instead, keeping ids
/// unique.
///
/// # Errors
///
/// `InvalidAmount` if incrementing an existing line overflows.
pub fn insert(items: &[CartItem], product: Product) -> Result<Vec<CartItem>> {
    if find(items, product.id).is_some() {
        return increment(items, product.id);
    }

    let mut next = items.to_vec();
    next.push(CartItem::new(product, 1));
    Ok(next)
}

/// Drop the line for `id`.
///
/// # Errors
///
/// `NotInCart` if there is no line for `id`.
pub fn remove(items: &[CartItem], id: ProductId) -> Result<Vec<CartItem>> {
    if find(items, id).is_none() {
        return Err(CartError::NotInCart(id));
    }

    Ok(items.iter().filter(|item| item.id() != id).cloned().collect())
}

/// Set the amount of the line for `id`, keeping its position.
///
/// # Errors
///
/// `NotInCart` if there is no line for `id`, `InvalidAmount` if `amount` is 0.
pub fn set_amount(items: &[CartItem], id: ProductId, amount: u32) -> Result<Vec<CartItem>> {
    if amount == 0 {
        return Err(CartError::InvalidAmount {
            product_id: id,
            amount: 0,
        });
    }
    if find(items, id).is_none() {
        return Err(CartError::NotInCart(id));
    }

    Ok(items
        .iter()
        .map(|item| {
            if item.id() == id {
                CartItem::new(item.product.clone(), amount)
            } else {
                item.clone()
            }
        })
        .collect())
}
