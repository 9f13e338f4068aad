//! Catalog listing.

use rocketshoes_storefront::api::{ApiError, StoreApi};
use rocketshoes_storefront::state::StorefrontCart;

use crate::toast::ConsoleToast;

/// Print every product with the amount already in the cart.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn list(cart: &StorefrontCart<ConsoleToast>) -> Result<(), ApiError> {
    let products = cart.api().fetch_products().await?;
    let summary = cart.summary();

    for product in &products {
        println!(
            "{:>4}  {:<40} {:>12}  [{} no carrinho]",
            product.id,
            product.title,
            product.unit_price().display(),
            summary.amount_of(product.id),
        );
    }
    Ok(())
}
