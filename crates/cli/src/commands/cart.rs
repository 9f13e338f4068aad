//! Cart subcommands.

use rocketshoes_core::ProductId;
use rocketshoes_storefront::UpdateProductAmount;
use rocketshoes_storefront::state::StorefrontCart;
use tracing::info;

use crate::toast::ConsoleToast;

type CliCart = StorefrontCart<ConsoleToast>;

/// Print the cart lines, subtotals and total.
#[allow(clippy::print_stdout)]
pub fn show(cart: &CliCart) {
    let summary = cart.summary();

    if summary.is_empty() {
        println!("Carrinho vazio");
        return;
    }

    for line in &summary.lines {
        println!(
            "{:>4}  {:<40} {:>3} x {:>12} = {:>12}",
            line.product_id,
            line.title,
            line.amount,
            line.unit_price.display(),
            line.subtotal.display(),
        );
    }
    println!("{} produto(s)  TOTAL {}", summary.size(), summary.total);
}

pub async fn add(cart: &CliCart, product_id: ProductId) {
    cart.add_product(product_id).await;
    info!(%product_id, amount = cart.summary().amount_of(product_id), "Cart updated");
}

pub async fn remove(cart: &CliCart, product_id: ProductId) {
    cart.remove_product(product_id).await;
    info!(%product_id, lines = cart.summary().size(), "Cart updated");
}

pub async fn update(cart: &CliCart, product_id: ProductId, amount: i64) {
    cart.update_product_amount(UpdateProductAmount { product_id, amount })
        .await;
    info!(%product_id, amount = cart.summary().amount_of(product_id), "Cart updated");
}
