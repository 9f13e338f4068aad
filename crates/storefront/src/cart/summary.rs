//! Read-only views derived from the cart lines.

use std::collections::BTreeMap;

use rocketshoes_core::{CartItem, Price, ProductId};

/// One formatted cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub amount: u32,
    pub unit_price: Price,
    pub subtotal: Price,
}

impl From<&CartItem> for CartLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.id(),
            title: item.product.title.clone(),
            image: item.product.image.clone(),
            amount: item.amount,
            unit_price: item.product.unit_price(),
            subtotal: item.subtotal(),
        }
    }
}

/// Cart totals, as the cart page and header show them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub total: Price,
}

impl CartSummary {
    /// Summarize `items`, keeping their order.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        let lines: Vec<CartLine> = items.iter().map(CartLine::from).collect();
        let total = lines.iter().map(|line| line.subtotal).sum();
        Self { lines, total }
    }

    /// Number of distinct products (the header badge).
    #[must_use]
    pub fn size(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Amount held per product, for badges on the product grid.
    #[must_use]
    pub fn amounts(&self) -> BTreeMap<ProductId, u32> {
        self.lines
            .iter()
            .map(|line| (line.product_id, line.amount))
            .collect()
    }

    /// Amount held for `id`, 0 when absent.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == id)
            .map_or(0, |line| line.amount)
    }
}

#[cfg(test)]
mod tests {
    use rocketshoes_core::Product;
    use rust_decimal::Decimal;

    use super::*;

    fn item(id: i32, price: Decimal, amount: u32) -> CartItem {
        CartItem::new(Product::new(ProductId::new(id), format!("Tênis {id}"), price), amount)
    }

    #[test]
    fn test_empty() {
        let summary = CartSummary::from_items(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.size(), 0);
        assert_eq!(summary.total.display(), "R$ 0,00");
    }

    #[test]
    fn test_totals() {
        let summary = CartSummary::from_items(&[
            item(1, Decimal::new(1799, 1), 2),
            item(2, Decimal::new(1399, 1), 1),
        ]);

        assert_eq!(summary.size(), 2);
        assert_eq!(summary.lines[0].subtotal.display(), "R$ 359,80");
        assert_eq!(summary.lines[1].unit_price.display(), "R$ 139,90");
        assert_eq!(summary.total.display(), "R$ 499,70");
    }

    #[test]
    fn test_amounts() {
        let summary = CartSummary::from_items(&[
            item(3, Decimal::ONE, 4),
            item(1, Decimal::ONE, 2),
        ]);

        let amounts = summary.amounts();
        assert_eq!(amounts.get(&ProductId::new(3)), Some(&4));
        assert_eq!(amounts.get(&ProductId::new(1)), Some(&2));
        assert_eq!(summary.amount_of(ProductId::new(1)), 2);
        assert_eq!(summary.amount_of(ProductId::new(9)), 0);
    }
}
