//! Shopping cart: pure transitions, the stateful container, and the
//! capability context UI code obtains it through.

mod container;
mod context;
pub mod state;
mod summary;

pub use container::{Cart, CartOperation, STOCK_RESERVE, UpdateProductAmount};
pub use context::CartContext;
pub use summary::{CartLine, CartSummary};
