//! RocketShoes storefront cart library.
//!
//! Client-side cart state for the storefront: add, remove and re-quantify
//! products against a remote stock/product service, with the cart kept in a
//! local durable key-value slot.
//!
//! # Architecture
//!
//! - [`cart`] - Pure transitions, the [`Cart`] container and its context
//! - [`api`] - The stock/product service seam and its REST client
//! - [`storage`] - Local key-value stores and cart persistence
//! - [`notify`] - Toasts raised when an operation fails
//! - [`state`] - Production wiring from [`config::CartConfig`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod notify;
pub mod state;
pub mod storage;

pub use cart::{Cart, CartContext, CartSummary, UpdateProductAmount};
pub use error::{CartError, ContextError, ErrorKind};
pub use notify::{Notifier, RecordingNotifier, Toast, TracingNotifier};
