//! RocketShoes Core - Shared types library.
//!
//! This crate provides the types shared by all RocketShoes cart components:
//! - `storefront` - Cart state container, remote API client and storage
//! - `cli` - Terminal front end over the cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, products, stock and cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
