//! Core types and resolution logic for the manidx manpage catalog.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! implement [`store::CatalogStore`]; the resolvers in [`alias`], [`lookup`]
//! and [`apropos`] are generic over that trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod alias;
pub mod apropos;
pub mod catalog;
pub mod config;
pub mod error;
pub mod lookup;
pub mod memory;
pub mod store;

pub use error::{Error, Result};
