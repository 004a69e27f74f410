//! SQLite backend for the manidx catalog.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Apropos descriptions live in an FTS5
//! table; ranking is FTS5's `bm25`.

mod dimension;
mod encode;
mod schema;
mod section;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::Layout;
pub use store::SqliteStore;
