//! SQLite backend for the pulse engagement store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every closure handed to that thread is
//! one transaction, which is what makes the like/counter pair atomic.

mod counter;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
