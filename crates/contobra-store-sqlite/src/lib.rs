//! SQLite backend for the ContObra field store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every committed write
//! publishes its collection on an in-process change bus, which is what
//! drives the live feed subscriptions.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
