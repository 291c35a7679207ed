//! SQLite backend for the Leavebook engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every [`LeaveStore`] operation is one
//! `BEGIN IMMEDIATE` transaction on that thread, so racing callers serialize
//! and the loser observes the winner's writes.
//!
//! [`LeaveStore`]: leavebook_core::store::LeaveStore

mod encode;
mod queries;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
