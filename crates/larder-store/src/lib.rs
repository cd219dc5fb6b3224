//! # Larder Store
//!
//! Storage abstraction for the Larder sharing engine.
//!
//! ## Overview
//!
//! The [`Store`] trait is the engine's only view of persistence. It
//! covers three concerns:
//!
//! - **Resources**: recipe and binder rows, with cascading deletes
//! - **Grants**: sharing records with soft-delete revocation
//! - **Memberships**: the binder-to-recipe containment index
//!
//! Two implementations:
//!
//! - [`SqliteStore`]: the primary backend, rusqlite with bundled SQLite
//! - [`MemoryStore`]: same semantics, no persistence, for tests
//!
//! Atomicity-sensitive operations (cascading deletes, fork-on-add) are
//! single trait methods so backends can wrap them in one transaction.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;

/// Get current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
