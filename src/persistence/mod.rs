//! Persistence layer: SQLite store for sessions, messages, users,
//! transactions and the waitlist.
//!
//! The concrete implementation uses `sqlx::SqlitePool` for async access.
//! The schema is embedded from `migrations/` and applied idempotently on
//! every startup.

pub mod models;
mod sessions;
pub mod sqlite;
mod users;
mod waitlist;

pub use sqlite::SqlitePersistence;
