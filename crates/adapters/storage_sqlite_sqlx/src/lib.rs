//! # thermolink-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`StateStore`](thermolink_app::ports::StateStore) port
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map persisted records to and from JSON rows
//!
//! ## Dependency rule
//! Depends on `thermolink-app` (for port traits) and `thermolink-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod state_store;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use state_store::SqliteStateStore;
