//! # Podium
//!
//! Schema-migration ledger and runner for the Podium competition platform,
//! running on PostgreSQL through `may_postgres` and the `may` coroutine runtime.
//!
//! Migrations are named forward/backward procedures supplied as an ordered
//! [`migration::MigrationSet`]. A ledger table records which names are applied;
//! the [`migration::Migrator`] applies pending ones in order and rolls applied
//! ones back in reverse order, stopping at the first failure.

pub mod config;
pub mod connection;
pub mod executor;
pub mod migration;
pub mod transaction;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(feature = "tracing")]
pub mod tracing_helpers;

pub use connection::{connect, validate_connection_string, with_connect_timeout, ConnectionError};
pub use executor::{MayPostgresExecutor, PodiumError, PodiumExecutor};
pub use transaction::{IsolationLevel, Transaction};
