//! Schema migrations for Podium
//!
//! This module provides:
//! - the [`Migration`] trait and the [`SchemaManager`] handed to each script
//! - the [`LedgerStore`] recording which migrations are applied
//! - the fail-fast [`Migrator`] that applies and rolls back a [`MigrationSet`]
//! - an advisory [`MigrationLockGuard`] and a [`startup_migrations`] helper
//!
//! # Example
//!
//! ```rust,no_run
//! use podium::migration::{Migration, SchemaManager};
//! use sea_query::{ColumnDef, Table};
//!
//! pub struct CreateCompetitions;
//!
//! impl Migration for CreateCompetitions {
//!     fn name(&self) -> &str {
//!         "m20230901120000_create_competitions"
//!     }
//!
//!     fn up(&self, manager: &SchemaManager<'_>) -> Result<(), podium::PodiumError> {
//!         let table = Table::create()
//!             .table("competitions")
//!             .if_not_exists()
//!             .col(ColumnDef::new("id").big_integer().not_null().auto_increment().primary_key())
//!             .col(ColumnDef::new("title").string().not_null())
//!             .to_owned();
//!         manager.create_table(table)
//!     }
//!
//!     fn down(&self, manager: &SchemaManager<'_>) -> Result<(), podium::PodiumError> {
//!         manager.drop_table(Table::drop().table("competitions").if_exists().to_owned())
//!     }
//! }
//! ```

pub mod error;
pub mod ledger;
pub mod lock;
pub mod memory;
pub mod migration;
pub mod migrator;
pub mod naming;
pub mod plan;
pub mod record;
pub mod schema_manager;
pub mod set;
pub mod startup;
pub mod status;

pub use error::{LedgerError, MigrationError, RunError};
pub use ledger::{LedgerStore, PostgresLedger, DEFAULT_LEDGER_TABLE};
pub use lock::{lock_key, MigrationLockGuard};
pub use memory::MemoryLedger;
pub use migration::{Migration, MigrationDirection};
pub use migrator::{MigrationReport, MigrationStep, Migrator, MigratorOptions, TransactionMode};
pub use naming::{slugify, validate_name, MigrationName};
pub use plan::{MigratePlan, RollbackPlan};
pub use record::MigrationRecord;
pub use schema_manager::SchemaManager;
pub use set::MigrationSet;
pub use startup::startup_migrations;
pub use status::{AppliedMigration, MigrationStatus};
