//! Migration trait definition

use super::schema_manager::SchemaManager;
use crate::PodiumError;
use std::fmt;

/// Trait that all migrations must implement
///
/// A migration is a named pair of procedures: `up()` applies the change and
/// `down()` reverses it. The runner records the name in the ledger only after the
/// procedure returns `Ok`, so a failing procedure leaves the ledger untouched.
///
/// The runner does not inspect database state beyond the ledger. A migration that
/// is interrupted between its own statements and the ledger write is run again on
/// the next invocation, so statements should be guarded (`IF NOT EXISTS`, etc.)
/// wherever the dialect allows.
pub trait Migration: Send + Sync {
    /// Unique migration name, conventionally `m{YYYYMMDDHHMMSS}_{slug}`
    fn name(&self) -> &str;

    /// Apply the migration (forward migration)
    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError>;

    /// Roll the migration back (reverse migration)
    ///
    /// Data cleanups that cannot be reversed may return `Ok(())` without doing
    /// anything; the ledger record is still removed.
    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError>;

    /// Whether `down()` actually reverses the change. Informational only.
    fn is_reversible(&self) -> bool {
        true
    }
}

/// Direction for migration execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// Apply the migration (up)
    Up,
    /// Roll the migration back (down)
    Down,
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationDirection::Up => f.write_str("up"),
            MigrationDirection::Down => f.write_str("down"),
        }
    }
}
