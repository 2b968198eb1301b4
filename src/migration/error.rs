//! Migration-specific error types

use super::migration::MigrationDirection;
use crate::PodiumError;
use std::fmt;
use thiserror::Error;

/// Errors raised by a [`LedgerStore`](super::LedgerStore)
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger table could not be created, read or written
    #[error("Ledger storage error: {0}")]
    Storage(#[from] PodiumError),
    /// The name is already recorded as applied
    #[error("Migration '{0}' is already recorded as applied")]
    DuplicateName(String),
    /// The configured ledger table is not a plain SQL identifier
    #[error("Invalid ledger table name '{0}': expected `table` or `schema.table`")]
    InvalidTable(String),
}

/// Migration-specific errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Ledger storage failure (connectivity, permissions, conflicting schema)
    #[error("Ledger storage error: {0}")]
    Storage(PodiumError),
    /// Attempt to record a name that is already applied
    #[error("Migration '{0}' has already been applied")]
    DuplicateName(String),
    /// Invalid ledger table name
    #[error("Invalid ledger table name '{0}': expected `table` or `schema.table`")]
    InvalidTable(String),
    /// A migration's own procedure failed
    #[error("Migration '{name}' failed during {direction}: {source}")]
    ScriptExecution {
        name: String,
        direction: MigrationDirection,
        source: PodiumError,
    },
    /// Two scripts in one set share a name
    #[error("Migration '{0}' is listed more than once")]
    DuplicateScript(String),
    /// A `--to` target that is not among the candidates for the run
    #[error("Migration '{name}' is not {expected}")]
    UnknownTarget { name: String, expected: &'static str },
    /// Migration lock timeout
    #[error(
        "Migration lock timeout: {0}\n\
         Another process may be running migrations. If this persists, check for a stuck \
         migration process holding the advisory lock."
    )]
    LockTimeout(String),
    /// Invalid migration name
    #[error("Invalid migration name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
    /// Filesystem error while generating migration files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LedgerError> for MigrationError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Storage(e) => MigrationError::Storage(e),
            LedgerError::DuplicateName(name) => MigrationError::DuplicateName(name),
            LedgerError::InvalidTable(table) => MigrationError::InvalidTable(table),
        }
    }
}

impl From<PodiumError> for MigrationError {
    fn from(error: PodiumError) -> Self {
        MigrationError::Storage(error)
    }
}

/// A halted migration run
///
/// Carries the migrations that completed (and stay committed and recorded) before
/// the failure, the migration that failed if the failure belongs to one, and the
/// underlying error.
#[derive(Debug)]
pub struct RunError {
    pub completed: Vec<String>,
    pub failed: Option<String>,
    pub error: MigrationError,
}

impl RunError {
    pub fn new(completed: Vec<String>, failed: Option<String>, error: MigrationError) -> Self {
        Self {
            completed,
            failed,
            error,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failed {
            Some(name) => write!(
                f,
                "migration run halted at '{}' after {} completed: {}",
                name,
                self.completed.len(),
                self.error
            ),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<MigrationError> for RunError {
    fn from(error: MigrationError) -> Self {
        RunError::new(Vec::new(), None, error)
    }
}

impl From<LedgerError> for RunError {
    fn from(error: LedgerError) -> Self {
        RunError::from(MigrationError::from(error))
    }
}
