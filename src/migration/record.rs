//! `MigrationRecord` - rows of the migration ledger table

use crate::PodiumError;
use chrono::{DateTime, Utc};

/// A row of the ledger table: one applied migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Surrogate key, assigned by the database
    pub id: i64,

    /// Migration name
    pub name: String,

    /// When the migration was recorded as applied; set once, never updated
    pub executed_at: DateTime<Utc>,
}

impl MigrationRecord {
    #[must_use]
    pub fn new(id: i64, name: String, executed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            executed_at,
        }
    }

    /// Create a `MigrationRecord` from a ledger row
    ///
    /// Expected column order: `id`, `name`, `executed_at` (`TIMESTAMPTZ`).
    ///
    /// # Errors
    ///
    /// Returns `PodiumError::Parse` if a column cannot be decoded.
    pub fn from_row(row: &may_postgres::Row) -> Result<Self, PodiumError> {
        let id: i64 = row
            .try_get(0)
            .map_err(|e| PodiumError::Parse(format!("ledger id: {e}")))?;
        let name: String = row
            .try_get(1)
            .map_err(|e| PodiumError::Parse(format!("ledger name: {e}")))?;
        let executed_at: DateTime<Utc> = row
            .try_get(2)
            .map_err(|e| PodiumError::Parse(format!("ledger executed_at: {e}")))?;

        Ok(Self {
            id,
            name,
            executed_at,
        })
    }
}
