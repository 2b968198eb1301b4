//! Migration status tracking

use crate::migration::MigrationRecord;
use chrono::{DateTime, Utc};

/// Snapshot of the ledger compared with the script listing
#[derive(Debug, Clone, Default)]
pub struct MigrationStatus {
    /// Applied migrations, in application order
    pub applied: Vec<AppliedMigration>,

    /// Pending migration names, in application order
    pub pending: Vec<String>,

    /// Ledger records with no matching script in the listing
    pub orphaned: Vec<MigrationRecord>,
}

/// A script that the ledger records as applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub name: String,
    pub executed_at: DateTime<Utc>,
    /// Whether rolling it back undoes anything
    pub reversible: bool,
}

impl MigrationStatus {
    /// Check if all migrations are applied
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    /// Name of the most recently applied migration in listing order
    #[must_use]
    pub fn latest_applied(&self) -> Option<&str> {
        self.applied.last().map(|m| m.name.as_str())
    }

    /// Name of the migration the next `migrate` would run first
    #[must_use]
    pub fn next_pending(&self) -> Option<&str> {
        self.pending.first().map(String::as_str)
    }

    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Total number of scripts in the listing
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied.len() + self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessors() {
        let status = MigrationStatus {
            applied: vec![AppliedMigration {
                name: "m20230901120000_create_competitions".to_string(),
                executed_at: Utc::now(),
                reversible: true,
            }],
            pending: vec![
                "m20230905093000_create_registrations".to_string(),
                "m20231002140000_create_workouts".to_string(),
            ],
            orphaned: Vec::new(),
        };

        assert!(!status.is_up_to_date());
        assert_eq!(status.latest_applied(), Some("m20230901120000_create_competitions"));
        assert_eq!(status.next_pending(), Some("m20230905093000_create_registrations"));
        assert_eq!(status.applied_count(), 1);
        assert_eq!(status.pending_count(), 2);
        assert_eq!(status.total(), 3);
    }

    #[test]
    fn test_empty_status_is_up_to_date() {
        let status = MigrationStatus::default();
        assert!(status.is_up_to_date());
        assert_eq!(status.latest_applied(), None);
        assert_eq!(status.next_pending(), None);
    }
}
