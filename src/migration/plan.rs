//! Selection of the migrations a run will touch

use super::error::MigrationError;
use super::migration::Migration;

/// How far `migrate` goes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MigratePlan {
    /// Every pending migration
    #[default]
    All,
    /// The first `n` pending migrations
    Steps(usize),
    /// Pending migrations up to and including the named one
    To(String),
}

/// How far `rollback` goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackPlan {
    /// The `n` most recently applied migrations
    Steps(usize),
    /// Applied migrations back to and including the named one
    To(String),
    /// Every applied migration
    All,
}

impl Default for RollbackPlan {
    fn default() -> Self {
        RollbackPlan::Steps(1)
    }
}

impl MigratePlan {
    /// `pending` must be in application order.
    pub(crate) fn select<'m>(
        &self,
        pending: Vec<&'m dyn Migration>,
    ) -> Result<Vec<&'m dyn Migration>, MigrationError> {
        select(pending, self.as_selector(), "pending")
    }

    fn as_selector(&self) -> Selector<'_> {
        match self {
            MigratePlan::All => Selector::All,
            MigratePlan::Steps(n) => Selector::Steps(*n),
            MigratePlan::To(name) => Selector::To(name),
        }
    }
}

impl RollbackPlan {
    /// `applied` must be newest first.
    pub(crate) fn select<'m>(
        &self,
        applied: Vec<&'m dyn Migration>,
    ) -> Result<Vec<&'m dyn Migration>, MigrationError> {
        select(applied, self.as_selector(), "applied")
    }

    fn as_selector(&self) -> Selector<'_> {
        match self {
            RollbackPlan::All => Selector::All,
            RollbackPlan::Steps(n) => Selector::Steps(*n),
            RollbackPlan::To(name) => Selector::To(name),
        }
    }
}

enum Selector<'p> {
    All,
    Steps(usize),
    To(&'p str),
}

fn select<'m>(
    mut candidates: Vec<&'m dyn Migration>,
    selector: Selector<'_>,
    expected: &'static str,
) -> Result<Vec<&'m dyn Migration>, MigrationError> {
    match selector {
        Selector::All => Ok(candidates),
        Selector::Steps(n) => {
            candidates.truncate(n);
            Ok(candidates)
        }
        Selector::To(target) => {
            let position = candidates
                .iter()
                .position(|m| m.name() == target)
                .ok_or_else(|| MigrationError::UnknownTarget {
                    name: target.to_string(),
                    expected,
                })?;
            candidates.truncate(position + 1);
            Ok(candidates)
        }
    }
}
