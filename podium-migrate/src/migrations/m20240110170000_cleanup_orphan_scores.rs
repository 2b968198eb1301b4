//! Migration: Remove scores left behind by deleted workouts or registrations
//! Version: 20240110170000
//!
//! Deleted rows cannot be restored, so `down` only lets the ledger forget it.

use podium::migration::{Migration, SchemaManager};
use podium::PodiumError;

pub struct CleanupOrphanScores;

impl Migration for CleanupOrphanScores {
    fn name(&self) -> &str {
        "m20240110170000_cleanup_orphan_scores"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        manager.execute(
            "DELETE FROM scores WHERE workout_id IS NULL OR registration_id IS NULL",
            &[],
        )
    }

    fn down(&self, _manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        Ok(())
    }

    fn is_reversible(&self) -> bool {
        false
    }
}
