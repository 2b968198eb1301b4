//! Migrations bundled with the Podium platform, in application order.

mod m20230901120000_create_competitions;
mod m20230905093000_create_registrations;
mod m20231002140000_create_workouts;
mod m20231115080000_add_ticket_columns;
mod m20240110170000_cleanup_orphan_scores;

use podium::migration::{MigrationError, MigrationSet};

pub use m20230901120000_create_competitions::CreateCompetitions;
pub use m20230905093000_create_registrations::CreateRegistrations;
pub use m20231002140000_create_workouts::CreateWorkouts;
pub use m20231115080000_add_ticket_columns::AddTicketColumns;
pub use m20240110170000_cleanup_orphan_scores::CleanupOrphanScores;

/// Every platform migration. New migrations go at the end.
pub fn all() -> Result<MigrationSet, MigrationError> {
    MigrationSet::from_migrations(vec![
        Box::new(CreateCompetitions),
        Box::new(CreateRegistrations),
        Box::new(CreateWorkouts),
        Box::new(AddTicketColumns),
        Box::new(CleanupOrphanScores),
    ])
}
