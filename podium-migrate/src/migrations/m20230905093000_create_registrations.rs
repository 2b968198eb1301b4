//! Migration: Create registrations
//! Version: 20230905093000

use podium::migration::{Migration, SchemaManager};
use podium::PodiumError;

pub struct CreateRegistrations;

impl Migration for CreateRegistrations {
    fn name(&self) -> &str {
        "m20230905093000_create_registrations"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        manager.execute(
            r#"
            CREATE TABLE IF NOT EXISTS registrations (
                id BIGSERIAL PRIMARY KEY,
                competition_id BIGINT NOT NULL REFERENCES competitions(id) ON DELETE CASCADE,
                athlete_name VARCHAR(255) NOT NULL,
                athlete_email VARCHAR(255) NOT NULL,
                division VARCHAR(64) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                UNIQUE (competition_id, athlete_email)
            )
            "#,
            &[],
        )?;

        manager.execute(
            "CREATE INDEX IF NOT EXISTS idx_registrations_competition_id ON registrations(competition_id)",
            &[],
        )
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        manager.execute("DROP TABLE IF EXISTS registrations", &[])
    }
}
