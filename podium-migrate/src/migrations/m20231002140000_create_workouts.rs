//! Migration: Create workouts and scores
//! Version: 20231002140000

use podium::migration::{Migration, SchemaManager};
use podium::PodiumError;
use sea_query::Table;

pub struct CreateWorkouts;

impl Migration for CreateWorkouts {
    fn name(&self) -> &str {
        "m20231002140000_create_workouts"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        manager.create_enum_type("score_type", &["time", "reps", "load", "rounds_reps"])?;

        manager.execute(
            r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id BIGSERIAL PRIMARY KEY,
                competition_id BIGINT NOT NULL REFERENCES competitions(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                score_type score_type NOT NULL,
                time_cap_seconds INTEGER,
                UNIQUE (competition_id, position)
            )
            "#,
            &[],
        )?;

        manager.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id BIGSERIAL PRIMARY KEY,
                workout_id BIGINT REFERENCES workouts(id) ON DELETE SET NULL,
                registration_id BIGINT REFERENCES registrations(id) ON DELETE SET NULL,
                value NUMERIC(12, 3) NOT NULL,
                tiebreak NUMERIC(12, 3),
                submitted_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
            &[],
        )
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        manager.drop_table(Table::drop().table("scores").if_exists().to_owned())?;
        manager.drop_table(Table::drop().table("workouts").if_exists().to_owned())?;
        manager.drop_enum_type("score_type")
    }
}
