//! Migration: Create competitions
//! Version: 20230901120000

use podium::migration::{Migration, SchemaManager};
use podium::PodiumError;
use sea_query::{ColumnDef, Expr, Index, Table};

pub struct CreateCompetitions;

impl Migration for CreateCompetitions {
    fn name(&self) -> &str {
        "m20230901120000_create_competitions"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        let table = Table::create()
            .table("competitions")
            .if_not_exists()
            .col(
                ColumnDef::new("id")
                    .big_integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new("slug").string_len(120).not_null().unique_key())
            .col(ColumnDef::new("title").string_len(255).not_null())
            .col(ColumnDef::new("starts_on").date().not_null())
            .col(ColumnDef::new("ends_on").date().not_null())
            .col(ColumnDef::new("location").string_len(255).null())
            .col(
                ColumnDef::new("published")
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new("created_at")
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .to_owned();
        manager.create_table(table)?;

        let index = Index::create()
            .if_not_exists()
            .name("idx_competitions_starts_on")
            .table("competitions")
            .col(Expr::col("starts_on"))
            .to_owned();
        manager.create_index(index)
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        manager.drop_table(Table::drop().table("competitions").if_exists().to_owned())
    }
}
