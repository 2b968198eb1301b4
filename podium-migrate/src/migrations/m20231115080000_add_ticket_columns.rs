//! Migration: Add ticket columns to registrations
//! Version: 20231115080000

use podium::migration::{Migration, SchemaManager};
use podium::PodiumError;
use sea_query::ColumnDef;

pub struct AddTicketColumns;

impl Migration for AddTicketColumns {
    fn name(&self) -> &str {
        "m20231115080000_add_ticket_columns"
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        manager.add_column(
            "registrations",
            ColumnDef::new("ticket_code").string_len(32).null().to_owned(),
        )?;
        manager.add_column(
            "registrations",
            ColumnDef::new("price_cents")
                .integer()
                .not_null()
                .default(0)
                .to_owned(),
        )?;
        manager.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_registrations_ticket_code ON registrations(ticket_code)",
            &[],
        )
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        manager.execute("DROP INDEX IF EXISTS idx_registrations_ticket_code", &[])?;
        manager.drop_column("registrations", "price_cents")?;
        manager.drop_column("registrations", "ticket_code")
    }
}
