//! Span helpers used when the `tracing` feature is enabled.

use crate::migration::MigrationDirection;
use tracing::{info_span, Span};

const STATEMENT_PREVIEW_LEN: usize = 120;

fn statement_preview(query: &str) -> &str {
    let trimmed = query.trim();
    match trimmed.char_indices().nth(STATEMENT_PREVIEW_LEN) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

/// Span wrapping a single SQL statement.
pub fn execute_query_span(query: &str) -> Span {
    info_span!("podium.execute", db.statement = statement_preview(query))
}

/// Span wrapping one migration step (script plus ledger write).
pub fn migration_span(name: &str, direction: MigrationDirection) -> Span {
    info_span!("podium.migration", migration = name, direction = %direction)
}

/// Span wrapping a ledger operation.
pub fn ledger_span(operation: &'static str) -> Span {
    info_span!("podium.ledger", operation)
}

/// Span wrapping migration lock acquisition.
pub fn acquire_lock_span() -> Span {
    info_span!("podium.lock.acquire")
}

/// Span wrapping connection establishment.
pub fn acquire_connection_span() -> Span {
    info_span!("podium.connect")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_preview_truncates_long_sql() {
        let long = "x".repeat(500);
        assert_eq!(statement_preview(&long).len(), STATEMENT_PREVIEW_LEN);
        assert_eq!(statement_preview("  SELECT 1  "), "SELECT 1");
    }
}
