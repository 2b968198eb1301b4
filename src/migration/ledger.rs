//! Migration ledger: the durable record of which named migrations are applied.
//!
//! Every operation first ensures the backing table exists, so callers never need a
//! separate initialisation step. Nothing is cached; each call re-reads storage and
//! every failure is returned to the caller.

use super::error::LedgerError;
use super::naming::is_valid_identifier;
use super::record::MigrationRecord;
use crate::{PodiumError, PodiumExecutor};
use std::collections::BTreeSet;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Default ledger table name
pub const DEFAULT_LEDGER_TABLE: &str = "podium_migrations";

/// Persistent set of applied migration names
pub trait LedgerStore {
    /// Create the backing structure if it is absent. Safe to repeat.
    fn ensure_ready(&self) -> Result<(), LedgerError>;

    /// Every recorded name.
    ///
    /// The set is ordered by name, which is not application order; the runner
    /// reconstructs order from its script listing.
    fn list_applied(&self) -> Result<BTreeSet<String>, LedgerError>;

    /// Every record, in insertion order.
    fn list_records(&self) -> Result<Vec<MigrationRecord>, LedgerError>;

    /// Record `name` as applied now.
    ///
    /// Fails with [`LedgerError::DuplicateName`] if `name` is already recorded.
    fn record_applied(&self, name: &str) -> Result<(), LedgerError>;

    /// Erase `name`. Erasing an absent name is a no-op.
    fn record_rolled_back(&self, name: &str) -> Result<(), LedgerError>;
}

impl<L: LedgerStore + ?Sized> LedgerStore for &L {
    fn ensure_ready(&self) -> Result<(), LedgerError> {
        (**self).ensure_ready()
    }

    fn list_applied(&self) -> Result<BTreeSet<String>, LedgerError> {
        (**self).list_applied()
    }

    fn list_records(&self) -> Result<Vec<MigrationRecord>, LedgerError> {
        (**self).list_records()
    }

    fn record_applied(&self, name: &str) -> Result<(), LedgerError> {
        (**self).record_applied(name)
    }

    fn record_rolled_back(&self, name: &str) -> Result<(), LedgerError> {
        (**self).record_rolled_back(name)
    }
}

/// Ledger stored in a PostgreSQL table
///
/// The table layout is:
///
/// | Column | Type | Constraint |
/// |--------|------|------------|
/// | `id` | `BIGSERIAL` | primary key |
/// | `name` | `VARCHAR(255)` | not null |
/// | `executed_at` | `TIMESTAMPTZ` | not null, defaults to `now()` |
///
/// Share the runner's executor with the ledger so a migration's statements and its
/// ledger write travel over the same session (and the same transaction).
pub struct PostgresLedger<'a> {
    executor: &'a dyn PodiumExecutor,
    table: String,
}

impl<'a> PostgresLedger<'a> {
    /// Ledger in the default `podium_migrations` table
    pub fn new(executor: &'a dyn PodiumExecutor) -> Self {
        Self {
            executor,
            table: DEFAULT_LEDGER_TABLE.to_string(),
        }
    }

    /// Ledger in a custom table (`table` or `schema.table`)
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidTable`] if the name is not a plain identifier.
    pub fn with_table(
        executor: &'a dyn PodiumExecutor,
        table: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        let table = table.into();
        if !is_valid_identifier(&table) {
            return Err(LedgerError::InvalidTable(table));
        }
        Ok(Self { executor, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Readiness statement.
    ///
    /// Concurrent `CREATE TABLE IF NOT EXISTS` can still fail with `duplicate_table`
    /// or with `unique_violation` on the `pg_type` catalog. The PL/pgSQL handler runs
    /// the creation in a subtransaction, so a lost race is absorbed on the server and
    /// never aborts a transaction the caller has open on this session.
    fn ensure_ready_sql(&self) -> String {
        format!(
            r#"
            DO $$
            BEGIN
                CREATE TABLE IF NOT EXISTS {} (
                    id BIGSERIAL PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    executed_at TIMESTAMPTZ NOT NULL DEFAULT now()
                );
            EXCEPTION
                WHEN duplicate_table OR unique_violation THEN NULL;
            END
            $$
            "#,
            self.table
        )
    }
}

impl LedgerStore for PostgresLedger<'_> {
    fn ensure_ready(&self) -> Result<(), LedgerError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::ledger_span("ensure_ready").entered();

        self.executor.execute(&self.ensure_ready_sql(), &[])?;
        Ok(())
    }

    fn list_applied(&self) -> Result<BTreeSet<String>, LedgerError> {
        self.ensure_ready()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::ledger_span("list_applied").entered();

        let sql = format!("SELECT name FROM {}", self.table);
        let rows = self.executor.query_all(&sql, &[])?;

        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map_err(|e| LedgerError::Storage(PodiumError::Parse(format!("ledger name: {e}"))))
            })
            .collect()
    }

    fn list_records(&self) -> Result<Vec<MigrationRecord>, LedgerError> {
        self.ensure_ready()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::ledger_span("list_records").entered();

        let sql = format!("SELECT id, name, executed_at FROM {} ORDER BY id ASC", self.table);
        let rows = self.executor.query_all(&sql, &[])?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(MigrationRecord::from_row(row)?);
        }
        Ok(records)
    }

    fn record_applied(&self, name: &str) -> Result<(), LedgerError> {
        self.ensure_ready()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::ledger_span("record_applied").entered();

        // The table has no unique constraint on `name`, so the check lives in the insert.
        let sql = format!(
            r#"
            INSERT INTO {table} (name)
            SELECT $1::varchar
            WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE name = $1::varchar)
            "#,
            table = self.table
        );
        let inserted = self.executor.execute(&sql, &[&name])?;
        if inserted == 0 {
            return Err(LedgerError::DuplicateName(name.to_string()));
        }

        log::debug!("Recorded {name} in {}", self.table);
        Ok(())
    }

    fn record_rolled_back(&self, name: &str) -> Result<(), LedgerError> {
        self.ensure_ready()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::ledger_span("record_rolled_back").entered();

        let sql = format!("DELETE FROM {} WHERE name = $1", self.table);
        let removed = self.executor.execute(&sql, &[&name])?;
        if removed == 0 {
            log::debug!("{name} was not recorded in {}; nothing to erase", self.table);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingExecutor;
    use crate::transaction::Transaction;

    #[test]
    fn test_with_table_validates_identifier() {
        let executor = RecordingExecutor::new();
        assert!(PostgresLedger::with_table(&executor, "ops.schema_history").is_ok());

        let err = PostgresLedger::with_table(&executor, "ledger; DROP TABLE users").err();
        assert!(matches!(err, Some(LedgerError::InvalidTable(_))));
    }

    fn is_readiness(statement: &str, table: &str) -> bool {
        statement.starts_with("DO $$")
            && statement.contains(&format!("CREATE TABLE IF NOT EXISTS {table} ("))
    }

    #[test]
    fn test_ensure_ready_is_repeatable() {
        let executor = RecordingExecutor::new();
        let ledger = PostgresLedger::new(&executor);

        for _ in 0..3 {
            ledger.ensure_ready().unwrap();
        }

        let statements = executor.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements.iter().all(|s| is_readiness(s, "podium_migrations")));
    }

    #[test]
    fn test_ensure_ready_absorbs_lost_creation_race_on_the_server() {
        let executor = RecordingExecutor::new();
        let ledger = PostgresLedger::new(&executor);
        ledger.ensure_ready().unwrap();

        // The handler keeps an open transaction usable for the ledger write that follows.
        let statement = &executor.statements()[0];
        assert!(statement.contains("EXCEPTION"));
        assert!(statement.contains("WHEN duplicate_table OR unique_violation THEN NULL"));
    }

    #[test]
    fn test_ensure_ready_inside_transaction_keeps_it_usable() {
        let executor = RecordingExecutor::new();
        let ledger = PostgresLedger::new(&executor);

        let tx = Transaction::begin(&executor).unwrap();
        ledger.record_applied("m1_a").unwrap();
        tx.commit().unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[0], "BEGIN");
        assert!(is_readiness(&statements[1], "podium_migrations"));
        assert!(statements[2].starts_with("INSERT INTO podium_migrations"));
        assert_eq!(statements[3], "COMMIT");
    }

    #[test]
    fn test_ensure_ready_propagates_failures() {
        let executor = RecordingExecutor::new();
        // Message text alone never marks an error as benign.
        executor.fail_when("CREATE TABLE", "relation \"podium_migrations\" already exists");
        let ledger = PostgresLedger::new(&executor);

        assert!(matches!(ledger.ensure_ready(), Err(LedgerError::Storage(_))));
        // Reads and writes stop at the failed readiness check.
        assert!(ledger.list_applied().is_err());
        assert!(ledger.record_applied("m1_a").is_err());
        assert!(executor.statements().iter().all(|s| s.starts_with("DO $$")));
    }

    #[test]
    fn test_every_operation_ensures_ready_first() {
        let executor = RecordingExecutor::new();
        let ledger = PostgresLedger::with_table(&executor, "schema_history").unwrap();

        ledger.list_applied().unwrap();
        ledger.list_records().unwrap();
        ledger.record_applied("m1_a").unwrap();
        ledger.record_rolled_back("m1_a").unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 8);
        for pair in statements.chunks(2) {
            assert!(is_readiness(&pair[0], "schema_history"));
        }
        assert_eq!(statements[1], "SELECT name FROM schema_history");
        assert_eq!(
            statements[3],
            "SELECT id, name, executed_at FROM schema_history ORDER BY id ASC"
        );
        assert!(statements[5].starts_with("INSERT INTO schema_history (name)"));
        assert_eq!(statements[7], "DELETE FROM schema_history WHERE name = $1");
    }

    #[test]
    fn test_record_applied_reports_duplicate() {
        let executor = RecordingExecutor::new();
        executor.set_rows_affected(0);
        let ledger = PostgresLedger::new(&executor);

        let err = ledger.record_applied("m20230901120000_create_competitions").unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateName(ref n) if n == "m20230901120000_create_competitions"));
    }

    #[test]
    fn test_record_rolled_back_of_absent_name_is_ok() {
        let executor = RecordingExecutor::new();
        executor.set_rows_affected(0);
        let ledger = PostgresLedger::new(&executor);

        assert!(ledger.record_rolled_back("m1_never_applied").is_ok());
    }

    #[test]
    fn test_storage_errors_propagate() {
        let executor = RecordingExecutor::new();
        executor.fail_when("INSERT", "connection reset by peer");
        let ledger = PostgresLedger::new(&executor);

        let err = ledger.record_applied("m1_a").unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
