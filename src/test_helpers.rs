//! In-process doubles for exercising migrations without a database.
//!
//! `RecordingExecutor` keeps every statement it is handed and can be told to fail
//! statements matching a substring. `TestMigration` journals each `up`/`down` call
//! into a shared [`Journal`] so tests can assert ordering across a run.

use crate::executor::{PodiumError, PodiumExecutor};
use crate::migration::{Migration, SchemaManager};
use may_postgres::types::ToSql;
use may_postgres::Row;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Executor that records statements instead of sending them anywhere.
///
/// `query_all` always yields no rows and `query_one` always fails, since
/// `may_postgres::Row` cannot be built outside a live connection.
pub struct RecordingExecutor {
    statements: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, String)>>,
    rows_affected: AtomicU64,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            rows_affected: AtomicU64::new(1),
        }
    }

    /// Row count reported by every subsequent `execute`.
    pub fn set_rows_affected(&self, rows: u64) {
        self.rows_affected.store(rows, Ordering::SeqCst);
    }

    /// Fail any statement containing `needle` with `message`.
    pub fn fail_when(&self, needle: impl Into<String>, message: impl Into<String>) {
        lock(&self.failures).push((needle.into(), message.into()));
    }

    /// Stop failing statements.
    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Statements seen so far, trimmed of surrounding whitespace.
    pub fn statements(&self) -> Vec<String> {
        lock(&self.statements).clone()
    }

    pub fn clear(&self) {
        lock(&self.statements).clear();
    }

    fn record(&self, query: &str) -> Result<(), PodiumError> {
        let statement = query.trim().to_string();
        lock(&self.statements).push(statement.clone());

        let failures = lock(&self.failures);
        match failures.iter().find(|(needle, _)| statement.contains(needle.as_str())) {
            Some((_, message)) => Err(PodiumError::Query(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PodiumExecutor for RecordingExecutor {
    fn execute(&self, query: &str, _params: &[&dyn ToSql]) -> Result<u64, PodiumError> {
        self.record(query)?;
        Ok(self.rows_affected.load(Ordering::SeqCst))
    }

    fn query_one(&self, query: &str, _params: &[&dyn ToSql]) -> Result<Row, PodiumError> {
        self.record(query)?;
        Err(PodiumError::Query(
            "RecordingExecutor cannot produce rows".to_string(),
        ))
    }

    fn query_all(&self, query: &str, _params: &[&dyn ToSql]) -> Result<Vec<Row>, PodiumError> {
        self.record(query)?;
        Ok(Vec::new())
    }
}

/// Shared, ordered log of migration procedure calls (`"up:<name>"`, `"down:<name>"`).
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn new_journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn journal_entries(journal: &Journal) -> Vec<String> {
    lock(journal).clone()
}

/// Scripted migration for runner tests.
pub struct TestMigration {
    name: String,
    journal: Journal,
    statement: Option<String>,
    fail_up: bool,
    fail_down: bool,
    reversible: bool,
}

impl TestMigration {
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: Arc::clone(journal),
            statement: None,
            fail_up: false,
            fail_down: false,
            reversible: true,
        }
    }

    /// Run `sql` through the schema manager on `up`.
    pub fn with_statement(mut self, sql: impl Into<String>) -> Self {
        self.statement = Some(sql.into());
        self
    }

    pub fn failing_up(mut self) -> Self {
        self.fail_up = true;
        self
    }

    pub fn failing_down(mut self) -> Self {
        self.fail_down = true;
        self
    }

    /// `down` becomes a silent no-op, as for data-cleanup migrations.
    pub fn irreversible(mut self) -> Self {
        self.reversible = false;
        self
    }
}

impl Migration for TestMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        lock(&self.journal).push(format!("up:{}", self.name));
        if let Some(sql) = &self.statement {
            manager.execute(sql, &[])?;
        }
        if self.fail_up {
            return Err(PodiumError::Query(format!("{} forward failed", self.name)));
        }
        Ok(())
    }

    fn down(&self, _manager: &SchemaManager<'_>) -> Result<(), PodiumError> {
        if !self.reversible {
            return Ok(());
        }
        lock(&self.journal).push(format!("down:{}", self.name));
        if self.fail_down {
            return Err(PodiumError::Query(format!("{} backward failed", self.name)));
        }
        Ok(())
    }

    fn is_reversible(&self) -> bool {
        self.reversible
    }
}
