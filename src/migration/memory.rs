//! In-process ledger
//!
//! Behaves like [`PostgresLedger`](super::PostgresLedger) without a database:
//! lazy readiness, duplicate rejection, idempotent erase. Reads and writes can be
//! made to fail on demand to simulate storage outages and crashes mid-run.

use super::error::LedgerError;
use super::ledger::LedgerStore;
use super::record::MigrationRecord;
use crate::PodiumError;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    ready: bool,
    ensure_ready_calls: usize,
    next_id: i64,
    records: Vec<MigrationRecord>,
    failing_reads: usize,
    failing_writes: usize,
}

impl MemoryState {
    fn push(&mut self, name: &str) {
        self.next_id += 1;
        self.records
            .push(MigrationRecord::new(self.next_id, name.to_string(), Utc::now()));
    }

    fn take_failure(counter: &mut usize, what: &str) -> Result<(), LedgerError> {
        if *counter > 0 {
            *counter -= 1;
            return Err(LedgerError::Storage(PodiumError::Other(format!(
                "simulated ledger {what} failure"
            ))));
        }
        Ok(())
    }
}

/// Ledger held in memory
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<MemoryState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that already holds `names`, recorded in the given order.
    pub fn with_applied<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ledger = Self::new();
        {
            let mut state = ledger.guard();
            state.ready = true;
            for name in names {
                state.push(name.as_ref());
            }
        }
        ledger
    }

    /// Fail the next `count` reads (`list_applied`, `list_records`).
    pub fn fail_next_reads(&self, count: usize) {
        self.guard().failing_reads = count;
    }

    /// Fail the next `count` writes (`record_applied`, `record_rolled_back`).
    pub fn fail_next_writes(&self, count: usize) {
        self.guard().failing_writes = count;
    }

    /// Recorded names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.guard().records.iter().map(|r| r.name.clone()).collect()
    }

    /// Whether the backing structure has been created.
    pub fn is_ready(&self) -> bool {
        self.guard().ready
    }

    pub fn ensure_ready_calls(&self) -> usize {
        self.guard().ensure_ready_calls
    }

    fn guard(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ready_state(&self) -> MutexGuard<'_, MemoryState> {
        let mut state = self.guard();
        state.ensure_ready_calls += 1;
        state.ready = true;
        state
    }
}

impl LedgerStore for MemoryLedger {
    fn ensure_ready(&self) -> Result<(), LedgerError> {
        drop(self.ready_state());
        Ok(())
    }

    fn list_applied(&self) -> Result<BTreeSet<String>, LedgerError> {
        let mut state = self.ready_state();
        MemoryState::take_failure(&mut state.failing_reads, "read")?;
        Ok(state.records.iter().map(|r| r.name.clone()).collect())
    }

    fn list_records(&self) -> Result<Vec<MigrationRecord>, LedgerError> {
        let mut state = self.ready_state();
        MemoryState::take_failure(&mut state.failing_reads, "read")?;
        Ok(state.records.clone())
    }

    fn record_applied(&self, name: &str) -> Result<(), LedgerError> {
        let mut state = self.ready_state();
        MemoryState::take_failure(&mut state.failing_writes, "write")?;
        if state.records.iter().any(|r| r.name == name) {
            return Err(LedgerError::DuplicateName(name.to_string()));
        }
        state.push(name);
        Ok(())
    }

    fn record_rolled_back(&self, name: &str) -> Result<(), LedgerError> {
        let mut state = self.ready_state();
        MemoryState::take_failure(&mut state.failing_writes, "write")?;
        state.records.retain(|r| r.name != name);
        Ok(())
    }
}
