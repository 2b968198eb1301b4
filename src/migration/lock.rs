//! Advisory-lock based mutual exclusion for migration runs
//!
//! Several application instances starting at once would otherwise race through the
//! same pending list. The lock is a PostgreSQL session advisory lock keyed on the
//! ledger table name, so it disappears with the session if the process dies.

use crate::migration::MigrationError;
use crate::PodiumExecutor;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lock guard that releases the advisory lock when dropped
pub struct MigrationLockGuard<'a> {
    executor: &'a dyn PodiumExecutor,
    key: i64,
}

impl<'a> MigrationLockGuard<'a> {
    /// Acquire the migration lock for `table`, polling until `timeout` elapses
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::LockTimeout` if another session holds the lock for
    /// longer than `timeout`, or `MigrationError::Storage` if the lock query fails.
    pub fn acquire(
        executor: &'a dyn PodiumExecutor,
        table: &str,
        timeout: Duration,
    ) -> Result<Self, MigrationError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::acquire_lock_span().entered();

        let key = lock_key(table);
        let start = Instant::now();
        let mut announced = false;

        loop {
            if try_lock(executor, key)? {
                log::debug!("Acquired migration lock {key} for {table}");
                return Ok(Self { executor, key });
            }

            if start.elapsed() >= timeout {
                return Err(MigrationError::LockTimeout(format!(
                    "lock for {table} (key {key}) still held after {}s",
                    timeout.as_secs()
                )));
            }
            if !announced {
                log::info!("Waiting for another process to finish migrating {table}");
                announced = true;
            }
            may::coroutine::sleep(POLL_INTERVAL);
        }
    }

    pub fn key(&self) -> i64 {
        self.key
    }

    /// Get a reference to the underlying executor
    pub fn executor(&self) -> &'a dyn PodiumExecutor {
        self.executor
    }
}

impl Drop for MigrationLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .executor
            .query_one("SELECT pg_advisory_unlock($1)", &[&self.key])
        {
            log::warn!("Failed to release migration lock {}: {e}", self.key);
        }
    }
}

fn try_lock(executor: &dyn PodiumExecutor, key: i64) -> Result<bool, MigrationError> {
    let row = executor.query_one("SELECT pg_try_advisory_lock($1)", &[&key])?;
    row.try_get::<_, bool>(0)
        .map_err(|e| MigrationError::Storage(crate::PodiumError::Parse(format!("advisory lock: {e}"))))
}

/// Advisory lock key for a ledger table (64-bit FNV-1a of the name)
pub fn lock_key(table: &str) -> i64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = table
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME));
    hash as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingExecutor;

    #[test]
    fn test_lock_key_is_stable_per_table() {
        assert_eq!(lock_key("podium_migrations"), lock_key("podium_migrations"));
        assert_ne!(lock_key("podium_migrations"), lock_key("ops.podium_migrations"));
        // FNV-1a of the empty string is the offset basis
        assert_eq!(lock_key(""), 0xcbf2_9ce4_8422_2325_u64 as i64);
    }

    #[test]
    fn test_acquire_propagates_query_failure() {
        let executor = RecordingExecutor::new();
        let err = MigrationLockGuard::acquire(&executor, "podium_migrations", Duration::ZERO)
            .err();

        assert!(matches!(err, Some(MigrationError::Storage(_))));
        assert_eq!(executor.statements(), vec!["SELECT pg_try_advisory_lock($1)"]);
    }
}
