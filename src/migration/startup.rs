//! In-process migration execution helpers

use crate::config::MigrationsConfig;
use crate::migration::{
    MigratePlan, MigrationLockGuard, MigrationReport, MigrationSet, Migrator, PostgresLedger,
    RunError,
};
use crate::PodiumExecutor;

/// Run migrations on application startup
///
/// Takes the migration lock so that only one instance of a multi-instance
/// deployment migrates, then applies every pending migration. Instances that lose
/// the race wait for the lock and then find nothing pending.
///
/// # Errors
///
/// Fails fast: a lock timeout, an unreadable ledger or a failing migration is
/// returned and the application should not start.
///
/// # Example
///
/// ```rust,no_run
/// use podium::{connect, config::PodiumConfig, MayPostgresExecutor};
/// use podium::migration::{startup_migrations, MigrationSet};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = PodiumConfig::load()?;
///     let executor = MayPostgresExecutor::new(connect(&config.database.url)?);
///     let migrations = MigrationSet::new();
///
///     startup_migrations(&executor, &migrations, &config.migrations)?;
///     Ok(())
/// }
/// ```
pub fn startup_migrations(
    executor: &dyn PodiumExecutor,
    migrations: &MigrationSet,
    config: &MigrationsConfig,
) -> Result<MigrationReport, RunError> {
    let lock = MigrationLockGuard::acquire(executor, &config.table, config.lock_timeout())?;
    let ledger = PostgresLedger::with_table(lock.executor(), config.table.clone())?;

    let report = Migrator::with_options(executor, ledger, migrations, config.migrator_options())
        .migrate(&MigratePlan::All)?;

    if report.is_empty() {
        log::debug!("No pending migrations to apply");
    } else {
        log::info!("Applied {} migration(s) on startup", report.len());
    }
    Ok(report)
}
