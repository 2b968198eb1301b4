//! Podium Migration Library
//!
//! Command definitions, output formatting and the bundled platform migrations used
//! by the `podium-migrate` binary.

pub mod generate;
pub mod migrations;
pub mod output;

use clap::{Parser, Subcommand};
use podium::config::{MigrationsConfig, PodiumConfig};
use podium::migration::{
    LedgerError, MigratePlan, MigrationError, MigrationLockGuard, MigrationSet, Migrator,
    MigratorOptions, PostgresLedger, RollbackPlan, RunError, TransactionMode,
};
use podium::{
    connect, with_connect_timeout, ConnectionError, MayPostgresExecutor, PodiumExecutor,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "podium-migrate")]
#[command(about = "Schema migration tool for the Podium competition platform")]
#[command(version)]
pub struct Cli {
    /// Database connection URL (else PODIUM_DATABASE_URL, DATABASE_URL, config file)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Ledger table name (`table` or `schema.table`)
    #[arg(long, global = true)]
    pub table: Option<String>,

    /// Run each migration in autocommit mode instead of its own transaction
    #[arg(long, global = true)]
    pub no_transaction: bool,

    /// Seconds to wait for another migration run to release the lock
    #[arg(long, global = true, value_name = "SECONDS")]
    pub lock_timeout: Option<u64>,

    /// Configuration file
    #[arg(long, global = true, default_value = "config/config.toml")]
    pub config: PathBuf,

    /// Directory `generate` writes into
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show applied, pending and orphaned migrations
    Status,

    /// Apply pending migrations in order, stopping at the first failure
    #[command(visible_alias = "up")]
    Migrate {
        /// Apply only the first N pending migrations
        #[arg(long, conflicts_with = "to")]
        steps: Option<usize>,

        /// Apply pending migrations up to and including this one
        #[arg(long)]
        to: Option<String>,

        /// Show what would be applied without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Roll back applied migrations, newest first (default: one)
    #[command(visible_alias = "down")]
    Rollback {
        /// Roll back the N most recent migrations
        #[arg(long, conflicts_with_all = ["to", "all"])]
        step: Option<usize>,

        /// Roll back down to and including this migration
        #[arg(long, conflicts_with = "all")]
        to: Option<String>,

        /// Roll back every applied migration
        #[arg(long)]
        all: bool,

        /// Show what would be rolled back without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate a new migration file
    Generate {
        /// Migration description (e.g. "add heat assignments")
        name: String,
    },
}

impl Commands {
    pub fn migrate_plan(steps: Option<usize>, to: Option<&str>) -> MigratePlan {
        match (steps, to) {
            (_, Some(name)) => MigratePlan::To(name.to_string()),
            (Some(n), None) => MigratePlan::Steps(n),
            (None, None) => MigratePlan::All,
        }
    }

    pub fn rollback_plan(step: Option<usize>, to: Option<&str>, all: bool) -> RollbackPlan {
        if all {
            return RollbackPlan::All;
        }
        match (step, to) {
            (_, Some(name)) => RollbackPlan::To(name.to_string()),
            (Some(n), None) => RollbackPlan::Steps(n),
            (None, None) => RollbackPlan::default(),
        }
    }
}

/// CLI flags merged over the configuration file and environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub migrations: MigrationsConfig,
}

impl Settings {
    /// `env` looks up environment variables; injected for tests.
    pub fn resolve(
        cli: &Cli,
        config: PodiumConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let database_url = cli
            .database_url
            .clone()
            .or_else(|| env("PODIUM_DATABASE_URL"))
            .or_else(|| env("DATABASE_URL"))
            .unwrap_or(config.database.url);
        let database_url =
            with_connect_timeout(&database_url, config.database.connect_timeout_seconds);

        let mut migrations = config.migrations;
        if let Some(table) = &cli.table {
            migrations.table = table.clone();
        }
        if let Some(seconds) = cli.lock_timeout {
            migrations.lock_timeout_seconds = seconds;
        }
        if cli.no_transaction {
            migrations.transactional = false;
        }
        if let Some(dir) = &cli.migrations_dir {
            migrations.directory = dir.display().to_string();
        }

        Self {
            database_url,
            migrations,
        }
    }

    pub fn migrator_options(&self) -> MigratorOptions {
        self.migrations.migrator_options()
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Error connecting to database: {0}")]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Run(#[from] RunError),
}

impl From<LedgerError> for CliError {
    fn from(error: LedgerError) -> Self {
        CliError::Migration(error.into())
    }
}

/// Run `cli` against `migrations`.
///
/// Everything except `generate` connects to the database.
pub fn run(cli: &Cli, migrations: &MigrationSet) -> Result<(), CliError> {
    let config =
        PodiumConfig::load_from(&cli.config).map_err(|e| CliError::Config(e.to_string()))?;
    let settings = Settings::resolve(cli, config, |key| std::env::var(key).ok());

    if let Commands::Generate { name } = &cli.command {
        return generate_command(cli, &settings, name);
    }

    let client = connect(&settings.database_url)?;
    let executor = MayPostgresExecutor::new(client);
    execute(cli, &settings, &executor, migrations)
}

/// Dispatch a database command on an open executor.
///
/// `migrate` and `rollback` hold the PostgreSQL advisory lock for the ledger table
/// while they run.
pub fn execute(
    cli: &Cli,
    settings: &Settings,
    executor: &dyn PodiumExecutor,
    migrations: &MigrationSet,
) -> Result<(), CliError> {
    execute_with_lock(cli, settings, executor, migrations, |executor, settings| {
        MigrationLockGuard::acquire(
            executor,
            &settings.migrations.table,
            settings.migrations.lock_timeout(),
        )
    })
}

/// [`execute`] with `lock` producing the guard held across a `migrate` or
/// `rollback` run. The guard is dropped when the run ends.
pub fn execute_with_lock<'e, G>(
    cli: &Cli,
    settings: &Settings,
    executor: &'e dyn PodiumExecutor,
    migrations: &MigrationSet,
    lock: impl Fn(&'e dyn PodiumExecutor, &Settings) -> Result<G, MigrationError>,
) -> Result<(), CliError> {
    let ledger = PostgresLedger::with_table(executor, settings.migrations.table.clone())?;
    let migrator =
        Migrator::with_options(executor, ledger, migrations, settings.migrator_options());

    match &cli.command {
        Commands::Status => {
            let status = migrator.status()?;
            println!("{}", output::format_status(&status));
        }
        Commands::Migrate { steps, to, dry_run } => {
            let plan = Commands::migrate_plan(*steps, to.as_deref());
            if *dry_run {
                let selected = migrator.plan_migrate(&plan)?;
                println!("{}", output::format_plan("apply", &selected));
                return Ok(());
            }

            let _lock = lock(executor, settings)?;
            if settings.migrator_options().transaction_mode == TransactionMode::None {
                log::warn!("Running without transactions; a failed migration may leave partial changes");
            }
            match migrator.migrate(&plan) {
                Ok(report) => output::say(cli.quiet, &output::format_report(&report)),
                Err(err) => {
                    eprintln!("{}", output::format_run_error(&err));
                    return Err(err.into());
                }
            }
        }
        Commands::Rollback {
            step,
            to,
            all,
            dry_run,
        } => {
            let plan = Commands::rollback_plan(*step, to.as_deref(), *all);
            if *dry_run {
                let selected = migrator.plan_rollback(&plan)?;
                println!("{}", output::format_plan("roll back", &selected));
                return Ok(());
            }

            let _lock = lock(executor, settings)?;
            match migrator.rollback(&plan) {
                Ok(report) => output::say(cli.quiet, &output::format_report(&report)),
                Err(err) => {
                    eprintln!("{}", output::format_run_error(&err));
                    return Err(err.into());
                }
            }
        }
        Commands::Generate { name } => return generate_command(cli, settings, name),
    }

    Ok(())
}

fn generate_command(cli: &Cli, settings: &Settings, name: &str) -> Result<(), CliError> {
    let dir = PathBuf::from(&settings.migrations.directory);
    let path = generate::write_migration(&dir, name, chrono::Utc::now())?;
    output::say(cli.quiet, &format!("Generated migration: {}", path.display()));
    output::say(
        cli.quiet,
        "Implement up() and down(), then register it in the migration set",
    );
    Ok(())
}
