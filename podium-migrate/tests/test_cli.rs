//! Tests for argument parsing, settings resolution and command dispatch

use clap::Parser;
use podium::config::PodiumConfig;
use podium::migration::{
    MigratePlan, Migration, MigrationDirection, MigrationError, MigrationSet, RollbackPlan,
};
use podium::test_helpers::{journal_entries, new_journal, Journal, RecordingExecutor, TestMigration};
use podium_migrate::{execute, execute_with_lock, migrations, Cli, CliError, Commands, Settings};
use std::cell::Cell;
use std::collections::HashMap;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("podium-migrate").chain(args.iter().copied())).unwrap()
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_migrate_and_alias() {
    let cli = parse(&["migrate", "--steps", "2"]);
    assert_eq!(
        cli.command,
        Commands::Migrate {
            steps: Some(2),
            to: None,
            dry_run: false
        }
    );

    let cli = parse(&["up", "--to", "m20231002140000_create_workouts", "--dry-run"]);
    assert!(matches!(cli.command, Commands::Migrate { dry_run: true, .. }));
}

#[test]
fn test_rollback_flags() {
    let cli = parse(&["down"]);
    assert_eq!(
        cli.command,
        Commands::Rollback {
            step: None,
            to: None,
            all: false,
            dry_run: false
        }
    );

    assert!(Cli::try_parse_from(["podium-migrate", "rollback", "--step", "1", "--to", "m1_a"]).is_err());
    assert!(Cli::try_parse_from(["podium-migrate", "rollback", "--to", "m1_a", "--all"]).is_err());
    assert!(Cli::try_parse_from(["podium-migrate", "migrate", "--steps", "1", "--to", "m1_a"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["status", "--table", "ops.schema_history", "--no-transaction", "-v"]);
    assert_eq!(cli.table.as_deref(), Some("ops.schema_history"));
    assert!(cli.no_transaction);
    assert!(cli.verbose);
    assert!(Cli::try_parse_from(["podium-migrate", "status", "-v", "-q"]).is_err());
}

#[test]
fn test_plans_from_flags() {
    assert_eq!(Commands::migrate_plan(None, None), MigratePlan::All);
    assert_eq!(Commands::migrate_plan(Some(3), None), MigratePlan::Steps(3));
    assert_eq!(
        Commands::migrate_plan(None, Some("m1_a")),
        MigratePlan::To("m1_a".to_string())
    );

    assert_eq!(Commands::rollback_plan(None, None, false), RollbackPlan::Steps(1));
    assert_eq!(Commands::rollback_plan(Some(2), None, false), RollbackPlan::Steps(2));
    assert_eq!(Commands::rollback_plan(None, None, true), RollbackPlan::All);
    assert_eq!(
        Commands::rollback_plan(None, Some("m1_a"), false),
        RollbackPlan::To("m1_a".to_string())
    );
}

fn config_without_timeout() -> PodiumConfig {
    let mut config = PodiumConfig::default();
    config.database.connect_timeout_seconds = 0;
    config
}

#[test]
fn test_database_url_precedence() {
    let env: HashMap<&str, &str> = [
        ("PODIUM_DATABASE_URL", "postgres://u:p@podium-env/podium"),
        ("DATABASE_URL", "postgres://u:p@generic-env/podium"),
    ]
    .into_iter()
    .collect();
    let lookup = |key: &str| env.get(key).map(|v| v.to_string());

    let flag = parse(&["--database-url", "postgres://u:p@flag/podium", "status"]);
    assert_eq!(
        Settings::resolve(&flag, config_without_timeout(), lookup).database_url,
        "postgres://u:p@flag/podium"
    );

    let bare = parse(&["status"]);
    assert_eq!(
        Settings::resolve(&bare, config_without_timeout(), lookup).database_url,
        "postgres://u:p@podium-env/podium"
    );
    assert_eq!(
        Settings::resolve(&bare, config_without_timeout(), |key: &str| {
            (key == "DATABASE_URL").then(|| "postgres://u:p@generic-env/podium".to_string())
        })
        .database_url,
        "postgres://u:p@generic-env/podium"
    );

    let mut config = config_without_timeout();
    config.database.url = "postgres://u:p@from-file/podium".to_string();
    assert_eq!(
        Settings::resolve(&bare, config, no_env).database_url,
        "postgres://u:p@from-file/podium"
    );
}

#[test]
fn test_connect_timeout_is_applied() {
    let cli = parse(&["--database-url", "postgres://u:p@db/podium", "status"]);
    assert_eq!(
        Settings::resolve(&cli, PodiumConfig::default(), no_env).database_url,
        "postgres://u:p@db/podium?connect_timeout=10"
    );
}

#[test]
fn test_flags_override_migration_config() {
    let cli = parse(&["migrate", "--table", "schema_history", "--lock-timeout", "5", "--no-transaction"]);
    let settings = Settings::resolve(&cli, PodiumConfig::default(), no_env);

    assert_eq!(settings.migrations.table, "schema_history");
    assert_eq!(settings.migrations.lock_timeout_seconds, 5);
    assert!(!settings.migrations.transactional);
}

#[test]
fn test_status_and_dry_run_touch_only_the_ledger() {
    let executor = RecordingExecutor::new();
    let set = migrations::all().unwrap();

    for args in [
        &["status"][..],
        &["migrate", "--dry-run"][..],
        &["rollback", "--all", "--dry-run"][..],
    ] {
        let cli = parse(args);
        let settings = Settings::resolve(&cli, PodiumConfig::default(), no_env);
        execute(&cli, &settings, &executor, &set).unwrap();
    }

    assert!(executor.statements().iter().all(|s| {
        (s.starts_with("DO $$") && s.contains("CREATE TABLE IF NOT EXISTS podium_migrations ("))
            || s.starts_with("SELECT")
    }));
}

#[test]
fn test_migrate_fails_when_lock_cannot_be_queried() {
    let executor = RecordingExecutor::new();
    let set = migrations::all().unwrap();
    let cli = parse(&["migrate"]);
    let settings = Settings::resolve(&cli, PodiumConfig::default(), no_env);

    let err = execute(&cli, &settings, &executor, &set).unwrap_err();
    assert!(matches!(err, CliError::Migration(MigrationError::Storage(_))));
    assert!(!executor.statements().iter().any(|s| s == "BEGIN"));
}

#[test]
fn test_invalid_table_is_rejected() {
    let executor = RecordingExecutor::new();
    let set = migrations::all().unwrap();
    let cli = parse(&["status", "--table", "ledger; DROP TABLE scores"]);
    let settings = Settings::resolve(&cli, PodiumConfig::default(), no_env);

    let err = execute(&cli, &settings, &executor, &set).unwrap_err();
    assert!(matches!(err, CliError::Migration(MigrationError::InvalidTable(_))));
    assert!(executor.statements().is_empty());
}

fn scripted_set(journal: &Journal, failing: Option<&str>) -> MigrationSet {
    let migrations = [
        "m20240101000000_create_heats",
        "m20240102000000_create_lanes",
        "m20240103000000_create_judges",
    ]
    .into_iter()
    .map(|name| -> Box<dyn Migration> {
        let migration = TestMigration::new(name, journal);
        if failing == Some(name) {
            Box::new(migration.failing_up())
        } else {
            Box::new(migration)
        }
    })
    .collect();
    MigrationSet::from_migrations(migrations).unwrap()
}

#[test]
fn test_migrate_reports_completed_and_failed_migrations() {
    let executor = RecordingExecutor::new();
    let journal = new_journal();
    let set = scripted_set(&journal, Some("m20240102000000_create_lanes"));
    let cli = parse(&["migrate"]);
    let settings = Settings::resolve(&cli, PodiumConfig::default(), no_env);

    let err = execute_with_lock(&cli, &settings, &executor, &set, |_, _| Ok(())).unwrap_err();

    let run = match err {
        CliError::Run(run) => run,
        other => panic!("expected a run error, got {other:?}"),
    };
    assert_eq!(run.completed, vec!["m20240101000000_create_heats"]);
    assert_eq!(run.failed.as_deref(), Some("m20240102000000_create_lanes"));
    assert!(matches!(
        run.error,
        MigrationError::ScriptExecution { direction: MigrationDirection::Up, .. }
    ));

    // The third migration never starts and the failed one leaves no ledger write.
    assert_eq!(
        journal_entries(&journal),
        vec!["up:m20240101000000_create_heats", "up:m20240102000000_create_lanes"]
    );
    let statements = executor.statements();
    assert_eq!(statements.iter().filter(|s| s.starts_with("INSERT")).count(), 1);
    assert_eq!(statements.iter().filter(|s| *s == "COMMIT").count(), 1);
    assert_eq!(statements.last().map(String::as_str), Some("ROLLBACK"));
}

#[test]
fn test_migrate_success_holds_the_lock_for_the_run() {
    let executor = RecordingExecutor::new();
    let journal = new_journal();
    let set = scripted_set(&journal, None);
    let locks = Cell::new(0);

    for args in [&["status"][..], &["migrate", "--steps", "2"][..], &["rollback"][..]] {
        let cli = parse(args);
        let settings = Settings::resolve(&cli, PodiumConfig::default(), no_env);
        execute_with_lock(&cli, &settings, &executor, &set, |_, settings| {
            assert_eq!(settings.migrations.table, "podium_migrations");
            locks.set(locks.get() + 1);
            Ok(())
        })
        .unwrap();
    }

    assert_eq!(locks.get(), 2);
    assert_eq!(
        journal_entries(&journal),
        vec!["up:m20240101000000_create_heats", "up:m20240102000000_create_lanes"]
    );
    assert_eq!(executor.statements().iter().filter(|s| *s == "COMMIT").count(), 2);
}

#[test]
fn test_lock_failure_stops_before_any_migration() {
    let executor = RecordingExecutor::new();
    let journal = new_journal();
    let set = scripted_set(&journal, None);
    let cli = parse(&["migrate"]);
    let settings = Settings::resolve(&cli, PodiumConfig::default(), no_env);

    let err = execute_with_lock(&cli, &settings, &executor, &set, |_, _| -> Result<(), _> {
        Err(MigrationError::LockTimeout(format!(
            "{} is held by another session",
            settings.migrations.table
        )))
    })
    .unwrap_err();

    assert!(matches!(err, CliError::Migration(MigrationError::LockTimeout(_))));
    assert!(journal_entries(&journal).is_empty());
}
