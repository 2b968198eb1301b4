//! Podium Migration CLI Tool
//!
//! Applies and rolls back the platform's schema migrations. Exits non-zero at the
//! first failing migration after reporting what completed.

use clap::Parser;
use podium_migrate::{migrations, run, Cli};
use std::process;

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(e) = real_main(&cli) {
        // Run errors have already been reported step by step.
        if e.downcast_ref::<podium_migrate::CliError>()
            .map_or(true, |err| !matches!(err, podium_migrate::CliError::Run(_)))
        {
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

fn real_main(cli: &Cli) -> anyhow::Result<()> {
    let migrations = migrations::all()?;
    run(cli, &migrations)?;
    Ok(())
}
