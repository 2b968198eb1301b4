//! Operator-facing rendering of runs, plans and status

use colored::Colorize;
use podium::migration::{Migration, MigrationDirection, MigrationReport, MigrationStatus, RunError};
use std::fmt::Write;

/// Print unless `--quiet`
pub fn say(quiet: bool, message: &str) {
    if !quiet {
        println!("{message}");
    }
}

pub fn format_report(report: &MigrationReport) -> String {
    let verb = match report.direction {
        MigrationDirection::Up => "Applied",
        MigrationDirection::Down => "Rolled back",
    };
    if report.is_empty() {
        return match report.direction {
            MigrationDirection::Up => "No pending migrations".to_string(),
            MigrationDirection::Down => "No applied migrations to roll back".to_string(),
        };
    }

    let mut out = String::new();
    for step in &report.steps {
        let _ = writeln!(
            out,
            "  {} {} ({}ms)",
            "✓".green(),
            step.name,
            step.elapsed.as_millis()
        );
    }
    let _ = write!(out, "{verb} {} migration(s)", report.len());
    out
}

/// Completed migrations, then the failing one with its error
pub fn format_run_error(err: &RunError) -> String {
    let mut out = String::new();
    for name in &err.completed {
        let _ = writeln!(out, "  {} {name}", "✓".green());
    }
    match &err.failed {
        Some(name) => {
            let _ = writeln!(out, "  {} {}", "✗".red(), name.bold());
            let _ = write!(out, "{} {}", "Error:".red().bold(), err.error);
        }
        None => {
            let _ = write!(out, "{} {}", "Error:".red().bold(), err.error);
        }
    }
    out
}

pub fn format_plan(action: &str, selected: &[&dyn Migration]) -> String {
    if selected.is_empty() {
        return format!("Nothing to {action}");
    }

    let mut out = format!("Would {action} {} migration(s):", selected.len());
    for (i, migration) in selected.iter().enumerate() {
        let _ = write!(out, "\n  {}. {}", i + 1, migration.name());
        if !migration.is_reversible() && action == "roll back" {
            let _ = write!(out, " {}", "(irreversible: ledger record only)".yellow());
        }
    }
    out
}

pub fn format_status(status: &MigrationStatus) -> String {
    let mut out = String::new();

    if status.applied.is_empty() {
        let _ = writeln!(out, "{}", "Applied: none".bold());
    } else {
        let _ = writeln!(out, "{}", format!("Applied ({}):", status.applied_count()).bold());
        for applied in &status.applied {
            let note = if applied.reversible { "" } else { " [irreversible]" };
            let _ = writeln!(
                out,
                "  {} {} ({}){note}",
                "✓".green(),
                applied.name,
                applied.executed_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    if status.pending.is_empty() {
        let _ = writeln!(out, "{}", "Pending: none".bold());
    } else {
        let _ = writeln!(out, "{}", format!("Pending ({}):", status.pending_count()).bold());
        for name in &status.pending {
            let _ = writeln!(out, "  {} {name}", "•".yellow());
        }
    }

    if !status.orphaned.is_empty() {
        let _ = writeln!(
            out,
            "{}",
            format!("Recorded without a script ({}):", status.orphaned.len()).red()
        );
        for record in &status.orphaned {
            let _ = writeln!(out, "  {} {}", "?".red(), record.name);
        }
    }

    let _ = write!(
        out,
        "Summary: {} applied, {} pending",
        status.applied_count(),
        status.pending_count()
    );
    out
}
