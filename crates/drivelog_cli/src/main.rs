//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `drivelog_core` linkage with deterministic output.
//! - Validate journal payload and persona files offline.

use clap::{Parser, Subcommand};
use drivelog_core::{parse_profiles, LoggingConfig, NewJournalEntry, ValidationError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Prints core ping/version when run without a subcommand.
#[derive(Debug, Parser)]
#[command(name = "drivelog_cli", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a journal entry create payload (JSON object)
    Validate {
        /// Path to the payload file
        path: PathBuf,
    },
    /// Validate a persona profile file (JSON array)
    Personas {
        /// Path to the profiles file
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    if let Some(config) = LoggingConfig::from_env() {
        if let Err(err) = config.and_then(drivelog_core::init_logging_with) {
            eprintln!("logging disabled: {err}");
        }
    }

    let cli = Cli::parse();
    match &cli.command {
        None => {
            println!("drivelog_core ping={}", drivelog_core::ping());
            println!("drivelog_core version={}", drivelog_core::core_version());
            ExitCode::SUCCESS
        }
        Some(Commands::Validate { path }) => run_validate(path),
        Some(Commands::Personas { path }) => run_personas(path),
    }
}

fn run_validate(path: &Path) -> ExitCode {
    let Some(text) = read_file(path) else {
        return ExitCode::FAILURE;
    };
    let value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("{}: not valid JSON: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };
    match NewJournalEntry::parse(&value) {
        Ok(entry) => {
            println!("ok place_name={} rating={}", entry.place_name, entry.rating);
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_violations("", &err);
            ExitCode::FAILURE
        }
    }
}

fn run_personas(path: &Path) -> ExitCode {
    let Some(text) = read_file(path) else {
        return ExitCode::FAILURE;
    };
    match parse_profiles(&text) {
        Ok(profiles) => {
            println!("ok profiles={}", profiles.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let prefix = err.index.map(|index| format!("[{index}] ")).unwrap_or_default();
            print_violations(&prefix, &err.error);
            ExitCode::FAILURE
        }
    }
}

fn read_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) => {
            eprintln!("{}: {err}", path.display());
            None
        }
    }
}

fn print_violations(prefix: &str, err: &ValidationError) {
    for violation in err.violations() {
        println!(
            "{prefix}{} [{}] {}",
            violation.field,
            violation.constraint.code(),
            violation.constraint
        );
    }
}
