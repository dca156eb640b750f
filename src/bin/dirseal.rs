//! dirseal CLI binary.
//!
//! Exit codes: 0 on success, 1 on validation failure, 2 on any other error.
//! Stdout carries manifest bytes only; logs and error reports go to stderr.

use clap::Parser;
use dirseal::cli::{Cli, CommandOutcome, RunContext};
use dirseal::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(2);
    }

    let context = RunContext::new();
    match context.execute(&cli.command) {
        Ok(CommandOutcome::Success) => {
            info!("command completed");
        }
        Ok(CommandOutcome::ValidationFailed(issues)) => {
            eprintln!("Verification errors:");
            for issue in &issues {
                eprintln!("- {}", issue);
            }
            process::exit(1);
        }
        Err(e) => {
            error!("command failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

/// Build logging configuration from CLI args and environment. Logging stays
/// off unless --verbose or an explicit level is given.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = LoggingConfig::default();
    if !cli.verbose && cli.log_level.is_none() {
        config.level = "off".to_string();
        return config;
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    config
}
