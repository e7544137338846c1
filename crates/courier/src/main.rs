// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - a resilient notification relay.
//!
//! Polls configured sources, delivers items it has not seen before to their
//! webhooks, and records what was delivered so the next run skips it.

mod menu;
mod output;
mod wiring;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use courier_config::CourierConfig;
use courier_pipeline::install_signal_handler;
use tracing::error;

use crate::menu::Choice;

/// Exit status for an invalid selection or configuration error.
const EXIT_USAGE: u8 = 1;
/// Exit status when at least one source failed.
const EXIT_SOURCE_FAILED: u8 = 2;

/// Courier - deliver new items from your sources to webhooks, once.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Extra configuration file, applied after the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Short code of the source to run, or `all`. Opens a menu when omitted.
    #[arg(value_name = "SHORT_CODE")]
    target: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured sources and their short codes.
    List,
    /// Validate configuration and print the effective settings.
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match courier_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    init_tracing(&config.runtime.log_level);

    match cli.command {
        Some(Commands::List) => {
            output::print_sources(&config);
            ExitCode::SUCCESS
        }
        Some(Commands::Check) => check(&config),
        None => run(&config, cli.target).await,
    }
}

fn check(config: &CourierConfig) -> ExitCode {
    match courier_config::effective_toml(config) {
        Ok(toml) => {
            print!("{toml}");
            eprintln!("{}", "configuration OK".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            courier_config::render_errors(&[e]);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run(config: &CourierConfig, target: Option<String>) -> ExitCode {
    let code = match target {
        Some(code) => code,
        None => match menu::choose(config) {
            Ok(Choice::Code(code)) => code,
            Ok(Choice::Quit) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                return ExitCode::from(EXIT_USAGE);
            }
        },
    };

    let Some(selected) = wiring::select_sources(config, &code) else {
        eprintln!("{}: unknown source `{code}`", "error".red());
        if let Some(suggestion) = wiring::suggest_code(config, &code) {
            eprintln!("  did you mean `{suggestion}`?");
        }
        eprintln!("run `courier list` to see configured sources");
        return ExitCode::from(EXIT_USAGE);
    };

    let cancel = install_signal_handler();
    let result = wiring::run_sources(config, &selected, &cancel).await;
    cancel.cancel();

    match result {
        Ok(report) => {
            output::print_report(&report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_SOURCE_FAILED)
            }
        }
        Err(e) => {
            error!(error = %e, "run could not start");
            eprintln!("{}: {e}", "error".red());
            if matches!(e, courier_core::CourierError::Config(_)) {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::from(EXIT_SOURCE_FAILED)
            }
        }
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
