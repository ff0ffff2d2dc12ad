#![deny(missing_docs)]

//! # Fern Loader CLI
//!
//! Command line driver for the API workspace loader.
//!
//! Supported Commands:
//! - `check`: Loads a workspace and reports diagnostics.
//! - `ir`: Prints the full load result as JSON.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

mod check;
mod error;
mod ir;

const LOG_ENV: &str = "FERN_LOADER_LOG";

#[derive(Parser, Debug)]
#[clap(author, version, about = "API workspace loader")]
struct Cli {
    /// Log debug output to stderr.
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a workspace and report whether it is valid.
    Check(check::CheckArgs),
    /// Load a workspace and print the result as JSON.
    Ir(ir::IrArgs),
}

fn init_tracing(verbose: bool) -> CliResult<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

fn run(cli: &Cli) -> CliResult<bool> {
    match &cli.command {
        Commands::Check(args) => check::execute(args),
        Commands::Ir(args) => ir::execute(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{}", e);
        return ExitCode::from(2);
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}
