//! # clubpass CLI entry point
//!
//! Parses command-line arguments, loads configuration, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clubpass_cli::activity::{run_activity, ActivityArgs};
use clubpass_cli::decode::{run_decode, DecodeArgs};
use clubpass_cli::issue::{run_issue, IssueArgs};
use clubpass_cli::scan::{run_scan, ScanArgs};
use clubpass_cli::serve::{run_serve, ServeArgs};
use clubpass_runtime::ClubpassConfig;

/// clubpass — rotating QR identity credentials and event check-in.
#[derive(Parser, Debug)]
#[command(name = "clubpass", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a holder's rotating credential payloads.
    Issue(IssueArgs),

    /// Label a scanned payload, or strictly decode a credential.
    Decode(DecodeArgs),

    /// Record camera deliveries (one per line) into an event's guest list.
    Scan(ScanArgs),

    /// Show or clear the local activity history.
    Activity(ActivityArgs),

    /// Run the check-in HTTP API.
    Serve(ServeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match ClubpassConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(2);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let result = match cli.command {
        Commands::Issue(args) => run_issue(&args, &config),
        Commands::Decode(args) => run_decode(&args, &config),
        Commands::Scan(args) => run_scan(&args, &config),
        Commands::Activity(args) => run_activity(&args, &config),
        Commands::Serve(args) => run_serve(&args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
