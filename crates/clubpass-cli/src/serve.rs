//! # Serve Subcommand
//!
//! Runs the check-in HTTP API until Ctrl-C. Guest lists are kept in
//! memory for the lifetime of the process.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Args;
use clubpass_api::AppState;
use clubpass_runtime::ClubpassConfig;

/// Arguments for the `clubpass serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,
}

/// Execute the serve subcommand.
pub fn run_serve(args: &ServeArgs, config: &ClubpassConfig) -> Result<u8> {
    let state = AppState::with_freshness(config.freshness_policy());
    tracing::info!(
        max_credential_age_ms = ?config.max_credential_age_ms,
        "starting check-in api"
    );
    crate::runtime()?
        .block_on(clubpass_api::serve(args.listen, state))
        .with_context(|| format!("server on {} failed", args.listen))?;
    Ok(0)
}
