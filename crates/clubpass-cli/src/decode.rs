//! # Decode Subcommand
//!
//! Shows what a scanner would display for a payload. `--strict` instead
//! requires a full credential and prints its fields as JSON.

use anyhow::{Context, Result};
use clap::Args;
use clubpass_core::codec;
use clubpass_runtime::ClubpassConfig;

/// Arguments for the `clubpass decode` subcommand.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Payload text. Read from standard input when omitted.
    pub payload: Option<String>,

    /// Require a complete credential and print it as JSON.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the decode subcommand.
pub fn run_decode(args: &DecodeArgs, _config: &ClubpassConfig) -> Result<u8> {
    let payload = match &args.payload {
        Some(payload) => payload.clone(),
        None => crate::read_stdin()?,
    };
    let output = if args.strict {
        render_strict(&payload)?
    } else {
        render_display(&payload)
    };
    println!("{output}");
    Ok(0)
}

/// Label plus issuance time, when the payload carries one.
pub fn render_display(payload: &str) -> String {
    let view = codec::inspect(payload);
    match view.issued_at {
        Some(issued_at) => format!("{}\nIssued: {}", view.label, issued_at),
        None => view.label,
    }
}

/// Pretty JSON of a strictly decoded credential.
pub fn render_strict(payload: &str) -> Result<String> {
    let credential = codec::decode(payload).context("payload is not a clubpass credential")?;
    serde_json::to_string_pretty(&credential).context("failed to render credential")
}
