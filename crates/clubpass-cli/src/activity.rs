//! # Activity Subcommand
//!
//! Shows the local activity history, newest first.

use anyhow::{bail, Result};
use clap::Args;
use clubpass_runtime::{ActivityLog, ClubpassConfig};

/// Arguments for the `clubpass activity` subcommand.
#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Show at most this many records.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Delete every record.
    #[arg(long)]
    pub clear: bool,
}

/// Execute the activity subcommand.
pub fn run_activity(args: &ActivityArgs, config: &ClubpassConfig) -> Result<u8> {
    let Some(path) = &config.activity_log_path else {
        bail!("no activity_log_path configured; history is not kept between runs");
    };
    let mut log = ActivityLog::open(path, config.activity_log_capacity);

    if args.clear {
        let removed = log.len();
        log.clear();
        log.flush()?;
        println!("OK: cleared {removed} activity records");
        return Ok(0);
    }

    for line in render(&log, args.limit) {
        println!("{line}");
    }
    Ok(0)
}

/// One line per record, newest first.
pub fn render(log: &ActivityLog, limit: usize) -> Vec<String> {
    if log.is_empty() {
        return vec!["(no activity)".to_string()];
    }
    log.entries()
        .take(limit)
        .map(|record| format!("{}  {}", record.timestamp, record.message))
        .collect()
}
