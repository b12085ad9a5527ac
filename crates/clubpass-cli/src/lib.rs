//! # clubpass-cli — CLI Tool for Club Check-In
//!
//! Provides the `clubpass` command-line interface.
//!
//! ## Subcommands
//!
//! - `clubpass issue` — Show a holder's rotating credential payloads.
//! - `clubpass decode` — Label a scanned payload, or strictly decode it.
//! - `clubpass scan` — Feed camera deliveries (one per line) into an
//!   event's guest list.
//! - `clubpass activity` — Show or clear the local activity history.
//! - `clubpass serve` — Run the check-in HTTP API.
//!
//! ```bash
//! clubpass issue --profiles profiles.yaml --session dev --rotations 3
//! clubpass decode '{"nombre":"Ada","id":"A0123","correo":"ada@uni.edu"}'
//! clubpass scan --event welcome-week --input frames.txt
//! clubpass -v serve --listen 0.0.0.0:8080
//! ```

pub mod activity;
pub mod decode;
pub mod issue;
pub mod scan;
pub mod serve;

use std::io::Read;

use anyhow::{Context, Result};
use clubpass_runtime::{ActivityLog, ClubpassConfig, SharedActivityLog};

/// Open the configured activity history (in memory when no path is set).
pub fn open_activity(config: &ClubpassConfig) -> SharedActivityLog {
    match &config.activity_log_path {
        Some(path) => ActivityLog::open(path, config.activity_log_capacity),
        None => ActivityLog::new(config.activity_log_capacity),
    }
    .shared()
}

/// Persist the activity history. Failures are logged, never fatal.
pub fn flush_activity(activity: &SharedActivityLog) {
    if let Err(err) = activity.lock().flush() {
        tracing::warn!(error = %err, "failed to persist activity log");
    }
}

/// Read all of standard input, trimmed of the trailing newline.
pub fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read standard input")?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}

/// Build the single-threaded runtime async subcommands run on.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_in_memory_without_path() {
        let config = ClubpassConfig::default();
        let activity = open_activity(&config);
        activity.lock().record("credential shown");
        flush_activity(&activity);
        assert_eq!(activity.lock().len(), 1);
    }

    #[test]
    fn test_activity_persisted_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClubpassConfig {
            activity_log_path: Some(dir.path().join("activity.json")),
            ..ClubpassConfig::default()
        };
        let activity = open_activity(&config);
        activity.lock().record("credential shown");
        flush_activity(&activity);

        let reopened = open_activity(&config);
        assert_eq!(reopened.lock().len(), 1);
    }
}
