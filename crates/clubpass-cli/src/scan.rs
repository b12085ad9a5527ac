//! # Scan Subcommand
//!
//! Door scanning without a camera: each input line is one camera
//! delivery. A captured line is recorded into the event's guest list and
//! the result is acknowledged immediately, as a staff member tapping
//! "next guest" would. Blank lines never capture.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use clubpass_core::EventId;
use clubpass_runtime::{ClubpassConfig, ScanSession, SharedLedger};
use clubpass_state::{GuestScanLedger, ScanOutcome};
use parking_lot::Mutex;

/// Arguments for the `clubpass scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Event being checked into.
    #[arg(long)]
    pub event: String,

    /// File of decoded payloads, one per line. Standard input when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

/// Counts of what happened during a scan run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    /// Guests added to the list.
    pub accepted: usize,
    /// Guests already on the list.
    pub duplicate: usize,
    /// Credentials outside the freshness window.
    pub stale: usize,
    /// Captures that carried nothing to record.
    pub ignored: usize,
}

impl ScanSummary {
    fn count(&mut self, outcome: &ScanOutcome) {
        match outcome {
            ScanOutcome::Accepted { .. } => self.accepted += 1,
            ScanOutcome::Duplicate { .. } => self.duplicate += 1,
            ScanOutcome::Stale { .. } => self.stale += 1,
            ScanOutcome::Ignored => self.ignored += 1,
        }
    }
}

/// Execute the scan subcommand.
pub fn run_scan(args: &ScanArgs, config: &ClubpassConfig) -> Result<u8> {
    let event_id = EventId::new(&args.event).context("--event must not be empty")?;
    let ledger: SharedLedger = Arc::new(Mutex::new(GuestScanLedger::with_policy(
        config.freshness_policy(),
    )));
    let activity = crate::open_activity(config);
    let mut session =
        ScanSession::open(event_id.clone(), Arc::clone(&ledger)).with_activity(Arc::clone(&activity));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            scan_lines(BufReader::new(file), &mut session, &mut out)?
        }
        None => scan_lines(std::io::stdin().lock(), &mut session, &mut out)?,
    };
    session.close();
    crate::flush_activity(&activity);

    let ledger = ledger.lock();
    let guests = ledger.guest_list(event_id.as_str());
    writeln!(out, "Guests for {} ({}):", event_id, guests.len())?;
    for (n, record) in guests.iter().enumerate() {
        writeln!(out, "  {:>3}. {}  [{}]", n + 1, record.display_label, record.scanned_at)?;
    }
    writeln!(
        out,
        "accepted={} duplicate={} stale={} ignored={}",
        summary.accepted, summary.duplicate, summary.stale, summary.ignored
    )?;
    Ok(0)
}

/// Offer each line to `session`, writing one result line per capture.
pub fn scan_lines<R, W>(reader: R, session: &mut ScanSession, out: &mut W) -> Result<ScanSummary>
where
    R: BufRead,
    W: Write,
{
    let mut summary = ScanSummary::default();
    for line in reader.lines() {
        let line = line.context("failed to read input")?;
        let Some(outcome) = session.on_payload(&line) else {
            continue;
        };
        summary.count(&outcome);
        writeln!(out, "{outcome}")?;
        session.dismiss()?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ADA: &str = r#"{"nombre":"Ada","id":"A0123","correo":"ada@uni.edu"}"#;

    fn make_session() -> (ScanSession, SharedLedger) {
        let ledger: SharedLedger = Arc::new(Mutex::new(GuestScanLedger::new()));
        let session = ScanSession::open(EventId::new("expo").unwrap(), Arc::clone(&ledger));
        (session, ledger)
    }

    #[test]
    fn test_scan_lines_dedups() {
        let (mut session, ledger) = make_session();
        let input = format!("{ADA}\n\nVISITOR-42\n{ADA}\n");
        let mut out = Vec::new();
        let summary = scan_lines(Cursor::new(input), &mut session, &mut out).unwrap();

        assert_eq!(
            summary,
            ScanSummary {
                accepted: 2,
                duplicate: 1,
                stale: 0,
                ignored: 0
            }
        );
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "accepted: Name: Ada • ID: A0123 • Email: ada@uni.edu",
                "accepted: VISITOR-42",
                "duplicate: Name: Ada • ID: A0123 • Email: ada@uni.edu",
            ]
        );
        assert_eq!(ledger.lock().guest_list("expo").len(), 2);
    }

    #[test]
    fn test_run_scan_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("frames.txt");
        std::fs::write(&input, format!("{ADA}\n{ADA}\n")).unwrap();
        let args = ScanArgs {
            event: "expo".to_string(),
            input: Some(input),
        };
        assert_eq!(run_scan(&args, &ClubpassConfig::default()).unwrap(), 0);
    }

    #[test]
    fn test_blank_event_rejected() {
        let args = ScanArgs {
            event: " ".to_string(),
            input: None,
        };
        assert!(run_scan(&args, &ClubpassConfig::default()).is_err());
    }
}
