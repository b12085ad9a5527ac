//! # Activity History
//!
//! Local, newest-first history of what happened on this device:
//! credentials shown, rotations stopped, scans recorded. Messages never
//! contain raw payloads.
//!
//! The history is best-effort. A missing or unreadable file loads as an
//! empty history; it never blocks issuance or scanning.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clubpass_core::Timestamp;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// An activity log shared between sessions.
pub type SharedActivityLog = Arc<Mutex<ActivityLog>>;

/// One history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// When it happened.
    pub timestamp: Timestamp,
    /// Human-readable description.
    pub message: String,
}

/// Bounded newest-first history.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    records: VecDeque<ActivityRecord>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl ActivityLog {
    /// An in-memory history holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
            path: None,
        }
    }

    /// Load the history stored at `path`, and persist back to it on
    /// [`flush()`](Self::flush).
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let mut log = Self::load(&path, capacity);
        log.path = Some(path);
        log
    }

    /// Read a history file. Missing or corrupt files give an empty history.
    pub fn load(path: &Path, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return log,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "activity log unreadable");
                return log;
            }
        };
        match serde_json::from_slice::<Vec<ActivityRecord>>(&bytes) {
            Ok(records) => {
                log.records = records.into_iter().take(log.capacity).collect();
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "activity log corrupt");
            }
        }
        log
    }

    /// Write the history to `path` as a JSON array, newest first.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(&self.records)?;
        std::fs::write(path, json)
    }

    /// Persist to the path given to [`open()`](Self::open), if any.
    pub fn flush(&self) -> std::io::Result<()> {
        match &self.path {
            Some(path) => self.save(path),
            None => Ok(()),
        }
    }

    /// Record a message now.
    pub fn record(&mut self, message: impl Into<String>) {
        self.record_at(message, Timestamp::now());
    }

    /// Record a message at a given instant.
    pub fn record_at(&mut self, message: impl Into<String>, timestamp: Timestamp) {
        self.records.push_front(ActivityRecord {
            timestamp,
            message: message.into(),
        });
        self.records.truncate(self.capacity);
    }

    /// Records, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter()
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&ActivityRecord> {
        self.records.front()
    }

    /// Maximum records retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Wrap for sharing.
    pub fn shared(self) -> SharedActivityLog {
        Arc::new(Mutex::new(self))
    }
}
