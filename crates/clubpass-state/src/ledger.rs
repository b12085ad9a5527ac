//! # Guest Scan Ledger
//!
//! Per-event record of who has checked in. Each event owns an
//! [`EventGuestList`]: scan records in scan order, unique by display
//! label. Scanning the same credential twice for one event is reported as
//! a duplicate and changes nothing; the same credential at another event
//! is an independent check-in.
//!
//! ## Invariants
//!
//! - Labels are unique within one guest list.
//! - Entries are append-only, in scan order.
//! - A guest list exists only once a scan has been recorded for it.
//! - Blank payloads are ignored without creating a list.
//!
//! `record_scan` takes `&mut self`: the duplicate check and the append
//! happen under one borrow. Sharing a ledger between several scanners
//! therefore needs an explicit lock around it.

use std::collections::{HashMap, HashSet};

use clubpass_core::{codec, EventId, PayloadDigest, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::freshness::{Freshness, FreshnessPolicy};

/// Errors from ledger operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// The event id was blank.
    #[error("event id must not be empty")]
    EmptyEventId,
}

/// One checked-in guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Payload exactly as captured.
    pub raw_payload: String,
    /// Label derived from the payload.
    pub display_label: String,
    /// Digest of the raw payload, for logs.
    pub digest: PayloadDigest,
    /// When the scan was recorded.
    pub scanned_at: Timestamp,
}

/// Result of offering a payload to a guest list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// New guest appended.
    Accepted {
        /// Display label of the guest.
        label: String,
    },
    /// Label already present; nothing changed.
    Duplicate {
        /// Display label of the guest.
        label: String,
    },
    /// Credential older than the freshness policy allows, or with an
    /// unreadable issuance instant; nothing changed.
    Stale {
        /// Display label of the guest.
        label: String,
        /// Signed credential age at scan time, `None` when unreadable.
        age_ms: Option<i64>,
    },
    /// Blank payload; nothing changed.
    Ignored,
}

impl ScanOutcome {
    /// Whether a guest was appended.
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Display label, if the payload was interpreted.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Accepted { label } | Self::Duplicate { label } | Self::Stale { label, .. } => {
                Some(label)
            }
            Self::Ignored => None,
        }
    }

    /// Short status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Duplicate { .. } => "duplicate",
            Self::Stale { .. } => "stale",
            Self::Ignored => "ignored",
        }
    }
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{}: {label}", self.as_str()),
            None => f.write_str(self.as_str()),
        }
    }
}

// ─── Event Guest List ────────────────────────────────────────────────

/// Ordered, label-deduplicated guests of one event.
#[derive(Debug, Clone)]
pub struct EventGuestList {
    event_id: EventId,
    entries: Vec<ScanRecord>,
    labels: HashSet<String>,
}

impl EventGuestList {
    /// An empty guest list.
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            entries: Vec::new(),
            labels: HashSet::new(),
        }
    }

    /// Check a payload in.
    pub fn record(&mut self, raw: &str, policy: &FreshnessPolicy, now: Timestamp) -> ScanOutcome {
        if raw.trim().is_empty() {
            return ScanOutcome::Ignored;
        }
        let view = codec::inspect(raw);
        let digest = PayloadDigest::of(raw);

        match policy.check_view(&view, now) {
            Freshness::Stale { age_ms } => {
                tracing::info!(event = %self.event_id, digest = %digest.short(), age_ms, "stale credential rejected");
                return ScanOutcome::Stale {
                    label: view.label,
                    age_ms: Some(age_ms),
                };
            }
            Freshness::Unverifiable => {
                tracing::warn!(event = %self.event_id, digest = %digest.short(), "credential issue time unreadable");
                return ScanOutcome::Stale {
                    label: view.label,
                    age_ms: None,
                };
            }
            Freshness::Fresh | Freshness::Unchecked => {}
        }

        if self.labels.contains(&view.label) {
            tracing::debug!(event = %self.event_id, digest = %digest.short(), "duplicate scan");
            return ScanOutcome::Duplicate { label: view.label };
        }

        self.labels.insert(view.label.clone());
        self.entries.push(ScanRecord {
            raw_payload: raw.to_string(),
            display_label: view.label.clone(),
            digest,
            scanned_at: now,
        });
        tracing::info!(
            event = %self.event_id,
            digest = %digest.short(),
            guests = self.entries.len(),
            "guest checked in"
        );
        ScanOutcome::Accepted { label: view.label }
    }

    /// Event this list belongs to.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Guests in scan order.
    pub fn entries(&self) -> &[ScanRecord] {
        &self.entries
    }

    /// Whether `label` has checked in.
    pub fn contains_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Number of guests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nobody has checked in.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── Guest Scan Ledger ───────────────────────────────────────────────

/// Guest lists for every event scanned in this session.
#[derive(Debug, Clone, Default)]
pub struct GuestScanLedger {
    lists: HashMap<EventId, EventGuestList>,
    policy: FreshnessPolicy,
}

impl GuestScanLedger {
    /// An empty ledger without a freshness limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty ledger enforcing `policy`.
    pub fn with_policy(policy: FreshnessPolicy) -> Self {
        Self {
            lists: HashMap::new(),
            policy,
        }
    }

    /// Freshness policy in force.
    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }

    /// Record a scan for `event_id` at the current time.
    pub fn record_scan(&mut self, event_id: &str, raw: &str) -> Result<ScanOutcome, LedgerError> {
        self.record_scan_at(event_id, raw, Timestamp::now())
    }

    /// Record a scan for `event_id` as of `now`.
    pub fn record_scan_at(
        &mut self,
        event_id: &str,
        raw: &str,
        now: Timestamp,
    ) -> Result<ScanOutcome, LedgerError> {
        let event_id = EventId::new(event_id).map_err(|_| LedgerError::EmptyEventId)?;
        if raw.trim().is_empty() {
            return Ok(ScanOutcome::Ignored);
        }
        let policy = self.policy;
        let list = self
            .lists
            .entry(event_id.clone())
            .or_insert_with(|| EventGuestList::new(event_id));
        Ok(list.record(raw, &policy, now))
    }

    /// Guests of `event_id` in scan order; empty if none recorded.
    pub fn guest_list(&self, event_id: &str) -> &[ScanRecord] {
        EventId::new(event_id)
            .ok()
            .and_then(|id| self.lists.get(&id))
            .map(EventGuestList::entries)
            .unwrap_or(&[])
    }

    /// Events with at least one recorded scan.
    pub fn event_ids(&self) -> impl Iterator<Item = &EventId> {
        self.lists.keys()
    }
}
