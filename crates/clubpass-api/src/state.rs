//! # Application State
//!
//! In-memory guest lists shared by every handler. Cheaply cloneable via
//! `Arc`; all clones see the same lists.
//!
//! Several staff members may scan for the same event at once. A scan
//! holds the event's map entry for the whole duplicate-check-and-append,
//! so two devices scanning the same guest cannot both be accepted.

use std::sync::Arc;

use clubpass_core::{EventId, Timestamp};
use clubpass_state::{EventGuestList, FreshnessPolicy, LedgerError, ScanOutcome, ScanRecord};
use dashmap::DashMap;

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    guest_lists: Arc<DashMap<EventId, EventGuestList>>,
    freshness: FreshnessPolicy,
}

impl AppState {
    /// Empty state without a freshness limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty state enforcing `freshness` on scanned credentials.
    pub fn with_freshness(freshness: FreshnessPolicy) -> Self {
        Self {
            guest_lists: Arc::new(DashMap::new()),
            freshness,
        }
    }

    /// Freshness policy in force.
    pub fn freshness(&self) -> FreshnessPolicy {
        self.freshness
    }

    /// Record a scan for `event_id` as of `now`.
    pub fn record_scan(
        &self,
        event_id: &str,
        raw: &str,
        now: Timestamp,
    ) -> Result<ScanOutcome, LedgerError> {
        let event_id = EventId::new(event_id).map_err(|_| LedgerError::EmptyEventId)?;
        if raw.trim().is_empty() {
            return Ok(ScanOutcome::Ignored);
        }
        let mut list = self
            .guest_lists
            .entry(event_id.clone())
            .or_insert_with(|| EventGuestList::new(event_id));
        Ok(list.record(raw, &self.freshness, now))
    }

    /// Snapshot of an event's guests in scan order; empty if none.
    pub fn guest_list(&self, event_id: &EventId) -> Vec<ScanRecord> {
        self.guest_lists
            .get(event_id)
            .map(|list| list.entries().to_vec())
            .unwrap_or_default()
    }

    /// Events with at least one guest, with guest counts, sorted by id.
    pub fn event_summaries(&self) -> Vec<(EventId, usize)> {
        let mut events: Vec<_> = self
            .guest_lists
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect();
        events.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        events
    }
}
