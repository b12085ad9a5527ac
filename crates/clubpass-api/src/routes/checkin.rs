//! # Check-In Routes
//!
//! HTTP surface for event staff. Scanning devices post what their camera
//! decoded; the server dedups per event and answers with the outcome so
//! the device can show "checked in" or "already scanned".
//!
//! Routes:
//! - POST /v1/events/{event_id}/scans — record a scanned payload
//! - GET  /v1/events/{event_id}/guests — guest list in scan order
//! - GET  /v1/events — events with at least one guest
//! - POST /v1/payloads/inspect — label a payload without recording it
//!
//! Duplicate and stale scans are answered with `200` and
//! `accepted: false`. They are not errors.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clubpass_core::{codec, EventId, Timestamp};
use clubpass_state::{ScanOutcome, ScanRecord};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// A payload as decoded by a scanning device.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Decoded QR text.
    pub payload: String,
}

/// Outcome of a scan.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResponse {
    /// Event the scan was recorded against.
    pub event_id: String,
    /// Whether the guest was added to the list.
    pub accepted: bool,
    /// `accepted`, `duplicate`, `stale` or `ignored`.
    pub status: String,
    /// Display label of the guest, absent for ignored scans.
    pub label: Option<String>,
    /// Credential age in milliseconds, stale scans only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<i64>,
}

/// One guest in a guest list response.
#[derive(Debug, Serialize, Deserialize)]
pub struct GuestEntry {
    /// Display label the guest was deduplicated on.
    pub label: String,
    /// When the scan was accepted (RFC 3339, UTC).
    pub scanned_at: String,
    /// SHA-256 hex of the raw payload.
    pub digest: String,
}

/// Guest list of one event.
#[derive(Debug, Serialize, Deserialize)]
pub struct GuestListResponse {
    /// Event the list belongs to.
    pub event_id: String,
    /// Number of guests.
    pub total: usize,
    /// Guests in scan order.
    pub guests: Vec<GuestEntry>,
}

/// Event with its guest count.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event identifier.
    pub event_id: String,
    /// Guests checked in so far.
    pub guests: usize,
}

/// Display interpretation of a payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectResponse {
    /// What a scanner would display.
    pub label: String,
    /// Whether any identity field was found in the payload.
    pub recognized: bool,
    /// Issuance time of a credential payload (RFC 3339, UTC).
    pub issued_at: Option<String>,
}

impl ScanResponse {
    fn new(event_id: &EventId, outcome: &ScanOutcome) -> Self {
        let age_ms = match outcome {
            ScanOutcome::Stale { age_ms, .. } => *age_ms,
            _ => None,
        };
        Self {
            event_id: event_id.as_str().to_string(),
            accepted: outcome.accepted(),
            status: outcome.as_str().to_string(),
            label: outcome.label().map(str::to_string),
            age_ms,
        }
    }
}

impl From<&ScanRecord> for GuestEntry {
    fn from(record: &ScanRecord) -> Self {
        Self {
            label: record.display_label.clone(),
            scanned_at: record.scanned_at.to_iso8601(),
            digest: record.digest.to_hex(),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the check-in router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/events", get(list_events))
        .route("/v1/events/{event_id}/scans", post(record_scan))
        .route("/v1/events/{event_id}/guests", get(guest_list))
        .route("/v1/payloads/inspect", post(inspect_payload))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_event_id(raw: &str) -> Result<EventId, AppError> {
    EventId::new(raw).map_err(|_| AppError::Validation("event id must not be empty".to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/events/{event_id}/scans — Record a scanned payload.
async fn record_scan(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(req): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ScanResponse>), AppError> {
    let event_id = parse_event_id(&event_id)?;
    let outcome = state.record_scan(event_id.as_str(), &req.payload, Timestamp::now())?;
    let status = if outcome.accepted() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ScanResponse::new(&event_id, &outcome))))
}

/// GET /v1/events/{event_id}/guests — Guest list in scan order.
async fn guest_list(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<GuestListResponse>, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let guests: Vec<GuestEntry> = state.guest_list(&event_id).iter().map(GuestEntry::from).collect();
    Ok(Json(GuestListResponse {
        event_id: event_id.as_str().to_string(),
        total: guests.len(),
        guests,
    }))
}

/// GET /v1/events — Events with at least one guest.
async fn list_events(State(state): State<AppState>) -> Json<Vec<EventSummary>> {
    let events = state
        .event_summaries()
        .into_iter()
        .map(|(event_id, guests)| EventSummary {
            event_id: event_id.as_str().to_string(),
            guests,
        })
        .collect();
    Json(events)
}

/// POST /v1/payloads/inspect — Label a payload without recording it.
async fn inspect_payload(Json(req): Json<ScanRequest>) -> Json<InspectResponse> {
    let view = codec::inspect(&req.payload);
    Json(InspectResponse {
        label: view.label,
        recognized: view.recognized,
        issued_at: view.issued_at.map(|t| t.to_iso8601()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
