//! # Scan Gate
//!
//! A camera decoding a code in view reports the same payload many times a
//! second. The gate lets exactly one delivery through per arming and drops
//! the rest until the operator dismisses the captured result.
//!
//! ```text
//! Closed ──open──▶ Armed ──offer──▶ Captured ──dismiss──▶ Armed
//!    ▲               │                  │
//!    └─────close─────┴──────close───────┘
//! ```
//!
//! There is no timed re-arm; only `dismiss` (or re-opening) arms again.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State of the scan gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateState {
    /// Scanner not visible; every delivery is dropped.
    Closed,
    /// Waiting for one payload.
    Armed,
    /// Holding a captured payload for the operator.
    Captured,
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Closed => "CLOSED",
            Self::Armed => "ARMED",
            Self::Captured => "CAPTURED",
        };
        f.write_str(s)
    }
}

/// Errors from gate transitions.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GateError {
    /// `dismiss` requires a captured payload.
    #[error("nothing to dismiss: gate is {state}")]
    NotCaptured {
        /// State the gate was in.
        state: GateState,
    },
}

/// Binary debounce between a camera stream and the ledger.
#[derive(Debug, Clone)]
pub struct ScanGate {
    state: GateState,
    dropped: u64,
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanGate {
    /// A closed gate.
    pub fn new() -> Self {
        Self {
            state: GateState::Closed,
            dropped: 0,
        }
    }

    /// Show the scanner and arm for one payload (any → ARMED).
    pub fn open(&mut self) {
        self.state = GateState::Armed;
        self.dropped = 0;
    }

    /// Offer a delivery from the camera.
    ///
    /// Returns the payload when it is the one capture of this arming.
    /// Blank payloads never capture.
    pub fn offer<'a>(&mut self, payload: &'a str) -> Option<&'a str> {
        if self.state != GateState::Armed || payload.trim().is_empty() {
            self.dropped += 1;
            return None;
        }
        self.state = GateState::Captured;
        Some(payload)
    }

    /// Operator acknowledged the result; re-arm (CAPTURED → ARMED).
    pub fn dismiss(&mut self) -> Result<(), GateError> {
        if self.state != GateState::Captured {
            return Err(GateError::NotCaptured { state: self.state });
        }
        self.state = GateState::Armed;
        Ok(())
    }

    /// Hide the scanner (any → CLOSED).
    pub fn close(&mut self) {
        self.state = GateState::Closed;
    }

    /// Current state.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Deliveries dropped since the last `open`.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
