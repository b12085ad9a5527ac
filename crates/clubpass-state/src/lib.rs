//! # clubpass-state — Check-In State Machines
//!
//! The state machines behind credential display and guest check-in. None
//! of them read a clock or spawn anything: window expiries, scan instants
//! and scanned payloads are explicit inputs, so every transition is
//! reproducible in a unit test. `clubpass-runtime` drives them from real timers and streams.
//!
//! ## State Machines
//!
//! - **Rotation** (`rotation.rs`): `Idle → Active(n) → Active(n+1) → … → Stopped`.
//!   Entering `Active` always starts a full-length window. Consecutive
//!   tokens never repeat.
//!
//! - **Gate** (`gate.rs`): `Closed → Armed → Captured → (dismiss) → Armed`.
//!   At most one captured payload awaits the operator at a time.
//!
//! - **Ledger** (`ledger.rs`): per-event, ordered, label-deduplicated guest
//!   lists. `record_scan` is the only mutator and takes `&mut self`, so
//!   check-then-append is one critical section by construction.
//!
//! - **Freshness** (`freshness.rs`): optional maximum credential age
//!   enforced at scan time.

pub mod freshness;
pub mod gate;
pub mod ledger;
pub mod rotation;

pub use freshness::{Freshness, FreshnessPolicy};
pub use gate::{GateError, GateState, ScanGate};
pub use ledger::{EventGuestList, GuestScanLedger, LedgerError, ScanOutcome, ScanRecord};
pub use rotation::{
    ClockTokens, RandomTokens, RotationError, RotationState, TokenRotation, TokenSource,
};
