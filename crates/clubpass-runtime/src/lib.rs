//! # clubpass-runtime — Timers, Streams, and Sessions
//!
//! Drives the `clubpass-state` machines from a Tokio event loop.
//!
//! - **Countdown** (`countdown.rs`): one cancellable deadline per rotation
//!   window. The progress indicator and the rotation trigger both read the
//!   same countdown, so the bar and the token cannot drift apart.
//!
//! - **Rotation** (`rotation.rs`): [`start_rotation()`] spawns the task that
//!   re-issues the credential every window and returns a
//!   [`RotationHandle`]. Stopping or dropping the handle tears the task
//!   down; no callback fires afterwards.
//!
//! - **Profile** (`profile.rs`): the [`ProfileSource`] boundary. A fetch
//!   failure or an incomplete profile blocks issuance.
//!
//! - **Session** (`session.rs`): a [`ScanSession`] applies the scan gate to
//!   a camera stream and records captures into a shared ledger.
//!
//! - **Activity** (`activity.rs`): newest-first local history of what
//!   happened on this device.
//!
//! - **Config** (`config.rs`): YAML configuration with env overrides.

pub mod activity;
pub mod config;
pub mod countdown;
pub mod profile;
pub mod rotation;
pub mod session;

pub use activity::{ActivityLog, ActivityRecord, SharedActivityLog};
pub use config::{ClubpassConfig, ConfigError};
pub use countdown::{Countdown, ProgressBand};
pub use profile::{
    load_subject, open_credential, IssueError, ProfileError, ProfileSource, RawProfile,
    SessionContext, StaticProfileSource,
};
pub use rotation::{start_rotation, RotationHandle};
pub use session::{ScanSession, ScanSessionHandle, SharedLedger};
