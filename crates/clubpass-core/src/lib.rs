//! # clubpass-core — Foundational Types for Club Check-In
//!
//! This crate defines the types every other `clubpass-*` crate is built on.
//! It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `SubjectId` and `EventId` are validated at
//!    construction (non-empty, trimmed). No bare strings for keys.
//!
//! 2. **Credentials are superseded, never mutated.** An
//!    [`IdentityCredential`] is built once per rotation window from a
//!    [`SubjectProfile`] and a [`RotationToken`]; the next window builds a
//!    new one.
//!
//! 3. **Deterministic encoding.** [`codec::encode()`] goes through
//!    [`CanonicalBytes`] (RFC 8785 JCS), so one credential always produces
//!    one payload string.
//!
//! 4. **Decoding for display never fails.** [`codec::decode_for_display()`]
//!    degrades to the raw scanned string for anything it cannot interpret.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `clubpass-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod codec;
pub mod credential;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use codec::{decode, decode_for_display, encode, inspect, PayloadView, LABEL_SEPARATOR};
pub use credential::{IdentityCredential, RotationToken};
pub use digest::PayloadDigest;
pub use error::{CanonicalizationError, ClubpassError, CodecError};
pub use identity::{EventId, SubjectId, SubjectProfile};
pub use temporal::Timestamp;
