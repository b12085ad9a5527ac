//! # Credential Freshness
//!
//! A rotating display token only limits replay if the scanning side looks
//! at the issuance time. The policy is opt-in: with no maximum age every
//! payload is unchecked, which matches a scanner that only dedups.
//!
//! Payloads that carry no issuance instant (third-party codes, older
//! profile codes) are never subject to the policy. A payload that carries
//! a rotation token is a credential, and one whose issuance instant cannot
//! be read is unverifiable rather than unchecked.

use std::time::Duration;

use clubpass_core::{PayloadView, Timestamp};
use serde::{Deserialize, Serialize};

/// Maximum accepted credential age at scan time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessPolicy {
    /// `None` disables the check.
    pub max_age: Option<Duration>,
}

/// Result of a freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Within the allowed age.
    Fresh,
    /// Outside the allowed age. Negative ages are issued in the future.
    Stale {
        /// Signed age in milliseconds at scan time.
        age_ms: i64,
    },
    /// Credential whose issuance instant cannot be read.
    Unverifiable,
    /// Policy disabled, or payload carries no issuance instant.
    Unchecked,
}

impl FreshnessPolicy {
    /// No age limit.
    pub fn disabled() -> Self {
        Self { max_age: None }
    }

    /// Reject credentials older than `max_age`.
    pub fn max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
        }
    }

    /// Check a scanned payload against `now`.
    pub fn check_view(&self, view: &PayloadView, now: Timestamp) -> Freshness {
        if self.max_age.is_some() && view.issued_at_invalid {
            return Freshness::Unverifiable;
        }
        self.check(view.issued_at, now)
    }

    /// Check an issuance instant against `now`.
    ///
    /// Clock skew is tolerated symmetrically: an instant up to `max_age`
    /// in the future is still fresh.
    pub fn check(&self, issued_at: Option<Timestamp>, now: Timestamp) -> Freshness {
        let (Some(max_age), Some(issued_at)) = (self.max_age, issued_at) else {
            return Freshness::Unchecked;
        };
        let limit = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let age_ms = now.millis_since(&issued_at);
        if age_ms.unsigned_abs() > limit.unsigned_abs() {
            Freshness::Stale { age_ms }
        } else {
            Freshness::Fresh
        }
    }
}
