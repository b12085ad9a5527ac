//! # Identity Credentials
//!
//! An [`IdentityCredential`] is the structured payload rendered into a
//! holder's scannable code. It is valid for one rotation window: when the
//! window elapses a new credential with a fresh [`RotationToken`] replaces
//! it. Credentials are never mutated in place.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{SubjectId, SubjectProfile};
use crate::temporal::Timestamp;

/// Opaque token identifying one issuance window.
///
/// Tokens only need to be unique within the observed rotation period;
/// consecutive tokens must differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotationToken(String);

impl RotationToken {
    /// Generate a random token (UUID v4, simple form).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing token string.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Access the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for RotationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A time-boxed identity credential for one holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCredential {
    /// Display name of the holder.
    pub subject_name: String,
    /// Institutional identifier.
    pub subject_id: SubjectId,
    /// Contact email.
    pub subject_contact: String,
    /// Token of the issuance window.
    pub issued_token: RotationToken,
    /// When this credential was issued.
    pub issued_at: Timestamp,
}

impl IdentityCredential {
    /// Build a credential for `profile` under `token`.
    ///
    /// Pure construction; the profile has already been validated.
    pub fn issue(profile: &SubjectProfile, token: RotationToken, issued_at: Timestamp) -> Self {
        Self {
            subject_name: profile.name.clone(),
            subject_id: profile.id.clone(),
            subject_contact: profile.contact.clone(),
            issued_token: token,
            issued_at,
        }
    }

    /// Milliseconds elapsed between issuance and `now`.
    pub fn age_millis(&self, now: &Timestamp) -> i64 {
        now.millis_since(&self.issued_at)
    }
}
