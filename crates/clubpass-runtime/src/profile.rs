//! # Profile Source
//!
//! The holder's name, id and contact come from an upstream profile
//! service keyed by the signed-in session. A fetch can fail, and a fetched
//! profile can be missing fields; both block issuance. A credential is
//! never shown with placeholder fields.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use clubpass_core::{IdentityCredential, SubjectId, SubjectProfile};
use clubpass_state::{RotationError, TokenSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::SharedActivityLog;
use crate::rotation::{start_rotation, RotationHandle};

/// Errors obtaining a subject profile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The upstream fetch failed. Retrying may succeed.
    #[error("profile unavailable for session {session}: {reason}")]
    Unavailable {
        /// Session the fetch was for.
        session: String,
        /// Upstream failure description.
        reason: String,
    },

    /// The profile lacks a required field.
    #[error("profile is missing required field: {field}")]
    Incomplete {
        /// Name of the missing field.
        field: &'static str,
    },
}

/// Errors opening a rotating credential display.
#[derive(Error, Debug)]
pub enum IssueError {
    /// No complete profile could be obtained.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// The rotation could not be started.
    #[error(transparent)]
    Rotation(#[from] RotationError),
}

/// The signed-in session a profile is fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    /// Opaque session identity.
    pub session_id: String,
}

impl SessionContext {
    /// Wrap a session identity.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}

/// A profile as delivered upstream; any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProfile {
    /// Display name.
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    /// Institutional identifier.
    #[serde(default, alias = "matricula")]
    pub id: Option<String>,
    /// Contact email.
    #[serde(default, alias = "email", alias = "correo")]
    pub contact: Option<String>,
}

impl RawProfile {
    /// Validate into a [`SubjectProfile`].
    pub fn into_subject(self) -> Result<SubjectProfile, ProfileError> {
        let name = required(self.name, "name")?;
        let id = required(self.id, "id")?;
        let contact = required(self.contact, "contact")?;
        let id = SubjectId::new(id).map_err(|_| ProfileError::Incomplete { field: "id" })?;
        SubjectProfile::new(name, id, contact).map_err(|_| ProfileError::Incomplete {
            field: "profile",
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ProfileError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ProfileError::Incomplete { field }),
    }
}

/// Read-only profile lookup.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the raw profile for a session.
    async fn fetch_profile(&self, session: &SessionContext) -> Result<RawProfile, ProfileError>;
}

/// In-memory profiles keyed by session id, loadable from YAML.
///
/// ```yaml
/// dev-session:
///   name: Ada Lovelace
///   id: A0123
///   contact: ada@uni.edu
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticProfileSource {
    profiles: HashMap<String, RawProfile>,
}

impl StaticProfileSource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML map of session id to profile.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        Ok(Self {
            profiles: serde_yaml::from_str(text)?,
        })
    }

    /// Register a profile for a session.
    pub fn insert(&mut self, session_id: impl Into<String>, profile: RawProfile) {
        self.profiles.insert(session_id.into(), profile);
    }

    /// Number of sessions with a profile.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no profile is registered.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl ProfileSource for StaticProfileSource {
    async fn fetch_profile(&self, session: &SessionContext) -> Result<RawProfile, ProfileError> {
        self.profiles
            .get(&session.session_id)
            .cloned()
            .ok_or_else(|| ProfileError::Unavailable {
                session: session.session_id.clone(),
                reason: "no profile registered".to_string(),
            })
    }
}

/// Fetch and validate the subject for a session.
pub async fn load_subject<P>(source: &P, session: &SessionContext) -> Result<SubjectProfile, ProfileError>
where
    P: ProfileSource + ?Sized,
{
    let raw = source.fetch_profile(session).await?;
    match raw.into_subject() {
        Ok(subject) => Ok(subject),
        Err(err) => {
            tracing::warn!(session = %session.session_id, error = %err, "profile rejected");
            Err(err)
        }
    }
}

/// Load the session's subject and start rotating a credential for it.
///
/// Nothing is issued unless the profile is complete. With `activity`, the
/// issuance and the rotation lifecycle are recorded in it.
pub async fn open_credential<P, S, F>(
    source: &P,
    session: &SessionContext,
    interval: Duration,
    tokens: S,
    activity: Option<SharedActivityLog>,
    on_rotate: F,
) -> Result<RotationHandle, IssueError>
where
    P: ProfileSource + ?Sized,
    S: TokenSource + Send + 'static,
    F: FnMut(&IdentityCredential) + Send + 'static,
{
    let subject = load_subject(source, session).await?;
    Ok(start_rotation(interval, subject, tokens, activity, on_rotate)?)
}
