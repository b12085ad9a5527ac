//! # Identity Newtypes
//!
//! Newtype wrappers for the keys of the check-in domain. You cannot pass
//! a `SubjectId` where an `EventId` is expected.
//!
//! Both are opaque strings supplied by the surrounding application
//! (student registry, event management). The only validation applied is
//! that they are non-empty after trimming surrounding whitespace.

use serde::{Deserialize, Serialize};

use crate::error::ClubpassError;

/// Institutional identifier of a credential holder (e.g. a student ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

/// Identifier of the event a guest list belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(String);

fn non_empty(value: String, what: &'static str) -> Result<String, ClubpassError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClubpassError::MissingField(what));
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

impl SubjectId {
    /// Create a subject identifier, rejecting blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, ClubpassError> {
        non_empty(value.into(), "subject_id").map(Self)
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EventId {
    /// Create an event identifier, rejecting blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, ClubpassError> {
        non_empty(value.into(), "event_id").map(Self)
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = ClubpassError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for EventId {
    type Error = ClubpassError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event:{}", self.0)
    }
}

/// The holder data a credential is issued for.
///
/// Every field is required. A profile fetched from upstream with any
/// blank field must not be turned into a credential, so the constructor
/// refuses it instead of substituting placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
    /// Display name of the holder.
    pub name: String,
    /// Institutional identifier.
    pub id: SubjectId,
    /// Contact email.
    pub contact: String,
}

impl SubjectProfile {
    /// Build a profile, rejecting blank name or contact.
    pub fn new(
        name: impl Into<String>,
        id: SubjectId,
        contact: impl Into<String>,
    ) -> Result<Self, ClubpassError> {
        Ok(Self {
            name: non_empty(name.into(), "name")?,
            id,
            contact: non_empty(contact.into(), "contact")?,
        })
    }
}
