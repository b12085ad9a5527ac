//! # Error Types
//!
//! Structured errors for the foundational layer. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Validation errors name the offending field.
//! - Codec errors are only produced by the strict [`crate::codec::decode()`]
//!   path. Display decoding never surfaces an error.

use thiserror::Error;

/// Top-level error type for clubpass.
#[derive(Error, Debug)]
pub enum ClubpassError {
    /// A required field was missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A value failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Payload encode/decode failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Canonical bytes were not valid UTF-8.
    #[error("canonical output is not valid UTF-8")]
    NotUtf8,
}

/// Error while encoding or strictly decoding a credential payload.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The payload is not a JSON object.
    #[error("payload is not a structured credential: {0}")]
    Malformed(String),

    /// A credential field is absent from the payload.
    #[error("payload is missing credential field {0:?}")]
    MissingField(&'static str),

    /// A credential field is present but unusable.
    #[error("payload field {field:?} is invalid: {reason}")]
    InvalidField {
        /// Field name as it appears on the wire.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Canonical encoding failed.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}
