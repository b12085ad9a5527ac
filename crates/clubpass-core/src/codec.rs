//! # Credential Payload Codec
//!
//! Converts between an [`IdentityCredential`] and the flat string encoded
//! into a 2D barcode, and turns any scanned string back into a label an
//! operator can read.
//!
//! ## Wire format
//!
//! A JCS-canonical JSON object:
//!
//! ```text
//! {"contact":"ada@uni.edu","id":"A0123","issuedAt":1767261600000,"name":"Ada","token":"9f0c..."}
//! ```
//!
//! ## Display decoding
//!
//! Scanners capture arbitrary third-party codes as well as older profile
//! codes that used `nombre` / `matricula` / `correo`. [`inspect()`] looks
//! for each display field under all of its aliases and joins what it finds
//! with [`LABEL_SEPARATOR`]. Anything else, including non-JSON input and
//! JSON without a recognised field, is labelled with the raw string.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::canonical::CanonicalBytes;
use crate::credential::{IdentityCredential, RotationToken};
use crate::error::CodecError;
use crate::identity::SubjectId;
use crate::temporal::Timestamp;

/// Separator between the parts of a display label.
pub const LABEL_SEPARATOR: &str = " • ";

const KEY_NAME: &str = "name";
const KEY_ID: &str = "id";
const KEY_CONTACT: &str = "contact";
const KEY_TOKEN: &str = "token";
const KEY_ISSUED_AT: &str = "issuedAt";

/// Display fields in label order, each with its accepted aliases in
/// preference order. Profile codes prefer `nombre` over `name` and
/// `correo` over `email`.
const DISPLAY_FIELDS: [(&str, &[&str]); 3] = [
    ("Name", &["nombre", "name"]),
    ("ID", &["id", "identifier", "matricula"]),
    ("Email", &["contact", "correo", "email"]),
];

#[derive(Serialize)]
struct WirePayload<'a> {
    name: &'a str,
    id: &'a str,
    contact: &'a str,
    token: &'a str,
    #[serde(rename = "issuedAt")]
    issued_at: i64,
}

/// What a scanned payload turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadView {
    /// Human-readable label.
    pub label: String,
    /// Issuance instant, when the payload carries one.
    pub issued_at: Option<Timestamp>,
    /// Whether at least one display field was recognised.
    pub recognized: bool,
    /// The payload carries a rotation token but no usable `issuedAt`.
    pub issued_at_invalid: bool,
}

/// Encode a credential into its canonical payload string.
///
/// Deterministic: the same credential always yields the same string.
pub fn encode(credential: &IdentityCredential) -> Result<String, CodecError> {
    let wire = WirePayload {
        name: &credential.subject_name,
        id: credential.subject_id.as_str(),
        contact: &credential.subject_contact,
        token: credential.issued_token.as_str(),
        issued_at: credential.issued_at.epoch_millis(),
    };
    Ok(CanonicalBytes::new(&wire)?.to_text()?)
}

/// Strictly decode a payload produced by [`encode()`].
pub fn decode(raw: &str) -> Result<IdentityCredential, CodecError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(CodecError::Malformed("expected a JSON object".to_string()));
    };

    let subject_id = SubjectId::new(required_str(&map, KEY_ID)?).map_err(|e| {
        CodecError::InvalidField {
            field: KEY_ID,
            reason: e.to_string(),
        }
    })?;
    let issued_at_ms = map
        .get(KEY_ISSUED_AT)
        .ok_or(CodecError::MissingField(KEY_ISSUED_AT))?
        .as_i64()
        .ok_or_else(|| CodecError::InvalidField {
            field: KEY_ISSUED_AT,
            reason: "expected integer epoch milliseconds".to_string(),
        })?;
    let issued_at = Timestamp::from_epoch_millis(issued_at_ms).map_err(|e| {
        CodecError::InvalidField {
            field: KEY_ISSUED_AT,
            reason: e.to_string(),
        }
    })?;

    Ok(IdentityCredential {
        subject_name: required_str(&map, KEY_NAME)?.to_string(),
        subject_id,
        subject_contact: required_str(&map, KEY_CONTACT)?.to_string(),
        issued_token: RotationToken::from_string(required_str(&map, KEY_TOKEN)?),
        issued_at,
    })
}

/// Label for a scanned payload. Never fails.
pub fn decode_for_display(raw: &str) -> String {
    inspect(raw).label
}

/// Interpret a scanned payload for display and freshness checks. Never fails.
pub fn inspect(raw: &str) -> PayloadView {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) else {
        return raw_view(raw);
    };

    let parts: Vec<String> = DISPLAY_FIELDS
        .iter()
        .filter_map(|(label, aliases)| {
            first_displayable(&map, aliases).map(|value| format!("{label}: {value}"))
        })
        .collect();
    if parts.is_empty() {
        return raw_view(raw);
    }

    let issued_at = map
        .get(KEY_ISSUED_AT)
        .and_then(Value::as_i64)
        .and_then(|ms| Timestamp::from_epoch_millis(ms).ok());
    let issued_at_invalid = map.contains_key(KEY_TOKEN) && issued_at.is_none();

    PayloadView {
        label: parts.join(LABEL_SEPARATOR),
        issued_at,
        recognized: true,
        issued_at_invalid,
    }
}

fn raw_view(raw: &str) -> PayloadView {
    PayloadView {
        label: raw.to_string(),
        issued_at: None,
        recognized: false,
        issued_at_invalid: false,
    }
}

fn first_displayable(map: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn required_str<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, CodecError> {
    match map.get(key) {
        None => Err(CodecError::MissingField(key)),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(CodecError::InvalidField {
            field: key,
            reason: "expected a non-empty string".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SubjectProfile;
    use proptest::prelude::*;

    fn make_credential(name: &str, id: &str, contact: &str) -> IdentityCredential {
        let profile = SubjectProfile::new(name, SubjectId::new(id).unwrap(), contact).unwrap();
        IdentityCredential::issue(
            &profile,
            RotationToken::from_string("tok-1"),
            Timestamp::from_epoch_millis(1_767_261_600_000).unwrap(),
        )
    }

    #[test]
    fn test_encode_is_canonical() {
        let cred = make_credential("Ada", "A0123", "ada@uni.edu");
        assert_eq!(
            encode(&cred).unwrap(),
            r#"{"contact":"ada@uni.edu","id":"A0123","issuedAt":1767261600000,"name":"Ada","token":"tok-1"}"#
        );
    }

    #[test]
    fn test_encode_deterministic() {
        let cred = make_credential("Ada", "A0123", "ada@uni.edu");
        assert_eq!(encode(&cred).unwrap(), encode(&cred.clone()).unwrap());
    }

    #[test]
    fn test_strict_decode_roundtrip() {
        let cred = make_credential("Grace Hopper", "G-77", "grace@uni.edu");
        let back = decode(&encode(&cred).unwrap()).unwrap();
        assert_eq!(back, cred);
    }

    #[test]
    fn test_strict_decode_missing_token() {
        let err = decode(r#"{"name":"Ada","id":"A1","contact":"a@b","issuedAt":1}"#).unwrap_err();
        assert!(matches!(err, CodecError::MissingField("token")));
    }

    #[test]
    fn test_strict_decode_rejects_non_object() {
        assert!(matches!(decode("[1,2]"), Err(CodecError::Malformed(_))));
        assert!(matches!(decode("hello"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_display_label_for_credential() {
        let cred = make_credential("Ada", "A0123", "ada@uni.edu");
        assert_eq!(
            decode_for_display(&encode(&cred).unwrap()),
            "Name: Ada • ID: A0123 • Email: ada@uni.edu"
        );
    }

    #[test]
    fn test_display_not_json() {
        assert_eq!(decode_for_display("not json at all"), "not json at all");
    }

    #[test]
    fn test_display_legacy_aliases() {
        let raw = r#"{"nombre":"Luis","id":"S-9","correo":"luis@uni.edu"}"#;
        assert_eq!(
            decode_for_display(raw),
            "Name: Luis • ID: S-9 • Email: luis@uni.edu"
        );
        let raw = r#"{"name":"Eva","matricula":12345}"#;
        assert_eq!(decode_for_display(raw), "Name: Eva • ID: 12345");
    }

    #[test]
    fn test_display_alias_precedence() {
        let raw = r#"{"name":"Ada","nombre":"Ana","email":"a@x.org","correo":"ana@uni.edu"}"#;
        assert_eq!(decode_for_display(raw), "Name: Ana • Email: ana@uni.edu");

        let raw = r#"{"contact":"ada@uni.edu","correo":"ana@uni.edu","id":"A1","matricula":"M9"}"#;
        assert_eq!(decode_for_display(raw), "ID: A1 • Email: ada@uni.edu");
    }

    #[test]
    fn test_display_skips_blank_and_non_scalar_fields() {
        let raw = r#"{"name":"  ","nombre":"Ana","id":{"nested":true},"email":null}"#;
        assert_eq!(decode_for_display(raw), "Name: Ana");
    }

    #[test]
    fn test_display_unrecognised_object_is_raw() {
        let raw = r#"{"url":"https://example.org"}"#;
        assert_eq!(decode_for_display(raw), raw);
        assert!(!inspect(raw).recognized);
    }

    #[test]
    fn test_display_json_scalar_is_raw() {
        assert_eq!(decode_for_display("42"), "42");
        assert_eq!(decode_for_display("\"quoted\""), "\"quoted\"");
    }

    #[test]
    fn test_inspect_reads_issued_at() {
        let cred = make_credential("Ada", "A0123", "ada@uni.edu");
        let view = inspect(&encode(&cred).unwrap());
        assert!(view.recognized);
        assert_eq!(view.issued_at, Some(cred.issued_at));

        let legacy = inspect(r#"{"nombre":"Luis"}"#);
        assert_eq!(legacy.issued_at, None);
        assert!(!legacy.issued_at_invalid);
    }

    #[test]
    fn test_inspect_flags_token_without_usable_issued_at() {
        for raw in [
            r#"{"name":"Ada","id":"A1","token":"t","issuedAt":"yesterday"}"#,
            r#"{"name":"Ada","id":"A1","token":"t","issuedAt":1.5}"#,
            r#"{"name":"Ada","id":"A1","token":"t","issuedAt":9223372036854775807}"#,
            r#"{"name":"Ada","id":"A1","token":"t"}"#,
        ] {
            let view = inspect(raw);
            assert_eq!(view.issued_at, None, "{raw}");
            assert!(view.issued_at_invalid, "{raw}");
        }
    }

    proptest! {
        #[test]
        fn prop_label_contains_name_and_id(
            name in "[A-Za-zÁÉÍÓÚáéíóúñ][A-Za-zÁÉÍÓÚáéíóúñ '\"]{0,30}",
            id in "[A-Z0-9][A-Z0-9-]{0,12}",
        ) {
            let cred = make_credential(&name, &id, "someone@uni.edu");
            let label = decode_for_display(&encode(&cred).unwrap());
            prop_assert!(label.contains(&cred.subject_name));
            prop_assert!(label.contains(cred.subject_id.as_str()));
        }

        #[test]
        fn prop_non_object_input_is_returned_verbatim(raw in "\\PC*") {
            let is_object = matches!(serde_json::from_str::<Value>(&raw), Ok(Value::Object(_)));
            let label = decode_for_display(&raw);
            if !is_object {
                prop_assert_eq!(label, raw);
            }
        }
    }
}
