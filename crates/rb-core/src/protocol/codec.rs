//! JSON envelope codec.
//!
//! Wire format: one UTF-8 JSON object per WebSocket text frame.
//!
//! ```text
//! { protocol_version, type, id, ts, nonce, device_id, payload }
//! ```
//!
//! `id` is a UUID v4 string and `nonce` a 32-digit lowercase hex token
//! (the simple form of a second UUID v4).  Both are fresh for every
//! envelope; nothing in this module ever reuses or derives them.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::messages::{MessageType, PROTOCOL_VERSION};

/// Fields every envelope must carry, in alphabetical order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "device_id",
    "id",
    "nonce",
    "payload",
    "protocol_version",
    "ts",
    "type",
];

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is not JSON, or not a JSON object.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Required envelope fields are absent.  Names are sorted.
    #[error("missing fields: {}", .0.join(","))]
    MissingFields(Vec<String>),

    /// The envelope declares a protocol version this build does not speak.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    /// A field has the wrong JSON type, or the payload does not match the
    /// shape its message type requires.
    #[error("invalid field: {0}")]
    InvalidField(String),
}

/// One message on the session channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub protocol_version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    /// Epoch milliseconds at construction.
    pub ts: u64,
    pub nonce: String,
    pub device_id: String,
    pub payload: Value,
}

impl Envelope {
    /// Builds an envelope with a fresh `id` and `nonce` and the given timestamp.
    pub fn new(kind: MessageType, device_id: impl Into<String>, payload: Value, ts: u64) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            kind: kind.as_str().to_owned(),
            id: Uuid::new_v4().to_string(),
            ts,
            nonce: Uuid::new_v4().simple().to_string(),
            device_id: device_id.into(),
            payload,
        }
    }

    /// Builds an envelope stamped with the current system time.
    pub fn now(kind: MessageType, device_id: impl Into<String>, payload: Value) -> Self {
        Self::new(kind, device_id, payload, now_ms())
    }

    /// Builds an envelope from a typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidField`] if the payload cannot be
    /// represented as JSON.
    pub fn with_payload<P: Serialize>(
        kind: MessageType,
        device_id: impl Into<String>,
        payload: &P,
    ) -> Result<Self, ProtocolError> {
        let payload =
            serde_json::to_value(payload).map_err(|e| ProtocolError::InvalidField(e.to_string()))?;
        Ok(Self::now(kind, device_id, payload))
    }

    /// The parsed message type, or `None` for types this build does not know.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_wire(&self.kind)
    }

    /// Deserializes the payload into its typed shape.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidField`] when the payload does not match `P`.
    pub fn payload_as<P: DeserializeOwned>(&self) -> Result<P, ProtocolError> {
        P::deserialize(&self.payload).map_err(|e| ProtocolError::InvalidField(e.to_string()))
    }
}

/// Current time in epoch milliseconds.  A clock before 1970 reads as 0.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an envelope as a JSON text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidField`] if serialization fails.
pub fn encode_envelope(envelope: &Envelope) -> Result<String, ProtocolError> {
    serde_json::to_string(envelope).map_err(|e| ProtocolError::InvalidField(e.to_string()))
}

/// Decodes and validates one JSON text frame.
///
/// Checks run in this order: JSON object, required fields, protocol
/// version, field types.
///
/// # Errors
///
/// Returns the first [`ProtocolError`] encountered.
///
/// # Examples
///
/// ```rust
/// use rb_core::protocol::codec::{decode_envelope, encode_envelope, Envelope};
/// use rb_core::protocol::messages::MessageType;
///
/// let env = Envelope::now(MessageType::MouseMove, "phone-1", serde_json::json!({"dx": 1, "dy": 2}));
/// let text = encode_envelope(&env).unwrap();
/// assert_eq!(decode_envelope(&text).unwrap(), env);
/// ```
pub fn decode_envelope(text: &str) -> Result<Envelope, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let Value::Object(map) = &value else {
        return Err(ProtocolError::Malformed("frame is not a JSON object".to_owned()));
    };

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !map.contains_key(**field))
        .map(|field| (*field).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(ProtocolError::MissingFields(missing));
    }

    let version = map.get("protocol_version");
    if version.and_then(Value::as_str) != Some(PROTOCOL_VERSION) {
        let shown = match version {
            Some(Value::String(v)) => v.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        return Err(ProtocolError::UnsupportedVersion(shown));
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidField(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Envelope {
        Envelope::new(
            MessageType::PairRequest,
            "phone-1",
            json!({"device_name": "Phone", "public_key": "abc"}),
            1_700_000_000_000,
        )
    }

    #[test]
    fn test_encode_uses_exact_wire_field_names() {
        // Arrange
        let env = sample();

        // Act
        let value: Value = serde_json::from_str(&encode_envelope(&env).unwrap()).unwrap();

        // Assert
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, REQUIRED_FIELDS.to_vec());
        assert_eq!(object["type"], "pair.request");
        assert_eq!(object["protocol_version"], "1.0");
        assert_eq!(object["ts"], 1_700_000_000_000u64);
    }

    #[test]
    fn test_decode_round_trips() {
        let env = sample();
        let decoded = decode_envelope(&encode_envelope(&env).unwrap()).unwrap();
        assert_eq!(decoded, env);
    }

    #[test]
    fn test_id_is_uuid_and_nonce_is_32_hex_digits() {
        let env = sample();
        assert!(Uuid::parse_str(&env.id).is_ok());
        assert_eq!(env.nonce.len(), 32);
        assert!(env.nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_decode_rejects_non_json_and_non_objects() {
        assert!(matches!(decode_envelope("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(decode_envelope("[1,2]"), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_reports_missing_fields_sorted() {
        let err = decode_envelope(r#"{"type":"pair.request","payload":{},"id":"x"}"#).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MissingFields(vec![
                "device_id".into(),
                "nonce".into(),
                "protocol_version".into(),
                "ts".into(),
            ])
        );
        assert_eq!(err.to_string(), "missing fields: device_id,nonce,protocol_version,ts");
    }

    #[test]
    fn test_decode_rejects_other_protocol_version() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["protocol_version"] = json!("2.0");
        let err = decode_envelope(&value.to_string()).unwrap_err();
        assert_eq!(err, ProtocolError::UnsupportedVersion("2.0".into()));
    }

    #[test]
    fn test_decode_rejects_wrongly_typed_fields() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["ts"] = json!("yesterday");
        assert!(matches!(
            decode_envelope(&value.to_string()),
            Err(ProtocolError::InvalidField(_))
        ));
    }

    #[test]
    fn test_payload_as_reports_shape_mismatch() {
        let env = Envelope::now(MessageType::MouseMove, "d", json!({"dx": "far"}));
        let result = env.payload_as::<crate::protocol::messages::MouseMove>();
        assert!(matches!(result, Err(ProtocolError::InvalidField(_))));
    }

    #[test]
    fn test_unknown_type_decodes_but_has_no_message_type() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["type"] = json!("input.teleport");
        let env = decode_envelope(&value.to_string()).unwrap();
        assert_eq!(env.message_type(), None);
    }
}
