//! Wire envelope
//!
//! Every frame the bus sends or routes has the shape
//! `{"name": "...", "message": <any JSON>, "isAmbiorix": true}`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{BusError, Result};

/// Marker field that separates bus traffic from anything else on the socket
pub const MARKER_FIELD: &str = "isAmbiorix";

/// Named message wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Handler-selection key
    pub name: String,

    /// Arbitrary JSON payload (`null` when an inbound frame omits it)
    #[serde(default)]
    pub message: JsonValue,

    #[serde(rename = "isAmbiorix")]
    pub is_ambiorix: bool,
}

impl Envelope {
    /// Create a tagged envelope from an already-converted payload
    pub fn new(name: impl Into<String>, message: JsonValue) -> Self {
        Self {
            name: name.into(),
            message,
            is_ambiorix: true,
        }
    }

    /// Create a tagged envelope from any serializable payload
    ///
    /// # Errors
    /// Returns `BusError::Serialization` if the payload has no JSON form
    pub fn wrap<T: Serialize + ?Sized>(name: impl Into<String>, message: &T) -> Result<Self> {
        let message = serde_json::to_value(message).map_err(BusError::Serialization)?;
        Ok(Self::new(name, message))
    }

    /// Serialize to the text frame written on the socket
    pub fn to_frame(&self) -> Result<String> {
        serde_json::to_string(self).map_err(BusError::Serialization)
    }

    /// Decode an inbound text frame
    ///
    /// Returns `Ok(None)` for foreign traffic: valid JSON that is not an
    /// object carrying `"isAmbiorix": true`.
    ///
    /// # Errors
    /// `BusError::MalformedFrame` if the text is not JSON, or if it is tagged
    /// but `name` is missing or not a string.
    pub fn from_frame(text: &str) -> Result<Option<Self>> {
        let value: JsonValue = serde_json::from_str(text)
            .map_err(|e| BusError::malformed(format!("invalid JSON: {}", e)))?;

        if !is_tagged(&value) {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| BusError::malformed(format!("bad envelope: {}", e)))
    }
}

/// Whether a parsed frame carries the literal `true` marker
pub fn is_tagged(value: &JsonValue) -> bool {
    matches!(value.get(MARKER_FIELD), Some(JsonValue::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outbound_frame_is_exact() {
        let frame = Envelope::wrap("echo", "hi").unwrap().to_frame().unwrap();
        assert_eq!(frame, r#"{"name":"echo","message":"hi","isAmbiorix":true}"#);
    }

    #[test]
    fn test_inbound_frame_decodes() {
        let env = Envelope::from_frame(r#"{"name":"ping","message":{"n":1},"isAmbiorix":true}"#)
            .unwrap()
            .unwrap();
        assert_eq!(env.name, "ping");
        assert_eq!(env.message, json!({"n": 1}));
    }

    #[test]
    fn test_missing_message_is_null() {
        let env = Envelope::from_frame(r#"{"name":"bare","isAmbiorix":true}"#)
            .unwrap()
            .unwrap();
        assert_eq!(env.message, JsonValue::Null);
    }

    #[test]
    fn test_untagged_frames_are_foreign() {
        for text in [
            r#"{"name":"ping","message":1}"#,
            r#"{"name":"ping","message":1,"isAmbiorix":false}"#,
            r#"{"name":"ping","message":1,"isAmbiorix":"true"}"#,
            r#"[1,2,3]"#,
            r#"42"#,
        ] {
            assert!(Envelope::from_frame(text).unwrap().is_none(), "{}", text);
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = Envelope::from_frame("{not json").unwrap_err();
        assert!(matches!(err, BusError::MalformedFrame { .. }));
    }

    #[test]
    fn test_tagged_without_name_is_malformed() {
        let err = Envelope::from_frame(r#"{"message":1,"isAmbiorix":true}"#).unwrap_err();
        assert!(matches!(err, BusError::MalformedFrame { .. }));

        let err = Envelope::from_frame(r#"{"name":7,"isAmbiorix":true}"#).unwrap_err();
        assert!(matches!(err, BusError::MalformedFrame { .. }));
    }

    #[test]
    fn test_unrepresentable_payload_fails() {
        use std::collections::HashMap;

        let mut payload = HashMap::new();
        payload.insert((1, 2), "tuple keys have no JSON form");
        let err = Envelope::wrap("bad", &payload).unwrap_err();
        assert!(matches!(err, BusError::Serialization(_)));
    }
}
