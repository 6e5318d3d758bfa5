//! Detection event payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Errors decoding a detection event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event payload is not an object")]
    NotAnObject,
    #[error("event payload has no string \"type\" field")]
    MissingType,
    #[error("invalid {field} in event payload: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Content fingerprint of an event payload.
///
/// Two payloads have the same fingerprint exactly when they are
/// structurally equal; object key order does not matter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprints a JSON value.
    pub fn of(payload: &Value) -> Self {
        let mut hasher = blake3::Hasher::new();
        hash_canonical(payload, &mut hasher);
        Self(*hasher.finalize().as_bytes())
    }
}

/// Feeds the compact JSON encoding of `value` to the hasher with object keys
/// sorted at every level, whatever order the map iterates in.
fn hash_canonical(value: &Value, hasher: &mut blake3::Hasher) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            hasher.update(b"{");
            for (i, (key, field)) in entries.into_iter().enumerate() {
                if i > 0 {
                    hasher.update(b",");
                }
                hasher.update(Value::from(key.as_str()).to_string().as_bytes());
                hasher.update(b":");
                hash_canonical(field, hasher);
            }
            hasher.update(b"}");
        }
        Value::Array(items) => {
            hasher.update(b"[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    hasher.update(b",");
                }
                hash_canonical(item, hasher);
            }
            hasher.update(b"]");
        }
        scalar => {
            hasher.update(scalar.to_string().as_bytes());
        }
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint(")?;
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// An event emitted by the capture surface's detector.
///
/// The payload is an object whose `type` field names the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct DetectionEvent {
    event_type: String,
    payload: Value,
}

impl DetectionEvent {
    /// Builds an event of `event_type` with the given detector fields.
    pub fn new(event_type: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        let event_type = event_type.into();
        fields.insert("type".into(), Value::String(event_type.clone()));
        Self {
            event_type,
            payload: Value::Object(fields),
        }
    }

    /// Decodes a raw driver payload.
    pub fn from_payload(payload: Value) -> Result<Self, EventError> {
        let event_type = payload
            .as_object()
            .ok_or(EventError::NotAnObject)?
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingType)?
            .to_string();
        Ok(Self {
            event_type,
            payload,
        })
    }

    /// Stream discriminator.
    #[inline]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Full payload, including the `type` field.
    #[inline]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Content fingerprint of the payload.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.payload)
    }

    /// Native view tag of the emitting surface, if present.
    pub fn target(&self) -> Option<u64> {
        self.payload.get("target").and_then(Value::as_u64)
    }

    /// Decodes the barcodes carried by a barcode event.
    ///
    /// Returns an empty list when the payload has no `barcodes` field.
    pub fn barcodes(&self) -> Result<Vec<Barcode>, EventError> {
        match self.payload.get("barcodes") {
            None => Ok(Vec::new()),
            Some(list) => Vec::<Barcode>::deserialize(list).map_err(|source| {
                EventError::InvalidField {
                    field: "barcodes",
                    source,
                }
            }),
        }
    }
}

impl TryFrom<Value> for DetectionEvent {
    type Error = EventError;

    fn try_from(payload: Value) -> Result<Self, Self::Error> {
        Self::from_payload(payload)
    }
}

impl From<DetectionEvent> for Value {
    fn from(event: DetectionEvent) -> Self {
        event.payload
    }
}

/// A point in view coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A size in view coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Bounding box of a detected barcode, already scaled to the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BarcodeBounds {
    pub origin: Point,
    pub size: Size,
}

/// A single detected barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barcode {
    /// Decoded display value.
    pub data: String,
    /// Barcode format name, e.g. `QR_CODE`.
    #[serde(rename = "type")]
    pub format: String,
    #[serde(default)]
    pub bounds: BarcodeBounds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"type":"qr","data":"X"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"data":"X","type":"qr"}"#).unwrap();
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&json!({"type": "qr", "data": "Y"})));
    }

    #[test]
    fn test_fingerprint_ignores_nested_key_order() {
        let a: Value =
            serde_json::from_str(r#"{"type":"barcode","barcodes":[{"data":"X","type":"QR_CODE"}]}"#)
                .unwrap();
        let b: Value =
            serde_json::from_str(r#"{"barcodes":[{"type":"QR_CODE","data":"X"}],"type":"barcode"}"#)
                .unwrap();
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));

        let reordered: Value =
            serde_json::from_str(r#"{"type":"barcode","barcodes":[{"data":"QR_CODE","type":"X"}]}"#)
                .unwrap();
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&reordered));
    }

    #[test]
    fn test_fingerprint_matches_sorted_compact_encoding() {
        let payload = json!({"z": [1, {"b": true, "a": null}], "a": "x\"y"});
        let expected = blake3::hash(br#"{"a":"x\"y","z":[1,{"a":null,"b":true}]}"#);
        assert_eq!(Fingerprint::of(&payload).0, *expected.as_bytes());
    }

    #[test]
    fn test_from_payload_requires_type() {
        assert!(matches!(
            DetectionEvent::from_payload(json!({"data": "X"})),
            Err(EventError::MissingType)
        ));
        assert!(matches!(
            DetectionEvent::from_payload(json!([1, 2])),
            Err(EventError::NotAnObject)
        ));
    }

    #[test]
    fn test_new_inserts_type() {
        let mut fields = Map::new();
        fields.insert("data".into(), json!("X"));
        let event = DetectionEvent::new("qr", fields);
        assert_eq!(event.event_type(), "qr");
        assert_eq!(event.payload(), &json!({"type": "qr", "data": "X"}));
    }

    #[test]
    fn test_decode_barcode_event() {
        let event = DetectionEvent::from_payload(json!({
            "type": "barcode",
            "target": 42,
            "barcodes": [{
                "data": "https://example.org",
                "type": "QR_CODE",
                "bounds": {
                    "origin": {"x": 10.0, "y": 20.0},
                    "size": {"width": 50.0, "height": 50.0}
                }
            }]
        }))
        .unwrap();

        assert_eq!(event.target(), Some(42));
        let barcodes = event.barcodes().unwrap();
        assert_eq!(barcodes.len(), 1);
        assert_eq!(barcodes[0].format, "QR_CODE");
        assert_eq!(barcodes[0].bounds.size.width, 50.0);
    }

    #[test]
    fn test_malformed_barcodes_rejected() {
        let event =
            DetectionEvent::from_payload(json!({"type": "barcode", "barcodes": "nope"})).unwrap();
        assert!(matches!(
            event.barcodes(),
            Err(EventError::InvalidField { field: "barcodes", .. })
        ));
    }
}
