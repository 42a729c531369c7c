//! Payload encoding and decoding.
//!
//! # Decoding order
//! ```text
//! bytes
//!     → empty?            → Absent
//!     → not UTF-8?        → Binary (base64 on the wire)
//!     → parses as JSON?   → Structured
//!     → otherwise         → Text
//! ```
//!
//! The UTF-8 check always runs before the JSON parser sees anything. Decoding
//! is a one-way heuristic: a text payload that happens to be valid JSON (e.g.
//! `"42"`) comes back as the parsed value, not the original string.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};

use crate::coordination::{ZnodeError, ZnodeResult};

/// Logical payload supplied by a writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No data; stored as zero bytes.
    Absent,
    /// Opaque bytes stored as-is.
    Bytes(Vec<u8>),
    /// Plain text stored as UTF-8 without JSON quoting.
    Text(String),
    /// Any JSON value other than a string, stored as serialized JSON.
    Structured(Value),
}

impl Payload {
    /// Classify a JSON request value: `null` is absent, strings are text,
    /// everything else is structured.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Payload::Absent,
            Value::String(text) => Payload::Text(text),
            other => Payload::Structured(other),
        }
    }

    /// Decode a base64 request field into raw bytes.
    pub fn from_base64(encoded: &str) -> ZnodeResult<Self> {
        STANDARD
            .decode(encoded.trim())
            .map(Payload::Bytes)
            .map_err(|e| ZnodeError::InvalidInput(format!("invalid base64 payload: {}", e)))
    }
}

/// Payload as reconstructed from stored bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Absent,
    Structured(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl Decoded {
    pub fn is_binary(&self) -> bool {
        matches!(self, Decoded::Binary(_))
    }

    /// Base64 text of a binary payload.
    pub fn base64(&self) -> Option<String> {
        match self {
            Decoded::Binary(bytes) => Some(STANDARD.encode(bytes)),
            _ => None,
        }
    }

    /// JSON rendering; binary payloads become `{"binary": true, "base64": ...}`.
    pub fn to_json(&self) -> Value {
        match self {
            Decoded::Absent => Value::Null,
            Decoded::Structured(value) => value.clone(),
            Decoded::Text(text) => Value::String(text.clone()),
            Decoded::Binary(bytes) => json!({
                "binary": true,
                "base64": STANDARD.encode(bytes),
            }),
        }
    }
}

/// Serialize a payload into the bytes stored on the node.
pub fn encode(payload: &Payload) -> ZnodeResult<Vec<u8>> {
    match payload {
        Payload::Absent => Ok(Vec::new()),
        Payload::Bytes(bytes) => Ok(bytes.clone()),
        Payload::Text(text) => Ok(text.as_bytes().to_vec()),
        Payload::Structured(value) => serde_json::to_vec(value)
            .map_err(|e| ZnodeError::InvalidInput(format!("unserializable payload: {}", e))),
    }
}

/// Reconstruct the logical payload from stored bytes.
pub fn decode(bytes: &[u8]) -> Decoded {
    if bytes.is_empty() {
        return Decoded::Absent;
    }
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return Decoded::Binary(bytes.to_vec()),
    };
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Decoded::Structured(value),
        Err(_) => Decoded::Text(text.to_string()),
    }
}
