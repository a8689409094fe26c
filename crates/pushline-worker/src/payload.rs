//! Inbound push payload representations and the decode chain.
//!
//! A push event may carry its payload in one of four shapes. Decoding tries
//! an ordered chain of conversions; the first step that applies to the shape
//! at hand decides the result.

use serde_json::{Map, Value};

/// Payload of an inbound push event, as the runtime exposes it.
#[derive(Debug, Clone, PartialEq)]
pub enum PushData {
    /// Payload object with a typed JSON accessor.
    Json(Vec<u8>),
    /// Payload object with only a text accessor.
    Bytes(Vec<u8>),
    /// The payload is itself a string.
    Text(String),
    /// The payload is already a plain mapping.
    Object(Map<String, Value>),
}

/// A push event as received from the platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPushEvent {
    pub data: Option<PushData>,
}

impl RawPushEvent {
    pub const fn empty() -> Self {
        Self { data: None }
    }

    pub const fn new(data: PushData) -> Self {
        Self { data: Some(data) }
    }

    /// Convenience for payloads arriving through the JSON accessor.
    pub fn json(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(PushData::Json(bytes.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PushData::Text(text.into()))
    }
}

/// Structured decoding failed; carries whatever raw text could be recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub raw_text: Option<String>,
    pub reason: String,
}

impl std::fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

impl From<DecodeFailure> for pushline_core::Error {
    fn from(e: DecodeFailure) -> Self {
        Self::PayloadDecode(e.reason)
    }
}

type DecodeResult = Result<Map<String, Value>, DecodeFailure>;

/// One conversion in the chain; `None` means "not applicable to this shape".
type DecodeStep = fn(&PushData) -> Option<DecodeResult>;

const DECODE_CHAIN: [DecodeStep; 4] = [structured, text_accessor, string, mapping];

/// Decode a payload into a JSON object.
pub fn decode_payload(data: &PushData) -> DecodeResult {
    DECODE_CHAIN
        .iter()
        .find_map(|step| step(data))
        .unwrap_or_else(|| {
            Err(DecodeFailure {
                raw_text: None,
                reason: "no decoder applies to payload".to_string(),
            })
        })
}

fn structured(data: &PushData) -> Option<DecodeResult> {
    let PushData::Json(bytes) = data else {
        return None;
    };
    Some(
        serde_json::from_slice::<Value>(bytes)
            .map_err(|e| failure(String::from_utf8_lossy(bytes).into_owned(), &e))
            .and_then(|value| into_object(value, || String::from_utf8_lossy(bytes).into_owned())),
    )
}

fn text_accessor(data: &PushData) -> Option<DecodeResult> {
    let PushData::Bytes(bytes) = data else {
        return None;
    };
    Some(parse_text(&String::from_utf8_lossy(bytes)))
}

fn string(data: &PushData) -> Option<DecodeResult> {
    let PushData::Text(text) = data else {
        return None;
    };
    Some(parse_text(text))
}

fn mapping(data: &PushData) -> Option<DecodeResult> {
    let PushData::Object(map) = data else {
        return None;
    };
    Some(Ok(map.clone()))
}

fn parse_text(text: &str) -> DecodeResult {
    serde_json::from_str::<Value>(text)
        .map_err(|e| failure(text.to_string(), &e))
        .and_then(|value| into_object(value, || text.to_string()))
}

fn failure(raw: String, err: &serde_json::Error) -> DecodeFailure {
    DecodeFailure {
        raw_text: Some(raw),
        reason: format!("payload is not JSON: {err}"),
    }
}

/// Only objects describe a notification; a bare JSON string is taken as the
/// body text, any other scalar as its raw source.
fn into_object(value: Value, raw: impl FnOnce() -> String) -> DecodeResult {
    match value {
        Value::Object(map) => Ok(map),
        Value::String(s) => Err(DecodeFailure {
            raw_text: Some(s),
            reason: "payload is a JSON string, not an object".to_string(),
        }),
        other => Err(DecodeFailure {
            raw_text: Some(raw()),
            reason: format!("payload is JSON {}, not an object", kind(&other)),
        }),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
