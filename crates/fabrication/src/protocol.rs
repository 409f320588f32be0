//! Wire messages and envelope validation

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Correlation token linking a fabrication request to its response.
///
/// Opaque to the worker; it is echoed back verbatim in the `_id` field of the
/// response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// A fresh random token (hyphenless uuid v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events this gateway sends to the fabrication worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutboundEvent {
    #[serde(rename = "fabricate_account")]
    FabricateAccount,
}

/// Outbound fabrication request: `{"event": "fabricate_account", "_id": ...}`.
#[derive(Debug, Serialize)]
pub struct FabricateRequest {
    pub event: OutboundEvent,
    #[serde(rename = "_id")]
    pub id: String,
}

impl FabricateRequest {
    pub fn new(id: &CorrelationId) -> Self {
        Self {
            event: OutboundEvent::FabricateAccount,
            id: id.as_str().to_owned(),
        }
    }
}

/// Events the worker sends back. Unknown tags are carried explicitly so the
/// consume loop can log what it dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    AccountResponse,
    Unrecognized(String),
}

impl From<&str> for InboundEvent {
    fn from(tag: &str) -> Self {
        match tag {
            "account_response" => Self::AccountResponse,
            other => Self::Unrecognized(other.to_owned()),
        }
    }
}

/// A structurally valid inbound message.
#[derive(Debug)]
pub struct Envelope {
    pub id: CorrelationId,
    pub event: InboundEvent,
    pub data: serde_json::Value,
}

/// Why an inbound message was rejected. Rejected messages are dropped with a
/// warning; they never abort the consume loop.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("message is not a JSON object: {0}")]
    Malformed(String),

    #[error("missing `event` string field")]
    MissingEvent,

    #[error("missing or empty `_id` field")]
    MissingId,

    #[error("missing `data` object field")]
    MissingData,
}

/// Validate a raw channel message into an [`Envelope`].
///
/// Requires a JSON object with an `event` string, a non-empty `_id` string
/// and a `data` object. Event recognition is deferred to the consume loop.
pub fn decode_envelope(body: &[u8]) -> Result<Envelope, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ProtocolError::Malformed("top-level value is not an object".to_owned()))?;

    let event = object
        .get("event")
        .and_then(serde_json::Value::as_str)
        .ok_or(ProtocolError::MissingEvent)?;

    let id = object
        .get("_id")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(ProtocolError::MissingId)?;

    let data = object
        .get("data")
        .filter(|data| data.is_object())
        .cloned()
        .ok_or(ProtocolError::MissingData)?;

    Ok(Envelope {
        id: CorrelationId::new(id),
        event: InboundEvent::from(event),
        data,
    })
}
