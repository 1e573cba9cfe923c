use super::constants::wire;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Selects which realtime endpoint a connection subscribes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Classic realtime endpoint, token passed as `access_token`
    #[default]
    Default,
    /// CloudEvents stream endpoint, token passed as `token`
    Stream,
}

impl StreamMode {
    /// Query parameter carrying the access token on the socket URI
    pub fn token_param(&self) -> &'static str {
        match self {
            Self::Default => wire::ACCESS_TOKEN_PARAM,
            Self::Stream => wire::STREAM_TOKEN_PARAM,
        }
    }

    /// Value of the `source` field in the subscribe message, if any
    pub fn source(&self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Stream => Some(wire::STREAM_SOURCE),
        }
    }
}

/// Response of the token exchange endpoint
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub team_id: String,
}

/// Control message sent once the socket opens
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscribeMessage {
    pub action: &'static str,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
}

impl SubscribeMessage {
    pub fn new(channel: impl Into<String>, mode: StreamMode) -> Self {
        Self {
            action: wire::SUBSCRIBE_ACTION,
            channel: channel.into(),
            source: mode.source(),
        }
    }
}

/// Body of an event acknowledgment
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AckRequest<'a> {
    pub id: &'a Value,
}

/// A decoded inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Liveness signal, consumed internally
    Heartbeat,
    /// Application payload, forwarded verbatim to event listeners
    Event { ack_id: Option<Value>, payload: Value },
}

impl InboundMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let payload: Value = serde_json::from_str(text)?;

        if payload.get("type").and_then(Value::as_str) == Some(wire::HEARTBEAT_TYPE) {
            return Ok(Self::Heartbeat);
        }

        let ack_id = payload.get("id").filter(|id| is_truthy(id)).cloned();
        Ok(Self::Event { ack_id, payload })
    }
}

/// Only ids that carry a value are acknowledged: `null`, `false`, `0` and `""` are skipped.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
