//! Gateway frame formats
//!
//! All frames are JSON objects tagged by a `type` field. Outbound frames are
//! built by the connection manager; inbound frames split into a small set of
//! control frames handled internally and application events forwarded to the
//! caller untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typing indicator payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingData {
    /// Conversation the indicator applies to
    pub conversation_id: String,
}

/// Frames sent by the client to the gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Authentication handshake, first frame after the socket opens
    Auth { token: String },
    /// Periodic keep-warm frame while authenticated
    Heartbeat,
    /// Chat message to one or more recipients
    #[serde(rename_all = "camelCase")]
    SendMessage {
        recipient_ids: Vec<String>,
        content: String,
    },
    /// Typing indicator start
    Typing { data: TypingData },
    /// Typing indicator stop
    StopTyping { data: TypingData },
}

impl OutboundFrame {
    /// Create an auth frame
    #[must_use]
    pub fn auth(token: impl Into<String>) -> Self {
        Self::Auth { token: token.into() }
    }

    /// Create a heartbeat frame
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::Heartbeat
    }

    /// Create a send_message frame
    #[must_use]
    pub fn send_message(recipient_ids: Vec<String>, content: impl Into<String>) -> Self {
        Self::SendMessage {
            recipient_ids,
            content: content.into(),
        }
    }

    /// Create a typing frame
    #[must_use]
    pub fn typing(conversation_id: impl Into<String>) -> Self {
        Self::Typing {
            data: TypingData {
                conversation_id: conversation_id.into(),
            },
        }
    }

    /// Create a stop_typing frame
    #[must_use]
    pub fn stop_typing(conversation_id: impl Into<String>) -> Self {
        Self::StopTyping {
            data: TypingData {
                conversation_id: conversation_id.into(),
            },
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Get the wire name of this frame
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::Heartbeat => "heartbeat",
            Self::SendMessage { .. } => "send_message",
            Self::Typing { .. } => "typing",
            Self::StopTyping { .. } => "stop_typing",
        }
    }
}

/// Control frames consumed by the connection manager itself
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlFrame {
    /// Handshake accepted
    AuthSuccess,
    /// Handshake rejected
    AuthError,
    /// Reply to a heartbeat, swallowed silently
    HeartbeatAck,
    /// Server-reported error
    Error { error: String },
}

/// A frame received from the gateway
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Protocol control frame, handled internally
    Control(ControlFrame),
    /// Application event, forwarded verbatim to the caller
    Event(Value),
}

impl InboundFrame {
    /// Parse an inbound text frame
    ///
    /// Frames whose `type` is one of the protocol-control values become
    /// [`ControlFrame`]s; any other `type` is passed through as an event with
    /// the full JSON value intact. A frame without a string `type` field is
    /// malformed.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;

        match value.get("type").and_then(Value::as_str) {
            Some("auth_success" | "auth_error" | "heartbeat_ack" | "error") => {
                Ok(Self::Control(serde_json::from_value(value)?))
            }
            Some(_) => Ok(Self::Event(value)),
            None => Err(serde::de::Error::custom("frame has no type field")),
        }
    }
}
