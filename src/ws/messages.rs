//! Chat wire messages: the outbound chat request and the inbound reply.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ClientError;

/// Default chat text sent on connect.
pub const DEFAULT_MESSAGE: &str = "Hola, ¿cómo puedo postular a Ithaka?";
/// Default sender tag.
pub const DEFAULT_SENDER: &str = "user";
/// Default message type.
pub const DEFAULT_MESSAGE_TYPE: &str = "text";
/// Default session identifier.
pub const DEFAULT_SESSION_ID: &str = "mi-sesion-websocket";

/// Message type the server uses for failed requests.
pub const ERROR_MESSAGE_TYPE: &str = "error";

/// Outbound chat message, sent once as a JSON text frame when the
/// connection opens.
///
/// Serialized field order is `message`, `sender`, `type`, `session_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Chat text.
    pub message: String,
    /// Who is speaking (`"user"` for this client).
    pub sender: String,
    /// Message type discriminator (`"text"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque conversation identifier, passed through to the server.
    pub session_id: String,
}

impl ChatMessage {
    /// Creates a chat message with every field given explicitly.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        sender: impl Into<String>,
        kind: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            sender: sender.into(),
            kind: kind.into(),
            session_id: session_id.into(),
        }
    }

    /// Encodes the message as the JSON text of a WebSocket frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, ClientError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for ChatMessage {
    fn default() -> Self {
        Self::new(
            DEFAULT_MESSAGE,
            DEFAULT_SENDER,
            DEFAULT_MESSAGE_TYPE,
            DEFAULT_SESSION_ID,
        )
    }
}

/// Inbound reply decoded from a text frame.
///
/// No schema is enforced: every known field is optional and anything
/// else is kept in [`InboundMessage::extra`]. Only `message` must have
/// the right JSON type; `sender`, `type` and `timestamp` read as `None`
/// when they cannot be understood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Reply text.
    #[serde(default)]
    pub message: Option<String>,
    /// Who sent the reply (the server uses `"bot"`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender: Option<String>,
    /// Message type (`"text"` or `"error"`).
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    /// Server timestamp. Naive timestamps are taken as UTC.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Fields not covered above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InboundMessage {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedFrame`] if the text is not a JSON
    /// object or `message` is present but not a string.
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        serde_json::from_str(text).map_err(|e| ClientError::MalformedFrame(e.to_string()))
    }

    /// Returns `true` if the server flagged this reply as an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind.as_deref() == Some(ERROR_MESSAGE_TYPE)
    }
}

/// Reads a string field, mapping any other JSON type to `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Reads an RFC 3339 or naive ISO-8601 timestamp; anything else is `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(text) = lenient_string(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&text) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc()))
}
