//! Lifecycle events reported to a [`super::ChatObserver`].

use serde::Serialize;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

use super::messages::InboundMessage;

/// Who ended the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseInitiator {
    /// This client sent the first close frame.
    Local,
    /// The server sent the first close frame.
    Remote,
    /// No close handshake: connect failure, transport error, or the
    /// stream ended without a close frame.
    Abnormal,
}

/// Details of a connection close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseInfo {
    /// Who ended the connection.
    pub initiator: CloseInitiator,
    /// Close code from the peer's close frame, if any.
    pub code: Option<u16>,
    /// Close reason from the peer's close frame, if non-empty.
    pub reason: Option<String>,
}

impl CloseInfo {
    /// Close without a close frame.
    #[must_use]
    pub const fn abnormal() -> Self {
        Self {
            initiator: CloseInitiator::Abnormal,
            code: None,
            reason: None,
        }
    }

    /// Builds close details from the peer's close frame.
    #[must_use]
    pub fn from_frame(initiator: CloseInitiator, frame: Option<&CloseFrame>) -> Self {
        let Some(frame) = frame else {
            return Self {
                initiator,
                code: None,
                reason: None,
            };
        };
        let reason = frame.reason.as_str();
        Self {
            initiator,
            code: Some(u16::from(frame.code)),
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        }
    }
}

/// An event in the life of one chat connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectionEvent {
    /// The handshake completed.
    Connected {
        /// Endpoint the client connected to.
        url: String,
    },
    /// A text frame decoded into a reply.
    MessageReceived(InboundMessage),
    /// A text frame that could not be decoded.
    MalformedFrame {
        /// Raw frame text.
        raw: String,
        /// Decoder error.
        error: String,
    },
    /// The connection closed. Emitted exactly once per session.
    Closed(CloseInfo),
}

/// Counters and close details for a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Text frames sent to the server.
    pub frames_sent: usize,
    /// Replies decoded successfully.
    pub messages_received: usize,
    /// Text frames that failed to decode.
    pub malformed_frames: usize,
    /// How the connection ended.
    pub close: CloseInfo,
}
