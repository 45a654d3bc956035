//! Client error types.
//!
//! [`ClientError`] is the central error type for the chat client. Library
//! operations return it directly; the binary wraps it in `anyhow` so a
//! failed session exits with a readable message.

use std::time::Duration;

use tokio_tungstenite::tungstenite;

use crate::ws::state::ConnectionState;

/// Errors raised while configuring or running a chat session.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured endpoint is not a valid WebSocket URL.
    #[error("invalid websocket url: {0}")]
    InvalidUrl(String),

    /// The TCP connection or WebSocket handshake failed.
    #[error("failed to connect: {0}")]
    Connect(#[source] tungstenite::Error),

    /// The handshake did not complete within the configured timeout.
    #[error("connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The transport failed after the connection was open.
    #[error("transport error: {0}")]
    Transport(#[source] tungstenite::Error),

    /// An outbound message could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inbound text frame was not a JSON chat object.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A frame was about to be sent while the connection was not open.
    #[error("connection is not open (state: {0})")]
    NotOpen(ConnectionState),

    /// A lifecycle transition was requested from the wrong state.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the connection was in.
        from: ConnectionState,
        /// State that was requested.
        to: ConnectionState,
    },
}

impl ClientError {
    /// Returns `true` if the error happened before the connection opened.
    #[must_use]
    pub const fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::Connect(_) | Self::ConnectTimeout(_)
        )
    }
}
