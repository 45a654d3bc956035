//! Connection lifecycle state machine.
//!
//! A chat connection moves `Connecting → Open → Closed` exactly once.
//! There is no way back out of [`ConnectionState::Closed`]: the client
//! never reconnects.

use std::fmt;

use crate::error::ClientError;

/// Lifecycle state of a single chat connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Handshake in progress. Nothing may be sent yet.
    #[default]
    Connecting,
    /// Handshake complete; frames may be sent.
    Open,
    /// Terminal state.
    Closed,
}

impl ConnectionState {
    /// Moves from `Connecting` to `Open`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidTransition`] from any other state.
    pub fn on_open(&mut self) -> Result<(), ClientError> {
        match self {
            Self::Connecting => {
                *self = Self::Open;
                Ok(())
            }
            Self::Open | Self::Closed => Err(ClientError::InvalidTransition {
                from: *self,
                to: Self::Open,
            }),
        }
    }

    /// Moves to `Closed` from any state.
    ///
    /// Returns `true` only on the first call, so callers can emit the
    /// close notification exactly once.
    pub fn on_close(&mut self) -> bool {
        let was_closed = self.is_closed();
        *self = Self::Closed;
        !was_closed
    }

    /// Checks that outbound frames are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotOpen`] unless the state is `Open`.
    pub fn ensure_open(&self) -> Result<(), ClientError> {
        match self {
            Self::Open => Ok(()),
            Self::Connecting | Self::Closed => Err(ClientError::NotOpen(*self)),
        }
    }

    /// Returns `true` once the connection has closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
