//! Event sinks for connection lifecycle events.
//!
//! The connection loop never prints anything itself. It reports every
//! [`ConnectionEvent`] to an injected [`ChatObserver`]; the binary uses
//! [`TracingObserver`] and tests use [`ChannelObserver`].

use std::sync::Arc;

use tokio::sync::mpsc;

use super::events::{CloseInfo, ConnectionEvent};
use super::messages::InboundMessage;

/// Receives lifecycle events from a chat connection.
pub trait ChatObserver: Send + Sync {
    /// Called once per event, in order, from the connection task.
    fn on_event(&self, event: &ConnectionEvent);
}

impl<T: ChatObserver + ?Sized> ChatObserver for Arc<T> {
    fn on_event(&self, event: &ConnectionEvent) {
        (**self).on_event(event);
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    /// Creates a new `TracingObserver`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn log_reply(reply: &InboundMessage) {
        let sender = reply.sender.as_deref().unwrap_or("bot");
        match reply.message.as_deref() {
            Some(text) if reply.is_error() => {
                tracing::warn!(sender, message = text, "chatbot reported an error");
            }
            Some(text) => tracing::info!(sender, message = text, "bot reply"),
            None => {
                let fields = serde_json::Value::Object(reply.extra.clone());
                tracing::info!(sender, %fields, "bot reply without message field");
            }
        }
    }

    fn log_close(info: &CloseInfo) {
        tracing::info!(
            initiator = ?info.initiator,
            code = info.code,
            reason = info.reason.as_deref(),
            "connection closed"
        );
    }
}

impl ChatObserver for TracingObserver {
    fn on_event(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Connected { url } => {
                tracing::info!(%url, "connected to chatbot");
            }
            ConnectionEvent::MessageReceived(reply) => Self::log_reply(reply),
            ConnectionEvent::MalformedFrame { raw, error } => {
                tracing::warn!(%error, raw = raw.as_str(), "discarding malformed frame");
            }
            ConnectionEvent::Closed(info) => Self::log_close(info),
        }
    }
}

/// Forwards a copy of every event to an unbounded channel.
///
/// Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<ConnectionEvent>,
}

impl ChannelObserver {
    /// Creates an observer and the receiver that will see its events.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ChatObserver for ChannelObserver {
    fn on_event(&self, event: &ConnectionEvent) {
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}
