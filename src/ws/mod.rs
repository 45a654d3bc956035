//! WebSocket layer: connection lifecycle, wire messages, event reporting.
//!
//! A [`ChatClient`] drives one connection through
//! [`ConnectionState`] and reports each [`ConnectionEvent`] to a
//! [`ChatObserver`].

pub mod connection;
pub mod events;
pub mod messages;
pub mod observer;
pub mod state;

pub use connection::ChatClient;
pub use events::{CloseInfo, CloseInitiator, ConnectionEvent, SessionSummary};
pub use messages::{ChatMessage, InboundMessage};
pub use observer::{ChannelObserver, ChatObserver, TracingObserver};
pub use state::ConnectionState;
