//! # ithaka-chat-client
//!
//! WebSocket client for the Ithaka chatbot chat endpoint.
//!
//! Opens one connection, sends one JSON chat message when it opens,
//! reports every reply, and reports the disconnect. There is no
//! reconnection and no retry.
//!
//! ## Architecture
//!
//! ```text
//! main.rs
//!     │
//!     ├── ClientConfig (config)         .env + environment
//!     │
//!     ├── ChatClient (ws/connection)    Connecting → Open → Closed
//!     │     ├── ChatMessage / InboundMessage (ws/messages)
//!     │     └── ChatObserver (ws/observer)
//!     │
//!     └── tokio-tungstenite
//! ```

pub mod config;
pub mod error;
pub mod ws;
