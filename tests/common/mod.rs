//! Local chat server used by the integration tests.
//!
//! Mimics the chatbot endpoint: reads one chat message, answers with
//! `Bot: You said '...'`, then behaves according to [`Behavior`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::Mutex;

/// Path the real chatbot serves the chat socket on.
pub const CHAT_PATH: &str = "/api/v1/websockets/ws/chat";

/// What the server does after reading the first chat message.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Reply once, then close with code 1000.
    ReplyAndClose,
    /// Send an invalid JSON frame, then a reply, then close.
    MalformedThenReply,
    /// Reply with a naive timestamp and oddly typed metadata, then close.
    LooselyTypedReply,
    /// Reply once and keep the connection open until the client closes.
    ReplyAndWait,
    /// Drop the connection without a close frame.
    DropAfterRead,
}

#[derive(Debug, Clone)]
struct ServerState {
    behavior: Behavior,
    received: Arc<Mutex<Vec<String>>>,
}

/// A running test server.
#[derive(Debug)]
pub struct TestServer {
    /// WebSocket URL of the chat endpoint.
    pub url: String,
    received: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Starts a server on an ephemeral local port.
    pub async fn start(behavior: Behavior) -> std::io::Result<Self> {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            behavior,
            received: Arc::clone(&received),
        };
        let app = Router::new()
            .route(CHAT_PATH, get(chat_ws))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            url: format!("ws://{addr}{CHAT_PATH}"),
            received,
        })
    }

    /// Text frames the server has read so far.
    pub async fn received(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }
}

/// Builds the reply the chatbot sends for a chat message.
pub fn bot_reply(user_text: &str) -> String {
    serde_json::json!({
        "message": format!("Bot: You said '{user_text}'"),
        "sender": "bot",
        "timestamp": null,
        "type": "text",
    })
    .to_string()
}

/// Builds a reply the way the Python backend can emit it: a timestamp
/// without an offset, a numeric `sender`, and extra fields.
pub fn loosely_typed_reply(user_text: &str) -> String {
    serde_json::json!({
        "message": format!("Bot: You said '{user_text}'"),
        "sender": 7,
        "timestamp": "2025-06-01T12:30:00.123456",
        "type": "text",
        "agent_used": "faq",
    })
    .to_string()
}

async fn chat_ws(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve(socket, state))
}

async fn serve(mut socket: WebSocket, state: ServerState) {
    let Some(text) = next_text(&mut socket).await else {
        return;
    };
    state.received.lock().await.push(text.clone());

    let user_text = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_default();

    match state.behavior {
        Behavior::ReplyAndClose => {
            let _ = socket.send(Message::text(bot_reply(&user_text))).await;
            close(&mut socket).await;
            drain(&mut socket, &state).await;
        }
        Behavior::MalformedThenReply => {
            let _ = socket.send(Message::text("{not json")).await;
            let _ = socket.send(Message::text(bot_reply(&user_text))).await;
            close(&mut socket).await;
            drain(&mut socket, &state).await;
        }
        Behavior::LooselyTypedReply => {
            let _ = socket
                .send(Message::text(loosely_typed_reply(&user_text)))
                .await;
            close(&mut socket).await;
            drain(&mut socket, &state).await;
        }
        Behavior::ReplyAndWait => {
            let _ = socket.send(Message::text(bot_reply(&user_text))).await;
            drain(&mut socket, &state).await;
        }
        Behavior::DropAfterRead => drop(socket),
    }
}

async fn next_text(socket: &mut WebSocket) -> Option<String> {
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => return Some(text.as_str().to_string()),
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}

async fn close(socket: &mut WebSocket) {
    let frame = CloseFrame {
        code: close_code::NORMAL,
        reason: Utf8Bytes::from_static("bye"),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

/// Reads until the connection ends, recording any further text frames.
async fn drain(socket: &mut WebSocket, state: &ServerState) {
    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Text(text) = msg {
            state.received.lock().await.push(text.as_str().to_string());
        }
    }
}
