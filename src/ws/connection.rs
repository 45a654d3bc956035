//! WebSocket connection lifecycle.
//!
//! Opens one connection, sends the configured chat message once, reports
//! every inbound frame to the observer, and reports the close exactly
//! once. There is no reconnection.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::Instrument;

use super::events::{CloseInfo, CloseInitiator, ConnectionEvent, SessionSummary};
use super::messages::{ChatMessage, InboundMessage};
use super::observer::ChatObserver;
use super::state::ConnectionState;
use crate::config::ClientConfig;
use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on waiting for the peer to finish the close handshake.
const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Chat client for a single session against the configured endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient<O> {
    config: ClientConfig,
    observer: O,
}

impl<O: ChatObserver> ChatClient<O> {
    /// Creates a new client. Nothing is connected until [`Self::run`].
    #[must_use]
    pub const fn new(config: ClientConfig, observer: O) -> Self {
        Self { config, observer }
    }

    /// Runs one session until the server closes the connection.
    ///
    /// # Errors
    ///
    /// See [`Self::run_until`].
    pub async fn run(&self) -> Result<SessionSummary, ClientError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs one session until the server closes the connection or
    /// `shutdown` completes, whichever comes first.
    ///
    /// When `shutdown` completes the client sends a close frame and waits
    /// for the close handshake to finish. A [`ConnectionEvent::Closed`] is
    /// reported exactly once on every path, including connect failures.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Connect`] or [`ClientError::ConnectTimeout`] if the
    ///   handshake fails.
    /// - [`ClientError::Transport`] if the connection breaks after opening.
    /// - [`ClientError::Serialization`] if the chat message cannot be
    ///   encoded.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<SessionSummary, ClientError>
    where
        F: Future<Output = ()>,
    {
        let span = tracing::info_span!(
            "chat_session",
            url = %self.config.url,
            session_id = %self.config.message.session_id,
        );
        self.run_session(shutdown).instrument(span).await
    }

    async fn run_session<F>(&self, shutdown: F) -> Result<SessionSummary, ClientError>
    where
        F: Future<Output = ()>,
    {
        let mut state = ConnectionState::default();

        let stream = match self.connect().await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::error!(error = %err, "connection failed");
                if state.on_close() {
                    self.observer.on_event(&ConnectionEvent::Closed(CloseInfo::abnormal()));
                }
                return Err(err);
            }
        };

        state.on_open()?;
        self.observer.on_event(&ConnectionEvent::Connected {
            url: self.config.url.clone(),
        });

        let mut session = Session {
            stream,
            state,
            observer: &self.observer,
            frames_sent: 0,
            messages_received: 0,
            malformed_frames: 0,
            close: None,
        };

        if let Err(err) = session.send_chat(&self.config.message).await {
            session.finish(CloseInfo::abnormal());
            return Err(err);
        }

        session.pump(shutdown).await
    }

    async fn connect(&self) -> Result<WsStream, ClientError> {
        let timeout = self.config.connect_timeout;
        let handshake = tokio_tungstenite::connect_async(self.config.url.as_str());

        match tokio::time::timeout(timeout, handshake).await {
            Ok(Ok((stream, response))) => {
                tracing::debug!(status = %response.status(), "handshake complete");
                Ok(stream)
            }
            Ok(Err(err)) => Err(ClientError::Connect(err)),
            Err(_) => Err(ClientError::ConnectTimeout(timeout)),
        }
    }
}

/// An open connection and its counters.
struct Session<'a, O> {
    stream: WsStream,
    state: ConnectionState,
    observer: &'a O,
    frames_sent: usize,
    messages_received: usize,
    malformed_frames: usize,
    close: Option<CloseInfo>,
}

impl<O: ChatObserver> Session<'_, O> {
    /// Sends one chat frame. Refused unless the state is `Open`.
    async fn send_chat(&mut self, message: &ChatMessage) -> Result<(), ClientError> {
        self.state.ensure_open()?;
        let json = message.to_json()?;
        self.stream
            .send(Message::text(json))
            .await
            .map_err(ClientError::Transport)?;
        self.frames_sent += 1;
        tracing::debug!(frames_sent = self.frames_sent, "chat message sent");
        Ok(())
    }

    /// Reads frames until the connection ends.
    async fn pump<F>(mut self, shutdown: F) -> Result<SessionSummary, ClientError>
    where
        F: Future<Output = ()>,
    {
        let close_deadline = tokio::time::sleep(CLOSE_HANDSHAKE_TIMEOUT);
        tokio::pin!(shutdown, close_deadline);
        let mut closing = false;

        loop {
            tokio::select! {
                () = &mut shutdown, if !closing => {
                    closing = true;
                    tracing::debug!("closing connection");
                    close_deadline
                        .as_mut()
                        .reset(tokio::time::Instant::now() + CLOSE_HANDSHAKE_TIMEOUT);
                    if let Err(err) = self.stream.close(None).await {
                        return self.fail(err, closing);
                    }
                }
                () = &mut close_deadline, if closing => {
                    tracing::debug!("peer did not answer close frame");
                    self.finish(CloseInfo::from_frame(CloseInitiator::Local, None));
                    return Ok(self.summary());
                }
                frame = self.stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(text.as_str()),
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!(len = data.len(), "ignoring binary frame");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let initiator = if closing {
                            CloseInitiator::Local
                        } else {
                            CloseInitiator::Remote
                        };
                        self.finish(CloseInfo::from_frame(initiator, frame.as_ref()));
                        self.drain().await;
                        return Ok(self.summary());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return self.fail(err, closing),
                    None => {
                        let info = if closing {
                            CloseInfo::from_frame(CloseInitiator::Local, None)
                        } else {
                            CloseInfo::abnormal()
                        };
                        self.finish(info);
                        return Ok(self.summary());
                    }
                },
            }
        }
    }

    fn handle_text(&mut self, text: &str) {
        match InboundMessage::parse(text) {
            Ok(reply) => {
                self.messages_received += 1;
                self.observer.on_event(&ConnectionEvent::MessageReceived(reply));
            }
            Err(err) => {
                self.malformed_frames += 1;
                self.observer.on_event(&ConnectionEvent::MalformedFrame {
                    raw: text.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    /// Lets the close handshake complete after a close frame arrived.
    async fn drain(&mut self) {
        let drain = async {
            while let Some(Ok(frame)) = self.stream.next().await {
                tracing::trace!(?frame, "frame after close");
            }
        };
        if tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, drain).await.is_err() {
            tracing::debug!("peer did not finish close handshake");
        }
    }

    /// Handles a read or write error.
    ///
    /// A closed connection after we asked to close counts as a local
    /// close; anything else is abnormal.
    fn fail(
        mut self,
        err: tungstenite::Error,
        closing: bool,
    ) -> Result<SessionSummary, ClientError> {
        let handshake_done = matches!(
            err,
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
        );
        if closing && handshake_done {
            self.finish(CloseInfo::from_frame(CloseInitiator::Local, None));
            return Ok(self.summary());
        }
        tracing::warn!(error = %err, "transport error");
        self.finish(CloseInfo::abnormal());
        Err(ClientError::Transport(err))
    }

    /// Moves to `Closed` and reports it, once.
    fn finish(&mut self, info: CloseInfo) {
        if self.state.on_close() {
            self.observer.on_event(&ConnectionEvent::Closed(info.clone()));
            self.close = Some(info);
        }
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            frames_sent: self.frames_sent,
            messages_received: self.messages_received,
            malformed_frames: self.malformed_frames,
            close: self.close.clone().unwrap_or_else(CloseInfo::abnormal),
        }
    }
}
