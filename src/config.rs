//! Client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every variable is optional; the
//! defaults reproduce the stock demo session against a local server.

use std::time::Duration;

use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use crate::error::ClientError;
use crate::ws::messages::{
    ChatMessage, DEFAULT_MESSAGE, DEFAULT_MESSAGE_TYPE, DEFAULT_SENDER, DEFAULT_SESSION_ID,
};

/// Default chat endpoint.
pub const DEFAULT_URL: &str = "ws://localhost:8000/api/v1/websockets/ws/chat";

/// Default handshake timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses `"text"` or `"json"` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Top-level client configuration.
///
/// Loaded once at startup via [`ClientConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint (`CHAT_WS_URL`).
    pub url: String,

    /// Chat message sent once the connection opens.
    pub message: ChatMessage,

    /// Handshake timeout (`CHAT_CONNECT_TIMEOUT_SECS`).
    pub connect_timeout: Duration,

    /// Log output format (`LOG_FORMAT`).
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            message: ChatMessage::default(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            log_format: LogFormat::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file,
    /// then delegates to [`ClientConfig::from_vars`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `CHAT_WS_URL` is set but is
    /// not a usable WebSocket URL.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds configuration from a variable lookup function.
    ///
    /// Missing or unparsable optional values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL cannot be turned
    /// into a WebSocket handshake request.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("CHAT_WS_URL").unwrap_or_else(|| DEFAULT_URL.to_string());
        validate_url(&url)?;

        let message = ChatMessage::new(
            lookup("CHAT_MESSAGE").unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            lookup("CHAT_SENDER").unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            lookup("CHAT_MESSAGE_TYPE").unwrap_or_else(|| DEFAULT_MESSAGE_TYPE.to_string()),
            lookup("CHAT_SESSION_ID").unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
        );

        let connect_timeout_secs = parse_var(
            &lookup,
            "CHAT_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        );

        let log_format = lookup("LOG_FORMAT")
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            url,
            message,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            log_format,
        })
    }
}

/// Checks that `url` can start a WebSocket handshake.
fn validate_url(url: &str) -> Result<(), ClientError> {
    url.into_client_request()
        .map(|_| ())
        .map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ClientError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let Ok(config) = load(&[]) else {
            panic!("defaults must load");
        };
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.url, "ws://localhost:8000/api/v1/websockets/ws/chat");
        assert_eq!(config.message.session_id, "mi-sesion-websocket");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_applied() {
        let Ok(config) = load(&[
            ("CHAT_WS_URL", "wss://chat.example.org/ws"),
            ("CHAT_MESSAGE", "hello"),
            ("CHAT_SENDER", "tester"),
            ("CHAT_MESSAGE_TYPE", "question"),
            ("CHAT_SESSION_ID", "abc-123"),
            ("CHAT_CONNECT_TIMEOUT_SECS", "3"),
            ("LOG_FORMAT", "JSON"),
        ]) else {
            panic!("overrides must load");
        };
        assert_eq!(config.url, "wss://chat.example.org/ws");
        assert_eq!(
            config.message,
            ChatMessage::new("hello", "tester", "question", "abc-123")
        );
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_numbers_fall_back() {
        let Ok(config) = load(&[("CHAT_CONNECT_TIMEOUT_SECS", "soon")]) else {
            panic!("bad timeout must not fail");
        };
        assert_eq!(
            config.connect_timeout,
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn unknown_log_format_falls_back() {
        let Ok(config) = load(&[("LOG_FORMAT", "xml")]) else {
            panic!("bad format must not fail");
        };
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn log_format_accepts_only_text_and_json() {
        assert_eq!(LogFormat::parse("Text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("pretty"), None);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let Err(ClientError::InvalidUrl(msg)) = load(&[("CHAT_WS_URL", "not a url")]) else {
            panic!("expected invalid url");
        };
        assert!(msg.contains("not a url"));
    }
}
