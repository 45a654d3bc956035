//! ithaka-chat-client entry point.
//!
//! Connects to the chat endpoint, sends one message, and logs replies
//! until the server closes the connection or Ctrl-C is pressed.

use tracing_subscriber::EnvFilter;

use ithaka_chat_client::config::{ClientConfig, LogFormat};
use ithaka_chat_client::ws::{ChatClient, TracingObserver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ClientConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    tracing::info!(url = %config.url, "starting chat client");

    let client = ChatClient::new(config, TracingObserver::new());
    let summary = client
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!(
        frames_sent = summary.frames_sent,
        messages_received = summary.messages_received,
        malformed_frames = summary.malformed_frames,
        "session finished"
    );

    Ok(())
}
