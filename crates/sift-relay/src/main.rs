//! sift - relay binary.
//!
//! Reads newline-delimited JSON messages from stdin and dispatches each one
//! through a logging forwarder.

use std::sync::Arc;

use sift_core::SiftConfig;
use sift_relay::{create_engine, DispatchReport, Dispatcher, IncomingMessage, InMemoryStore, LogForwarder};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = match std::env::var("SIFT_CONFIG") {
        Ok(path) => SiftConfig::from_file(&path)?.with_env_overrides(),
        Err(_) => SiftConfig::from_env(),
    };
    for warning in config.validate() {
        warn!("{}", warning);
    }

    let store = match std::env::var("SIFT_STORE") {
        Ok(path) => InMemoryStore::from_file(&path)?,
        Err(_) => {
            warn!("SIFT_STORE is not set; no chats are monitored");
            InMemoryStore::default()
        }
    };

    info!(
        provider = ?config.semantic.provider,
        chats = store.chat_count(),
        min_interval_ms = config.relay.min_forward_interval_ms,
        "sift relay starting"
    );

    let engine = create_engine(&config.semantic);
    let dispatcher = Dispatcher::new(Arc::new(store), engine, Arc::new(LogForwarder), config.relay.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handled = 0usize;
    let mut forwarded = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let message: IncomingMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Skipping malformed input line");
                continue;
            }
        };

        let report = dispatcher.handle(&message).await;
        if let DispatchReport::StoreError(ref e) = report {
            warn!(message_id = message.id, error = %e, "Message dropped after store error");
        }
        handled += 1;
        forwarded += report.forwarded();
    }

    info!(handled, forwarded, "Input exhausted, shutting down");
    Ok(())
}
