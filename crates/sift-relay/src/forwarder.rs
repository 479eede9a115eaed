//! Forwarding matched messages, with rate-limit handling and retry.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use tracing::{info, warn};

use sift_core::config::RetryPolicy;

use crate::ingest::IncomingMessage;

/// Failure to forward a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    /// The server asked to wait before sending again.
    #[error("flood wait: retry after {0:?}")]
    FloodWait(Duration),
    /// The account is restricted from messaging this peer.
    #[error("peer flood: account is restricted")]
    PeerFlood,
    /// Transient transport failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Permanent rejection.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ForwardError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Sends a message to a destination chat.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, destination: i64, message: &IncomingMessage) -> Result<(), ForwardError>;
}

/// Forwarder that only logs. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogForwarder;

#[async_trait]
impl Forwarder for LogForwarder {
    async fn forward(&self, destination: i64, message: &IncomingMessage) -> Result<(), ForwardError> {
        info!(
            destination,
            chat_id = message.chat_id,
            message_id = message.id,
            text = message.body().unwrap_or_default(),
            "Forward"
        );
        Ok(())
    }
}

/// Forward with retry.
///
/// Transport errors are retried with exponential backoff per `policy`. A
/// flood wait is honoured once: sleep for the requested delay and try again,
/// giving up if that attempt fails too. Other errors are returned as is.
pub async fn forward_with_retry(
    forwarder: &dyn Forwarder,
    destination: i64,
    message: &IncomingMessage,
    policy: &RetryPolicy,
) -> Result<(), ForwardError> {
    let attempt = || async {
        (|| forwarder.forward(destination, message))
            .retry(
                ExponentialBuilder::default()
                    .with_max_times(policy.max_retries as usize)
                    .with_min_delay(Duration::from_millis(policy.initial_delay_ms))
                    .with_max_delay(Duration::from_millis(policy.max_delay_ms))
                    .with_factor(policy.multiplier),
            )
            .when(ForwardError::is_transient)
            .notify(|err, dur| {
                warn!(destination, error = %err, "Forward failed, retrying in {:?}", dur);
            })
            .await
    };

    match attempt().await {
        Err(ForwardError::FloodWait(wait)) => {
            warn!(destination, wait_secs = wait.as_secs(), "Flood wait, retrying once after delay");
            tokio::time::sleep(wait).await;
            attempt().await
        }
        Err(ForwardError::PeerFlood) => {
            warn!(destination, "Peer flood: account is restricted, giving up");
            Err(ForwardError::PeerFlood)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::{mock, Sequence};
    use tokio::time::Instant;

    mock! {
        pub Transport {}

        #[async_trait]
        impl Forwarder for Transport {
            async fn forward(&self, destination: i64, message: &IncomingMessage) -> Result<(), ForwardError>;
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay_ms: 10,
            max_delay_ms: 100,
            multiplier: 2.0,
        }
    }

    fn message() -> IncomingMessage {
        IncomingMessage {
            id: 1,
            chat_id: -100,
            text: Some("deadline".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try() {
        let mut transport = MockTransport::new();
        transport.expect_forward().times(1).returning(|_, _| Ok(()));

        assert_eq!(forward_with_retry(&transport, 5, &message(), &policy()).await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_retried() {
        let mut seq = Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_forward()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ForwardError::Transport("connection reset".into())));
        transport
            .expect_forward()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        assert_eq!(forward_with_retry(&transport, 5, &message(), &policy()).await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_retries_exhausted() {
        let mut transport = MockTransport::new();
        transport
            .expect_forward()
            .times(4)
            .returning(|_, _| Err(ForwardError::Transport("down".into())));

        let result = forward_with_retry(&transport, 5, &message(), &policy()).await;
        assert_eq!(result, Err(ForwardError::Transport("down".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flood_wait_retried_once_after_delay() {
        let mut seq = Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_forward()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ForwardError::FloodWait(Duration::from_secs(30))));
        transport
            .expect_forward()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let start = Instant::now();
        assert_eq!(forward_with_retry(&transport, 5, &message(), &policy()).await, Ok(()));
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_flood_wait_gives_up() {
        let mut transport = MockTransport::new();
        transport
            .expect_forward()
            .times(2)
            .returning(|_, _| Err(ForwardError::FloodWait(Duration::from_secs(5))));

        let result = forward_with_retry(&transport, 5, &message(), &policy()).await;
        assert_eq!(result, Err(ForwardError::FloodWait(Duration::from_secs(5))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_not_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect_forward()
            .times(1)
            .returning(|_, _| Err(ForwardError::PeerFlood));
        assert_eq!(
            forward_with_retry(&transport, 5, &message(), &policy()).await,
            Err(ForwardError::PeerFlood)
        );

        let mut transport = MockTransport::new();
        transport
            .expect_forward()
            .times(1)
            .returning(|_, _| Err(ForwardError::Rejected("chat not found".into())));
        assert!(matches!(
            forward_with_retry(&transport, 5, &message(), &policy()).await,
            Err(ForwardError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_log_forwarder() {
        assert_eq!(LogForwarder.forward(5, &message()).await, Ok(()));
    }
}
