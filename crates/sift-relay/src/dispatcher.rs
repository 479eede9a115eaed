//! Per-message pipeline: admit, look up subscribers, evaluate, throttle, forward.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use sift_core::config::RelayConfig;
use sift_core::matching::{FilterEngine, MatchedFilter};

use crate::forwarder::{forward_with_retry, ForwardError, Forwarder};
use crate::ingest::{admit, IncomingMessage, SkipReason};
use crate::store::SubscriptionStore;
use crate::throttle::ForwardThrottle;

/// Outcome for one subscriber of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Forwarded to `destination`.
    Forwarded {
        user_id: i64,
        destination: i64,
        filter: MatchedFilter,
    },
    /// Matched but the forward failed.
    Failed {
        user_id: i64,
        destination: i64,
        error: ForwardError,
    },
    /// No filter matched.
    NotMatched { user_id: i64 },
    /// User unknown or without filters.
    Skipped { user_id: i64 },
}

/// What happened to one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchReport {
    /// Not evaluated.
    Skipped(SkipReason),
    /// Nobody subscribes to the chat.
    NoSubscribers,
    /// Evaluated for every subscriber.
    Evaluated(Vec<Delivery>),
    /// The store failed; handling stopped.
    StoreError(String),
}

impl DispatchReport {
    /// Number of successful forwards.
    pub fn forwarded(&self) -> usize {
        match self {
            Self::Evaluated(deliveries) => deliveries
                .iter()
                .filter(|d| matches!(d, Delivery::Forwarded { .. }))
                .count(),
            _ => 0,
        }
    }
}

/// Routes monitored-chat messages to subscribed users.
pub struct Dispatcher {
    store: Arc<dyn SubscriptionStore>,
    engine: FilterEngine,
    forwarder: Arc<dyn Forwarder>,
    throttle: ForwardThrottle,
    config: RelayConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        engine: FilterEngine,
        forwarder: Arc<dyn Forwarder>,
        config: RelayConfig,
    ) -> Self {
        Self {
            store,
            engine,
            forwarder,
            throttle: ForwardThrottle::new(config.min_forward_interval()),
            config,
        }
    }

    /// Handle one message. Subscribers are processed sequentially.
    pub async fn handle(&self, message: &IncomingMessage) -> DispatchReport {
        let text = match admit(message) {
            Ok(text) => text,
            Err(reason) => {
                debug!(chat_id = message.chat_id, message_id = message.id, reason = %reason, "Message skipped");
                return DispatchReport::Skipped(reason);
            }
        };

        let subscriptions = match self.store.subscriptions_for_chat(message.chat_id).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!(chat_id = message.chat_id, error = %e, "Failed to load subscriptions");
                return DispatchReport::StoreError(e.to_string());
            }
        };
        if subscriptions.is_empty() {
            debug!(chat_id = message.chat_id, "No subscriptions for chat");
            return DispatchReport::NoSubscribers;
        }

        info!(
            chat_id = message.chat_id,
            chat = message.chat_title.as_deref().unwrap_or_default(),
            subscribers = subscriptions.len(),
            "Processing message"
        );

        let mut deliveries = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            let user_id = subscription.user_id;

            let user = match self.store.user(user_id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    warn!(user_id, "Subscriber not found, skipping");
                    deliveries.push(Delivery::Skipped { user_id });
                    continue;
                }
                Err(e) => {
                    error!(user_id, error = %e, "Failed to load user");
                    return DispatchReport::StoreError(e.to_string());
                }
            };

            let filters = match self.store.filters_for_user(user_id).await {
                Ok(filters) => filters,
                Err(e) => {
                    error!(user_id, error = %e, "Failed to load filters");
                    return DispatchReport::StoreError(e.to_string());
                }
            };
            if filters.is_empty() {
                debug!(user_id, "User has no filters, skipping");
                deliveries.push(Delivery::Skipped { user_id });
                continue;
            }

            let decision = self.engine.evaluate(text, &filters).await;
            let Some(filter) = decision.matched.filter(|_| decision.forward) else {
                debug!(user_id, filters = filters.len(), "No filter matched");
                deliveries.push(Delivery::NotMatched { user_id });
                continue;
            };

            let destination = user.destination();
            deliveries.push(self.deliver(user_id, destination, filter, message).await);
        }

        DispatchReport::Evaluated(deliveries)
    }

    async fn deliver(
        &self,
        user_id: i64,
        destination: i64,
        filter: MatchedFilter,
        message: &IncomingMessage,
    ) -> Delivery {
        let guard = self.throttle.acquire(destination).await;

        match forward_with_retry(self.forwarder.as_ref(), destination, message, &self.config.retry_policy).await {
            Ok(()) => {
                guard.record();
                info!(user_id, destination, filter_id = filter.filter_id, kind = filter.kind, "Message forwarded");
                Delivery::Forwarded {
                    user_id,
                    destination,
                    filter,
                }
            }
            Err(e) => {
                error!(user_id, destination, error = %e, "Forward failed");
                Delivery::Failed {
                    user_id,
                    destination,
                    error: e,
                }
            }
        }
    }
}
