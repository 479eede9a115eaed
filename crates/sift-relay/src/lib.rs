//! sift-relay - Message relay built on the sift filter engine.
//!
//! Watches group and channel messages, evaluates each subscriber's filters
//! and forwards matches to the subscriber's target chat, spacing forwards per
//! destination and retrying transient failures.

pub mod dispatcher;
pub mod factory;
pub mod forwarder;
pub mod ingest;
pub mod store;
pub mod throttle;

pub use dispatcher::{Delivery, DispatchReport, Dispatcher};
pub use factory::{build_backend, create_backend, create_engine};
pub use forwarder::{forward_with_retry, ForwardError, Forwarder, LogForwarder};
pub use ingest::{admit, IncomingMessage, Sender, SkipReason};
pub use store::{InMemoryStore, Snapshot, StoredFilter, Subscription, SubscriptionStore, User};
pub use throttle::{ForwardThrottle, ThrottleGuard};
