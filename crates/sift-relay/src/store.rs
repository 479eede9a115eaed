//! Users, subscriptions and filters the relay reads per message.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sift_core::error::{SiftError, SiftResult};
use sift_core::types::{Filter, FilterRecord};

/// A user who receives forwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Where forwards go; the user's own chat when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_chat_id: Option<i64>,
}

impl User {
    /// Destination for this user's forwards.
    pub fn destination(&self) -> i64 {
        self.target_chat_id
            .filter(|id| *id != 0)
            .unwrap_or(self.user_id)
    }
}

/// A user's subscription to a monitored chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: i64,
    pub chat_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_title: Option<String>,
}

/// A stored filter row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFilter {
    pub id: i64,
    pub user_id: i64,
    #[serde(flatten)]
    pub record: FilterRecord,
}

impl StoredFilter {
    pub fn to_filter(&self) -> Filter {
        Filter::from_record(self.id, self.user_id, &self.record)
    }
}

/// Read access to the relay's persisted state.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Subscriptions on `chat_id`, in stored order.
    async fn subscriptions_for_chat(&self, chat_id: i64) -> SiftResult<Vec<Subscription>>;

    /// The user with `user_id`, if known.
    async fn user(&self, user_id: i64) -> SiftResult<Option<User>>;

    /// The user's filters, in stored order.
    async fn filters_for_user(&self, user_id: i64) -> SiftResult<Vec<Filter>>;
}

/// Serializable state of an in-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub filters: Vec<StoredFilter>,
    pub subscriptions: Vec<Subscription>,
}

impl Snapshot {
    /// Load a snapshot from a JSON, YAML or TOML file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> SiftResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SiftError::store(format!("Failed to read {}: {}", path.display(), e)))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| SiftError::store(format!("Invalid store file {}: {}", path.display(), e))),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| SiftError::store(format!("Invalid store file {}: {}", path.display(), e))),
            Some("toml") => toml::from_str(&content)
                .map_err(|e| SiftError::store(format!("Invalid store file {}: {}", path.display(), e))),
            _ => Err(SiftError::store(format!(
                "Unsupported store file format: {}",
                path.display()
            ))),
        }
    }
}

/// Store backed by an immutable snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    users: HashMap<i64, User>,
    filters: HashMap<i64, Vec<Filter>>,
    subscriptions: HashMap<i64, Vec<Subscription>>,
}

impl InMemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let users = snapshot
            .users
            .into_iter()
            .map(|user| (user.user_id, user))
            .collect();

        let mut filters: HashMap<i64, Vec<Filter>> = HashMap::new();
        for stored in &snapshot.filters {
            filters.entry(stored.user_id).or_default().push(stored.to_filter());
        }

        let mut subscriptions: HashMap<i64, Vec<Subscription>> = HashMap::new();
        for subscription in snapshot.subscriptions {
            subscriptions
                .entry(subscription.chat_id)
                .or_default()
                .push(subscription);
        }

        Self {
            users,
            filters,
            subscriptions,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> SiftResult<Self> {
        Snapshot::from_file(path).map(Self::new)
    }

    /// Number of monitored chats.
    pub fn chat_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn subscriptions_for_chat(&self, chat_id: i64) -> SiftResult<Vec<Subscription>> {
        Ok(self.subscriptions.get(&chat_id).cloned().unwrap_or_default())
    }

    async fn user(&self, user_id: i64) -> SiftResult<Option<User>> {
        Ok(self.users.get(&user_id).cloned())
    }

    async fn filters_for_user(&self, user_id: i64) -> SiftResult<Vec<Filter>> {
        Ok(self.filters.get(&user_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::types::FilterRule;
    use std::io::Write;

    const SNAPSHOT_YAML: &str = r#"
users:
  - user_id: 10
    username: ann
  - user_id: 20
    target_chat_id: -500
filters:
  - id: 1
    user_id: 10
    keywords: "дедлайн, срок"
  - id: 2
    user_id: 10
    topics: "встреча"
    use_semantic: true
  - id: 3
    user_id: 20
    topics: "спорт"
subscriptions:
  - user_id: 10
    chat_id: -100
    chat_title: Team
  - user_id: 20
    chat_id: -100
"#;

    fn write_temp(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(ext).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_yaml_snapshot() {
        let file = write_temp(".yaml", SNAPSHOT_YAML);
        let store = InMemoryStore::from_file(file.path()).unwrap();
        assert_eq!(store.chat_count(), 1);

        let subs = store.subscriptions_for_chat(-100).await.unwrap();
        assert_eq!(subs.iter().map(|s| s.user_id).collect::<Vec<_>>(), vec![10, 20]);

        let filters = store.filters_for_user(10).await.unwrap();
        assert_eq!(filters[0].rule, Some(FilterRule::Keywords("дедлайн, срок".to_string())));
        assert_eq!(filters[1].rule, Some(FilterRule::Semantic("встреча".to_string())));

        // Topics without use_semantic are inert
        let filters = store.filters_for_user(20).await.unwrap();
        assert_eq!(filters[0].rule, None);
    }

    #[tokio::test]
    async fn test_load_json_snapshot() {
        let json = r#"{"users":[{"user_id":1}],"subscriptions":[{"user_id":1,"chat_id":-2}]}"#;
        let file = write_temp(".json", json);
        let store = InMemoryStore::from_file(file.path()).unwrap();
        assert!(store.user(1).await.unwrap().is_some());
        assert!(store.filters_for_user(1).await.unwrap().is_empty());
        assert!(store.subscriptions_for_chat(-3).await.unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".ini", "users = []");
        let err = Snapshot::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SiftError::Store(_)));
    }

    #[test]
    fn test_destination_fallback() {
        let user = User {
            user_id: 10,
            username: None,
            target_chat_id: None,
        };
        assert_eq!(user.destination(), 10);

        let user = User {
            target_chat_id: Some(-500),
            ..user
        };
        assert_eq!(user.destination(), -500);
    }
}
