//! In-memory user store
//!
//! Records are kept in insertion order behind a single async mutex. Every
//! operation takes the lock once, so each request observes and mutates the
//! list atomically.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::{NewUser, User, UserPatch};

/// How ids are assigned to created users
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Current record count + 1. Reuses ids after a delete, which can leave
    /// two records sharing one id.
    #[default]
    Length,
    /// Highest id ever issued + 1. Never reuses an id.
    Sequence,
}

struct Inner {
    users: Vec<User>,
    last_issued: i64,
}

impl Inner {
    fn next_id(&mut self, strategy: IdStrategy) -> i64 {
        let id = match strategy {
            IdStrategy::Length => self.users.len() as i64 + 1,
            IdStrategy::Sequence => self.last_issued + 1,
        };
        self.last_issued = self.last_issued.max(id);
        id
    }
}

/// Shared, mutex-guarded list of users
#[derive(Clone)]
pub struct UserStore {
    inner: Arc<Mutex<Inner>>,
    strategy: IdStrategy,
}

impl UserStore {
    /// Create an empty store
    pub fn new(strategy: IdStrategy) -> Self {
        Self::with_users(strategy, Vec::new())
    }

    /// Create a store holding the two startup users
    pub fn seeded(strategy: IdStrategy) -> Self {
        Self::with_users(strategy, seed_users())
    }

    /// Create a store with an initial list of users
    pub fn with_users(strategy: IdStrategy, users: Vec<User>) -> Self {
        let last_issued = users.iter().map(|u| u.id).max().unwrap_or(0);
        Self {
            inner: Arc::new(Mutex::new(Inner { users, last_issued })),
            strategy,
        }
    }

    /// Id strategy in use
    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// All users in insertion order
    pub async fn list(&self) -> Vec<User> {
        self.inner.lock().await.users.clone()
    }

    /// First user with the given id
    pub async fn get(&self, id: i64) -> Option<User> {
        let inner = self.inner.lock().await;
        inner.users.iter().find(|u| u.id == id).cloned()
    }

    /// Append a user with a freshly assigned id
    pub async fn create(&self, new_user: NewUser) -> User {
        let mut inner = self.inner.lock().await;
        let user = User {
            id: inner.next_id(self.strategy),
            name: new_user.name,
            email: new_user.email,
        };
        inner.users.push(user.clone());
        user
    }

    /// Patch the first user with the given id
    ///
    /// Returns the updated record, or `None` when no user matches.
    pub async fn update(&self, id: i64, patch: UserPatch) -> Option<User> {
        let mut inner = self.inner.lock().await;
        let user = inner.users.iter_mut().find(|u| u.id == id)?;
        patch.apply(user);
        Some(user.clone())
    }

    /// Remove every user with the given id and return how many were removed
    pub async fn delete(&self, id: i64) -> usize {
        let mut inner = self.inner.lock().await;
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        before - inner.users.len()
    }

    /// Number of users
    pub async fn len(&self) -> usize {
        self.inner.lock().await.users.len()
    }

    /// Whether the store holds no users
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Users present at every startup
pub fn seed_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
        },
        User {
            id: 2,
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let store = UserStore::seeded(IdStrategy::Length);
        let users = store.list().await;
        assert_eq!(users, seed_users());
        assert_eq!(store.get(1).await.unwrap().name, "John Doe");
    }

    #[tokio::test]
    async fn test_create_assigns_count_plus_one() {
        let store = UserStore::seeded(IdStrategy::Length);
        let created = store.create(new_user("Ann")).await;
        assert_eq!(created.id, 3);
        let created = store.create(new_user("Bob")).await;
        assert_eq!(created.id, 4);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_length_strategy_reuses_id_after_delete() {
        let store = UserStore::seeded(IdStrategy::Length);
        assert_eq!(store.delete(1).await, 1);

        // One record left, so the next id is 2 and collides with Jane
        let created = store.create(new_user("Ann")).await;
        assert_eq!(created.id, 2);

        let ids: Vec<i64> = store.list().await.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 2]);

        // Lookups return the first match
        assert_eq!(store.get(2).await.unwrap().name, "Jane Smith");

        // Delete removes every record with the id
        assert_eq!(store.delete(2).await, 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_sequence_strategy_never_reuses_ids() {
        let store = UserStore::seeded(IdStrategy::Sequence);
        store.delete(2).await;

        let created = store.create(new_user("Ann")).await;
        assert_eq!(created.id, 3);

        store.delete(3).await;
        let created = store.create(new_user("Bob")).await;
        assert_eq!(created.id, 4);
    }

    #[tokio::test]
    async fn test_update_patches_in_place() {
        let store = UserStore::seeded(IdStrategy::Length);
        let patch = UserPatch {
            name: Some("Jane X".to_string()),
            email: None,
        };

        let updated = store.update(2, patch).await.unwrap();
        assert_eq!(updated.name, "Jane X");
        assert_eq!(updated.email, "jane@example.com");
        assert_eq!(store.get(2).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = UserStore::seeded(IdStrategy::Length);
        assert!(store.update(999, UserPatch::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_noop() {
        let store = UserStore::seeded(IdStrategy::Length);
        assert_eq!(store.delete(999).await, 0);
        assert_eq!(store.list().await, seed_users());
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = UserStore::new(IdStrategy::Length);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_user(&format!("U{}", i))).await.id })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (1..=20).collect::<Vec<i64>>());
    }

    #[test]
    fn test_id_strategy_deserializes_lowercase() {
        let strategy: IdStrategy = serde_json::from_str("\"sequence\"").unwrap();
        assert_eq!(strategy, IdStrategy::Sequence);
        assert_eq!(IdStrategy::default(), IdStrategy::Length);
    }
}
