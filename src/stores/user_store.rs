use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::user::User;

/// Storage for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by username.
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Looks up a user by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Returns every user.
    async fn list(&self) -> Result<Vec<User>>;

    /// Inserts a new user. Fails with `Conflict` when the id or
    /// username is already taken.
    async fn insert(&self, user: User) -> Result<User>;

    /// Replaces an existing user. Fails with `NotFound` when absent.
    async fn update(&self, user: User) -> Result<User>;

    /// Removes a user. Fails with `NotFound` when absent.
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Counts stored users.
    async fn count(&self) -> Result<usize>;
}

/// An in-memory user store for tests and embedding.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let users = self.users.lock().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.username.cmp(&b.username)));
        Ok(all)
    }

    async fn insert(&self, user: User) -> Result<User> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.id) {
            return Err(AppError::Conflict(format!("duplicate user id {}", user.id)));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("username already taken".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User> {
        let mut users = self.users.lock().await;
        if !users.contains_key(&user.id) {
            return Err(AppError::NotFound);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.lock().await;
        users.remove(&id).map(|_| ()).ok_or(AppError::NotFound)
    }

    async fn count(&self) -> Result<usize> {
        let users = self.users.lock().await;
        Ok(users.len())
    }
}
