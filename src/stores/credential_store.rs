use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::credential::Credential;

/// Storage for login credentials, keyed by username.
///
/// `is_empty` doubles as the bootstrap gate: the built-in first-run
/// passwords are only honored while this store holds nothing at all.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up the credential for a username.
    async fn get(&self, username: &str) -> Result<Option<Credential>>;

    /// Inserts or replaces the credential for its username.
    async fn upsert(&self, credential: Credential) -> Result<()>;

    /// Moves a credential to a new username, keeping the secret.
    /// Fails with `NotFound` when the old name is absent and with
    /// `Conflict` when the new name is taken.
    async fn rename(&self, old_username: &str, new_username: &str) -> Result<()>;

    /// Removes the credential for a username. Absent is fine.
    async fn remove(&self, username: &str) -> Result<()>;

    /// Whether the store holds no credentials at all.
    async fn is_empty(&self) -> Result<bool>;
}

/// An in-memory credential store for tests and embedding.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: Arc<Mutex<HashMap<String, Credential>>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, username: &str) -> Result<Option<Credential>> {
        let credentials = self.credentials.lock().await;
        Ok(credentials.get(username).cloned())
    }

    async fn upsert(&self, credential: Credential) -> Result<()> {
        let mut credentials = self.credentials.lock().await;
        credentials.insert(credential.username.clone(), credential);
        Ok(())
    }

    async fn rename(&self, old_username: &str, new_username: &str) -> Result<()> {
        let mut credentials = self.credentials.lock().await;
        if credentials.contains_key(new_username) {
            return Err(AppError::Conflict("username already taken".to_string()));
        }
        let mut credential = credentials.remove(old_username).ok_or(AppError::NotFound)?;
        credential.username = new_username.to_string();
        credentials.insert(new_username.to_string(), credential);
        Ok(())
    }

    async fn remove(&self, username: &str) -> Result<()> {
        let mut credentials = self.credentials.lock().await;
        credentials.remove(username);
        Ok(())
    }

    async fn is_empty(&self) -> Result<bool> {
        let credentials = self.credentials.lock().await;
        Ok(credentials.is_empty())
    }
}
