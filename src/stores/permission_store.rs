use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::permission::{Permission, PermissionSubject};

/// Storage for access grants.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Looks up a grant by id.
    async fn get(&self, id: Uuid) -> Result<Option<Permission>>;

    /// Returns every grant.
    async fn list(&self) -> Result<Vec<Permission>>;

    /// Returns the grants applying to a subject.
    async fn list_for_subject(&self, subject: PermissionSubject) -> Result<Vec<Permission>>;

    /// Inserts a new grant. Fails with `Conflict` on a duplicate id.
    async fn insert(&self, permission: Permission) -> Result<Permission>;

    /// Replaces an existing grant. Fails with `NotFound` when absent.
    async fn update(&self, permission: Permission) -> Result<Permission>;

    /// Removes a grant. Fails with `NotFound` when absent.
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Removes every grant held by a specific user subject and
    /// returns how many were dropped.
    async fn remove_for_user(&self, user_id: Uuid) -> Result<usize>;

    /// Counts stored grants.
    async fn count(&self) -> Result<usize>;
}

/// An in-memory permission store for tests and embedding.
#[derive(Clone, Default)]
pub struct InMemoryPermissionStore {
    permissions: Arc<Mutex<HashMap<Uuid, Permission>>>,
}

impl InMemoryPermissionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn get(&self, id: Uuid) -> Result<Option<Permission>> {
        let permissions = self.permissions.lock().await;
        Ok(permissions.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Permission>> {
        let permissions = self.permissions.lock().await;
        let mut all: Vec<Permission> = permissions.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn list_for_subject(&self, subject: PermissionSubject) -> Result<Vec<Permission>> {
        let permissions = self.permissions.lock().await;
        Ok(permissions
            .values()
            .filter(|p| p.subject == subject)
            .cloned()
            .collect())
    }

    async fn insert(&self, permission: Permission) -> Result<Permission> {
        let mut permissions = self.permissions.lock().await;
        if permissions.contains_key(&permission.id) {
            return Err(AppError::Conflict(format!(
                "duplicate permission id {}",
                permission.id
            )));
        }
        permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn update(&self, permission: Permission) -> Result<Permission> {
        let mut permissions = self.permissions.lock().await;
        if !permissions.contains_key(&permission.id) {
            return Err(AppError::NotFound);
        }
        permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let mut permissions = self.permissions.lock().await;
        permissions.remove(&id).map(|_| ()).ok_or(AppError::NotFound)
    }

    async fn remove_for_user(&self, user_id: Uuid) -> Result<usize> {
        let mut permissions = self.permissions.lock().await;
        let before = permissions.len();
        permissions.retain(|_, p| p.subject != PermissionSubject::User(user_id));
        Ok(before - permissions.len())
    }

    async fn count(&self) -> Result<usize> {
        let permissions = self.permissions.lock().await;
        Ok(permissions.len())
    }
}
