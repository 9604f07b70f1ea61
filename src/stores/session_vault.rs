use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::Result;

/// Vault key for the opaque session token.
pub const KEY_SESSION_TOKEN: &str = "session_token";
/// Vault key for the absolute expiry timestamp (RFC 3339).
pub const KEY_SESSION_EXPIRY: &str = "session_expiry";
/// Vault key for the serialized user snapshot (JSON).
pub const KEY_CURRENT_USER: &str = "current_user";
/// Vault key for the last activity timestamp (RFC 3339).
pub const KEY_LAST_ACTIVITY: &str = "last_activity";

/// Tab-scoped session persistence.
///
/// The vault survives reloads within one tab/process but dies with it;
/// it is never shared between concurrent instances. `set_items` writes
/// its whole batch atomically so a session is never half-persisted.
pub trait SessionVault: Send + Sync {
    /// Stores every pair in one atomic batch.
    fn set_items(&self, items: &[(&str, String)]) -> Result<()>;

    /// Reads a single value.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Removes everything.
    fn clear(&self) -> Result<()>;
}

/// An in-memory vault for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySessionVault {
    items: Mutex<HashMap<String, String>>,
}

impl InMemorySessionVault {
    /// Creates an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored keys. Test helper.
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the vault holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionVault for InMemorySessionVault {
    fn set_items(&self, items: &[(&str, String)]) -> Result<()> {
        let mut map = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in items {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let map = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn clear(&self) -> Result<()> {
        let mut map = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        map.clear();
        Ok(())
    }
}
