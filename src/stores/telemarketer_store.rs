use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::telemarketer::Telemarketer;

/// Storage for telemarketer performance records.
#[async_trait]
pub trait TelemarketerStore: Send + Sync {
    /// Looks up a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<Telemarketer>>;

    /// Returns every record, newest performance month first.
    async fn list(&self) -> Result<Vec<Telemarketer>>;

    /// Inserts a new record. Fails with `Conflict` on a duplicate id.
    async fn insert(&self, telemarketer: Telemarketer) -> Result<Telemarketer>;

    /// Replaces an existing record. Fails with `NotFound` when absent.
    async fn update(&self, telemarketer: Telemarketer) -> Result<Telemarketer>;

    /// Removes a record. Fails with `NotFound` when absent.
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Removes every record.
    async fn clear(&self) -> Result<()>;

    /// Counts stored records.
    async fn count(&self) -> Result<usize>;
}

/// An in-memory telemarketer store for tests and embedding.
#[derive(Clone, Default)]
pub struct InMemoryTelemarketerStore {
    telemarketers: Arc<Mutex<HashMap<Uuid, Telemarketer>>>,
}

impl InMemoryTelemarketerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TelemarketerStore for InMemoryTelemarketerStore {
    async fn get(&self, id: Uuid) -> Result<Option<Telemarketer>> {
        let telemarketers = self.telemarketers.lock().await;
        Ok(telemarketers.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Telemarketer>> {
        let telemarketers = self.telemarketers.lock().await;
        let mut all: Vec<Telemarketer> = telemarketers.values().cloned().collect();
        // YYYY-MM strings sort chronologically; newest month first,
        // names tie-broken ascending for stable output.
        all.sort_by(|a, b| {
            b.performance_month
                .cmp(&a.performance_month)
                .then(a.name.cmp(&b.name))
        });
        Ok(all)
    }

    async fn insert(&self, telemarketer: Telemarketer) -> Result<Telemarketer> {
        let mut telemarketers = self.telemarketers.lock().await;
        if telemarketers.contains_key(&telemarketer.id) {
            return Err(AppError::Conflict(format!(
                "duplicate telemarketer id {}",
                telemarketer.id
            )));
        }
        telemarketers.insert(telemarketer.id, telemarketer.clone());
        Ok(telemarketer)
    }

    async fn update(&self, telemarketer: Telemarketer) -> Result<Telemarketer> {
        let mut telemarketers = self.telemarketers.lock().await;
        if !telemarketers.contains_key(&telemarketer.id) {
            return Err(AppError::NotFound);
        }
        telemarketers.insert(telemarketer.id, telemarketer.clone());
        Ok(telemarketer)
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let mut telemarketers = self.telemarketers.lock().await;
        telemarketers.remove(&id).map(|_| ()).ok_or(AppError::NotFound)
    }

    async fn clear(&self) -> Result<()> {
        let mut telemarketers = self.telemarketers.lock().await;
        telemarketers.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let telemarketers = self.telemarketers.lock().await;
        Ok(telemarketers.len())
    }
}
