use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::team::Team;

/// Storage for teams.
#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Looks up a team by id.
    async fn get(&self, id: Uuid) -> Result<Option<Team>>;

    /// Returns every team.
    async fn list(&self) -> Result<Vec<Team>>;

    /// Inserts a new team. Fails with `Conflict` on a duplicate id.
    async fn insert(&self, team: Team) -> Result<Team>;

    /// Replaces an existing team. Fails with `NotFound` when absent.
    async fn update(&self, team: Team) -> Result<Team>;

    /// Removes a team. Fails with `NotFound` when absent.
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Counts stored teams.
    async fn count(&self) -> Result<usize>;
}

/// An in-memory team store for tests and embedding.
#[derive(Clone, Default)]
pub struct InMemoryTeamStore {
    teams: Arc<Mutex<HashMap<Uuid, Team>>>,
}

impl InMemoryTeamStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamStore for InMemoryTeamStore {
    async fn get(&self, id: Uuid) -> Result<Option<Team>> {
        let teams = self.teams.lock().await;
        Ok(teams.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Team>> {
        let teams = self.teams.lock().await;
        let mut all: Vec<Team> = teams.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn insert(&self, team: Team) -> Result<Team> {
        let mut teams = self.teams.lock().await;
        if teams.contains_key(&team.id) {
            return Err(AppError::Conflict(format!("duplicate team id {}", team.id)));
        }
        teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn update(&self, team: Team) -> Result<Team> {
        let mut teams = self.teams.lock().await;
        if !teams.contains_key(&team.id) {
            return Err(AppError::NotFound);
        }
        teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let mut teams = self.teams.lock().await;
        teams.remove(&id).map(|_| ()).ok_or(AppError::NotFound)
    }

    async fn count(&self) -> Result<usize> {
        let teams = self.teams.lock().await;
        Ok(teams.len())
    }
}
