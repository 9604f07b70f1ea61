use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::team::{Team, TeamUpdate};
use crate::stores::team_store::TeamStore;

/// The teams a fresh deployment starts with.
const DEFAULT_TEAMS: [(&str, &str); 3] = [
    ("Équipe Alpha", "Équipe de télévendeurs expérimentés"),
    ("Équipe Beta", "Équipe de nouveaux télévendeurs"),
    ("Équipe Gamma", "Équipe spécialisée produits premium"),
];

/// Team directory management.
#[derive(Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamStore>,
    clock: Arc<dyn Clock>,
}

impl TeamService {
    /// Creates a team service over the given store.
    pub fn new(teams: Arc<dyn TeamStore>, clock: Arc<dyn Clock>) -> Self {
        Self { teams, clock }
    }

    /// Creates a team.
    pub async fn create_team(&self, name: &str, description: &str) -> Result<Team> {
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "Team name must not be empty".to_string(),
            ));
        }

        let now = self.clock.now();
        let team = Team {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };
        let team = self.teams.insert(team).await?;

        tracing::info!("➕ Team created: {}", team.name);
        Ok(team)
    }

    /// Applies a partial update to a team.
    pub async fn update_team(&self, id: Uuid, update: TeamUpdate) -> Result<Team> {
        let mut team = self.teams.get(id).await?.ok_or(AppError::NotFound)?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation(
                    "Team name must not be empty".to_string(),
                ));
            }
            team.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            team.description = description;
        }

        team.updated_at = self.clock.now();
        self.teams.update(team).await
    }

    /// Deletes a team.
    pub async fn delete_team(&self, id: Uuid) -> Result<()> {
        self.teams.remove(id).await?;
        tracing::info!("🗑️ Team deleted: {}", id);
        Ok(())
    }

    /// Looks up a team by id.
    pub async fn get_team(&self, id: Uuid) -> Result<Option<Team>> {
        self.teams.get(id).await
    }

    /// Every team, ordered by name.
    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        self.teams.list().await
    }

    /// Seeds the default teams into an empty store.
    ///
    /// # Returns
    ///
    /// How many teams were created.
    pub async fn seed_default_teams(&self) -> Result<usize> {
        if self.teams.count().await? > 0 {
            return Ok(0);
        }

        for (name, description) in DEFAULT_TEAMS {
            self.create_team(name, description).await?;
        }

        tracing::info!("✅ Seeded {} default teams", DEFAULT_TEAMS.len());
        Ok(DEFAULT_TEAMS.len())
    }

    /// Whether the backing store answers at all.
    pub async fn check_connection(&self) -> bool {
        match self.teams.count().await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("❌ Team store unreachable: {}", e);
                false
            }
        }
    }
}
