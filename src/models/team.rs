use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sales team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// The unique identifier for the team.
    pub id: Uuid,
    /// The team's display name.
    pub name: String,
    /// A short description of the team.
    pub description: String,
    /// The timestamp when the team was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the team was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A partial update to a team. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}
