use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The roles an account can hold, from narrowest to widest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Reads the performance of their own team only.
    Agent,
    /// Runs a team of telemarketers.
    Manager,
    /// Administers accounts below super admin level.
    Admin,
    /// Full control, including other admin accounts.
    SuperAdmin,
}

impl Role {
    /// The wire/storage name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a user in the system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's username.
    pub username: String,
    /// The user's full name.
    pub name: String,
    /// The user's email address.
    pub email: Option<String>,
    /// The user's role.
    pub role: Role,
    /// The team the user belongs to, keyed by the managing user's id.
    /// Required for agents, absent for managers and admins.
    pub team_id: Option<Uuid>,
    /// Whether the user is active.
    pub is_active: bool,
    /// Whether the user is hidden from regular directory listings.
    pub is_hidden: bool,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The fields needed to create a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub password: String,
    pub role: Role,
    pub team_id: Option<Uuid>,
    pub is_hidden: bool,
}

/// A partial update to an existing user. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub role: Option<Role>,
    pub team_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
    pub is_hidden: Option<bool>,
    pub password: Option<String>,
}

/// The UI-facing capability flags derived from a role.
///
/// These are recomputed from the live role on every read; they are never
/// stored, so a role change takes effect on the next evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub is_agent: bool,
    pub is_manager: bool,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub can_manage_users: bool,
    pub can_manage_teams: bool,
}

impl Capabilities {
    /// Derives the capability flags for `role`.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Agent => Self {
                is_agent: true,
                ..Self::default()
            },
            Role::Manager => Self {
                is_manager: true,
                can_manage_users: true,
                ..Self::default()
            },
            Role::Admin => Self {
                is_admin: true,
                can_manage_users: true,
                can_manage_teams: true,
                ..Self::default()
            },
            Role::SuperAdmin => Self {
                is_super_admin: true,
                can_manage_users: true,
                can_manage_teams: true,
                ..Self::default()
            },
        }
    }
}
