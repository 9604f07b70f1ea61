use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// An action a permission can allow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    Create,
    Read,
    Update,
    Delete,
}

impl PermissionAction {
    /// Every action, for building full-access grants.
    pub const ALL: [PermissionAction; 4] = [
        PermissionAction::Create,
        PermissionAction::Read,
        PermissionAction::Update,
        PermissionAction::Delete,
    ];
}

/// Who a permission applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSubject {
    /// A single account.
    User(Uuid),
    /// Every account holding the role.
    Role(Role),
}

/// Qualifiers narrowing a grant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionConditions {
    /// Restricts the grant to rows of the subject's own team.
    #[serde(default)]
    pub own_team_only: bool,
    /// Roles the grant may never touch, e.g. admins shielded from
    /// lower admins.
    #[serde(default)]
    pub exclude_roles: Vec<Role>,
}

/// A fine-grained access grant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// The unique identifier for the grant.
    pub id: Uuid,
    /// Who the grant applies to.
    pub subject: PermissionSubject,
    /// The resource the grant covers; `"*"` matches every resource.
    pub resource: String,
    /// The allowed actions.
    pub actions: Vec<PermissionAction>,
    /// Qualifiers narrowing the grant.
    pub conditions: PermissionConditions,
    /// The timestamp when the grant was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the grant was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Returns `true` when this grant covers `resource`/`action`.
    pub fn allows(&self, resource: &str, action: PermissionAction) -> bool {
        (self.resource == "*" || self.resource == resource) && self.actions.contains(&action)
    }
}

/// The fields needed to create a grant.
#[derive(Clone, Debug)]
pub struct NewPermission {
    pub subject: PermissionSubject,
    pub resource: String,
    pub actions: Vec<PermissionAction>,
    pub conditions: PermissionConditions,
}

/// A partial update to a grant. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct PermissionUpdate {
    pub resource: Option<String>,
    pub actions: Option<Vec<PermissionAction>>,
    pub conditions: Option<PermissionConditions>,
}
