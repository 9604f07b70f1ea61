use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::permission::{
    NewPermission, Permission, PermissionAction, PermissionConditions, PermissionSubject,
    PermissionUpdate,
};
use crate::models::user::{Role, User};
use crate::stores::permission_store::PermissionStore;
use crate::stores::user_store::UserStore;

/// Fine-grained access grants on top of the role system.
///
/// A user's effective grants are the union of grants naming them
/// directly and the template grants of their role.
#[derive(Clone)]
pub struct PermissionService {
    permissions: Arc<dyn PermissionStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl PermissionService {
    /// Creates a permission service over the given stores.
    pub fn new(
        permissions: Arc<dyn PermissionStore>,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            permissions,
            users,
            clock,
        }
    }

    /// Records a new grant.
    pub async fn grant(&self, new: NewPermission) -> Result<Permission> {
        if new.resource.trim().is_empty() {
            return Err(AppError::Validation(
                "Permission resource must not be empty".to_string(),
            ));
        }
        if new.actions.is_empty() {
            return Err(AppError::Validation(
                "Permission must allow at least one action".to_string(),
            ));
        }

        let now = self.clock.now();
        let permission = Permission {
            id: Uuid::new_v4(),
            subject: new.subject,
            resource: new.resource,
            actions: new.actions,
            conditions: new.conditions,
            created_at: now,
            updated_at: now,
        };
        let permission = self.permissions.insert(permission).await?;

        tracing::info!(
            "➕ Permission granted on {} ({:?})",
            permission.resource,
            permission.subject
        );
        Ok(permission)
    }

    /// Applies a partial update to a grant.
    pub async fn update(&self, id: Uuid, update: PermissionUpdate) -> Result<Permission> {
        let mut permission = self.permissions.get(id).await?.ok_or(AppError::NotFound)?;

        if let Some(resource) = update.resource {
            if resource.trim().is_empty() {
                return Err(AppError::Validation(
                    "Permission resource must not be empty".to_string(),
                ));
            }
            permission.resource = resource;
        }
        if let Some(actions) = update.actions {
            if actions.is_empty() {
                return Err(AppError::Validation(
                    "Permission must allow at least one action".to_string(),
                ));
            }
            permission.actions = actions;
        }
        if let Some(conditions) = update.conditions {
            permission.conditions = conditions;
        }

        permission.updated_at = self.clock.now();
        self.permissions.update(permission).await
    }

    /// Removes a grant.
    pub async fn revoke(&self, id: Uuid) -> Result<()> {
        self.permissions.remove(id).await?;
        tracing::info!("🗑️ Permission revoked: {}", id);
        Ok(())
    }

    /// Removes every grant naming a user directly. Called when the
    /// account goes away.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize> {
        let dropped = self.permissions.remove_for_user(user_id).await?;
        if dropped > 0 {
            tracing::info!("🗑️ Revoked {} permissions for deleted user", dropped);
        }
        Ok(dropped)
    }

    /// Every grant.
    pub async fn list(&self) -> Result<Vec<Permission>> {
        self.permissions.list().await
    }

    /// A user's effective grants: direct plus role template.
    pub async fn permissions_for(&self, user: &User) -> Result<Vec<Permission>> {
        let mut grants = self
            .permissions
            .list_for_subject(PermissionSubject::User(user.id))
            .await?;
        grants.extend(
            self.permissions
                .list_for_subject(PermissionSubject::Role(user.role))
                .await?,
        );
        Ok(grants)
    }

    /// Whether a user may perform `action` on `resource`.
    ///
    /// Unknown users simply have no permissions.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The acting user.
    /// * `resource` - The resource name, e.g. `"telemarketers"`.
    /// * `action` - The attempted action.
    ///
    /// # Returns
    ///
    /// A `Result` containing `true` when some grant covers the action.
    pub async fn has_permission(
        &self,
        user_id: Uuid,
        resource: &str,
        action: PermissionAction,
    ) -> Result<bool> {
        let Some(user) = self.users.get_by_id(user_id).await? else {
            return Ok(false);
        };

        let grants = self.permissions_for(&user).await?;
        Ok(grants.iter().any(|p| p.allows(resource, action)))
    }

    /// Seeds the role-template grants into an empty store.
    ///
    /// # Returns
    ///
    /// How many templates were created.
    pub async fn seed_default_templates(&self) -> Result<usize> {
        if self.permissions.count().await? > 0 {
            return Ok(0);
        }

        let templates = [
            NewPermission {
                subject: PermissionSubject::Role(Role::SuperAdmin),
                resource: "*".to_string(),
                actions: PermissionAction::ALL.to_vec(),
                conditions: PermissionConditions::default(),
            },
            NewPermission {
                subject: PermissionSubject::Role(Role::Admin),
                resource: "users".to_string(),
                actions: PermissionAction::ALL.to_vec(),
                conditions: PermissionConditions {
                    own_team_only: false,
                    exclude_roles: vec![Role::SuperAdmin],
                },
            },
            NewPermission {
                subject: PermissionSubject::Role(Role::Manager),
                resource: "telemarketers".to_string(),
                actions: PermissionAction::ALL.to_vec(),
                conditions: PermissionConditions {
                    own_team_only: true,
                    exclude_roles: Vec::new(),
                },
            },
            NewPermission {
                subject: PermissionSubject::Role(Role::Agent),
                resource: "telemarketers".to_string(),
                actions: vec![PermissionAction::Read],
                conditions: PermissionConditions {
                    own_team_only: true,
                    exclude_roles: Vec::new(),
                },
            },
        ];

        let count = templates.len();
        for template in templates {
            self.grant(template).await?;
        }

        tracing::info!("✅ Seeded {} permission templates", count);
        Ok(count)
    }

    /// Whether the backing store answers at all.
    pub async fn check_connection(&self) -> bool {
        match self.permissions.count().await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("❌ Permission store unreachable: {}", e);
                false
            }
        }
    }
}
