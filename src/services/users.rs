use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::bootstrap::{self, BootstrapAccount};
use crate::clock::Clock;
use crate::crypto::password::CredentialHasher;
use crate::error::{AppError, Result};
use crate::models::credential::Credential;
use crate::models::user::{NewUser, Role, User, UserUpdate};
use crate::redact;
use crate::stores::credential_store::CredentialStore;
use crate::stores::user_store::UserStore;
use crate::validation::auth::{validate_password, validate_username};

/// Headline counts over the visible directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub total: usize,
    pub active: usize,
    pub managers: usize,
    pub agents: usize,
    /// Admins and super admins together.
    pub admins: usize,
}

/// Whether `actor` may hand out `target` as a role.
///
/// Only super admins may mint other super admins.
pub fn can_assign_role(actor: Role, target: Role) -> bool {
    target != Role::SuperAdmin || actor == Role::SuperAdmin
}

/// Account directory management: CRUD plus the credential lifecycle
/// that goes with it.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialStore>,
    hasher: Arc<dyn CredentialHasher>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Creates a user service over the given stores.
    pub fn new(
        users: Arc<dyn UserStore>,
        credentials: Arc<dyn CredentialStore>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            credentials,
            hasher,
            clock,
        }
    }

    /// Creates a user and its hashed credential.
    ///
    /// # Arguments
    ///
    /// * `new` - The account fields, including the initial password.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `User`.
    pub async fn create_user(&self, new: NewUser) -> Result<User> {
        validate_username(&new.username)?;
        validate_password(&new.password)?;

        if new.role == Role::Agent && new.team_id.is_none() {
            return Err(AppError::Validation(
                "Agents must be assigned to a team".to_string(),
            ));
        }

        if self.users.get_by_username(&new.username).await?.is_some() {
            return Err(AppError::Conflict("username already taken".to_string()));
        }

        let now = self.clock.now();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username.clone(),
            name: new.name,
            email: new.email,
            role: new.role,
            team_id: new.team_id,
            is_active: true,
            is_hidden: new.is_hidden,
            created_at: now,
            updated_at: now,
        };
        let user = self.users.insert(user).await?;

        let hash = self.hasher.hash(&new.password)?;
        self.credentials
            .upsert(Credential::hashed(&user.username, hash, now))
            .await?;

        tracing::info!(
            "➕ User created: {} (role: {})",
            redact::mask_value(&user.username),
            user.role
        );
        Ok(user)
    }

    /// Applies a partial update to a user.
    ///
    /// A username change moves the stored credential to the new name
    /// so the password survives the rename; a password change rotates
    /// the credential in place.
    pub async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User> {
        let mut user = self.users.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        let previous_username = user.username.clone();

        if let Some(username) = update.username {
            if username != user.username {
                validate_username(&username)?;
                if self.users.get_by_username(&username).await?.is_some() {
                    return Err(AppError::Conflict("username already taken".to_string()));
                }
                user.username = username;
            }
        }
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(team_id) = update.team_id {
            user.team_id = team_id;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(is_hidden) = update.is_hidden {
            user.is_hidden = is_hidden;
        }

        if user.role == Role::Agent && user.team_id.is_none() {
            return Err(AppError::Validation(
                "Agents must be assigned to a team".to_string(),
            ));
        }

        user.updated_at = self.clock.now();
        let user = self.users.update(user).await?;

        if user.username != previous_username {
            match self
                .credentials
                .rename(&previous_username, &user.username)
                .await
            {
                Ok(()) => tracing::info!(
                    "🔑 Credential moved to renamed account {}",
                    redact::mask_value(&user.username)
                ),
                // Nothing stored under the old name; nothing to move.
                Err(AppError::NotFound) => {}
                Err(e) => return Err(e),
            }
        }

        if let Some(password) = update.password {
            validate_password(&password)?;
            let hash = self.hasher.hash(&password)?;
            self.credentials
                .upsert(Credential::hashed(&user.username, hash, self.clock.now()))
                .await?;
            tracing::info!(
                "🔑 Password rotated for {}",
                redact::mask_value(&user.username)
            );
        }

        Ok(user)
    }

    /// Deletes a user and its credential.
    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        let user = self.users.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        self.users.remove(id).await?;
        self.credentials.remove(&user.username).await?;

        tracing::info!("🗑️ User deleted: {}", redact::mask_value(&user.username));
        Ok(())
    }

    /// Looks up a user by id.
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.users.get_by_id(id).await
    }

    /// Looks up a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.users.get_by_username(username).await
    }

    /// Every user, hidden ones included. Super admin view.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.users.list().await
    }

    /// The directory as regular admins see it: hidden accounts omitted.
    pub async fn visible_users(&self) -> Result<Vec<User>> {
        let users = self.users.list().await?;
        Ok(users.into_iter().filter(|u| !u.is_hidden).collect())
    }

    /// Active managers, for team assignment pickers and demo seeding.
    pub async fn active_managers(&self) -> Result<Vec<User>> {
        let users = self.users.list().await?;
        Ok(users
            .into_iter()
            .filter(|u| u.role == Role::Manager && u.is_active)
            .collect())
    }

    /// Headline counts over the visible directory.
    pub async fn directory_stats(&self) -> Result<DirectoryStats> {
        let users = self.visible_users().await?;
        Ok(DirectoryStats {
            total: users.len(),
            active: users.iter().filter(|u| u.is_active).count(),
            managers: users.iter().filter(|u| u.role == Role::Manager).count(),
            agents: users.iter().filter(|u| u.role == Role::Agent).count(),
            admins: users
                .iter()
                .filter(|u| matches!(u.role, Role::Admin | Role::SuperAdmin))
                .count(),
        })
    }

    /// Seeds the built-in accounts into an empty directory.
    ///
    /// Does nothing when any user already exists.
    ///
    /// # Returns
    ///
    /// How many accounts were created.
    pub async fn seed_default_accounts(&self) -> Result<usize> {
        if self.users.count().await? > 0 {
            return Ok(0);
        }

        let mut ids_by_username: HashMap<&'static str, Uuid> = HashMap::new();
        let mut created = 0;
        for account in &bootstrap::BOOTSTRAP_ACCOUNTS {
            let team_id = account
                .manager_username
                .and_then(|manager| ids_by_username.get(manager).copied());
            let user = self.insert_builtin(account, team_id).await?;
            ids_by_username.insert(account.username, user.id);
            created += 1;
        }

        tracing::info!("✅ Seeded {} default accounts", created);
        Ok(created)
    }

    /// Recreates the hidden admin accounts when they have gone missing.
    ///
    /// # Returns
    ///
    /// How many accounts were recreated.
    pub async fn ensure_admin_accounts(&self) -> Result<usize> {
        let mut created = 0;
        for account in bootstrap::BOOTSTRAP_ACCOUNTS.iter().filter(|a| a.hidden) {
            if self.users.get_by_username(account.username).await?.is_none() {
                self.insert_builtin(account, None).await?;
                created += 1;
            }
        }

        if created > 0 {
            tracing::info!("✅ Recreated {} admin accounts", created);
        }
        Ok(created)
    }

    /// Inserts a built-in account verbatim, hashing its fixed password.
    /// Skips the password policy: the built-in passwords predate it.
    async fn insert_builtin(
        &self,
        account: &BootstrapAccount,
        team_id: Option<Uuid>,
    ) -> Result<User> {
        let now = self.clock.now();
        let user = User {
            id: Uuid::new_v4(),
            username: account.username.to_string(),
            name: account.name.to_string(),
            email: Some(account.email.to_string()),
            role: account.role,
            team_id,
            is_active: true,
            is_hidden: account.hidden,
            created_at: now,
            updated_at: now,
        };
        let user = self.users.insert(user).await?;

        let hash = self.hasher.hash(account.password)?;
        self.credentials
            .upsert(Credential::hashed(&user.username, hash, now))
            .await?;
        Ok(user)
    }

    /// Whether the backing store answers at all.
    pub async fn check_connection(&self) -> bool {
        match self.users.count().await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("❌ User store unreachable: {}", e);
                false
            }
        }
    }
}
