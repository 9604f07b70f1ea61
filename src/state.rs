use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::crypto::password::{Argon2Hasher, CredentialHasher};
use crate::error::Result;
use crate::services::auth::SessionManager;
use crate::services::permissions::PermissionService;
use crate::services::teams::TeamService;
use crate::services::telemarketers::TelemarketerService;
use crate::services::users::UserService;
use crate::stores::credential_store::{CredentialStore, InMemoryCredentialStore};
use crate::stores::permission_store::{InMemoryPermissionStore, PermissionStore};
use crate::stores::session_vault::{InMemorySessionVault, SessionVault};
use crate::stores::team_store::{InMemoryTeamStore, TeamStore};
use crate::stores::telemarketer_store::{InMemoryTelemarketerStore, TelemarketerStore};
use crate::stores::user_store::{InMemoryUserStore, UserStore};

/// The application's state: stores and the services wired over them.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The user account store.
    pub users: Arc<dyn UserStore>,
    /// The credential store.
    pub credentials: Arc<dyn CredentialStore>,
    /// The team store.
    pub teams: Arc<dyn TeamStore>,
    /// The telemarketer store.
    pub telemarketers: Arc<dyn TelemarketerStore>,
    /// The permission store.
    pub permissions: Arc<dyn PermissionStore>,
    /// The tab-scoped session vault.
    pub vault: Arc<dyn SessionVault>,
    /// The session manager.
    pub session_manager: SessionManager,
    /// The user directory service.
    pub user_service: UserService,
    /// The team service.
    pub team_service: TeamService,
    /// The telemarketer service.
    pub telemarketer_service: TelemarketerService,
    /// The permission service.
    pub permission_service: PermissionService,
}

impl AppState {
    /// Creates a fully in-memory `AppState`: Argon2 hashing, the system
    /// clock, and empty stores.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    pub fn in_memory(config: Config) -> Self {
        Self::with_components(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryTeamStore::new()),
            Arc::new(InMemoryTelemarketerStore::new()),
            Arc::new(InMemoryPermissionStore::new()),
            Arc::new(InMemorySessionVault::new()),
            Arc::new(Argon2Hasher),
            Arc::new(SystemClock),
        )
    }

    /// Creates an `AppState` over caller-provided components. Tests use
    /// this to inject manual clocks, cheap hashers, and failing stores.
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        config: Config,
        users: Arc<dyn UserStore>,
        credentials: Arc<dyn CredentialStore>,
        teams: Arc<dyn TeamStore>,
        telemarketers: Arc<dyn TelemarketerStore>,
        permissions: Arc<dyn PermissionStore>,
        vault: Arc<dyn SessionVault>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session_manager = SessionManager::new(
            users.clone(),
            credentials.clone(),
            hasher.clone(),
            vault.clone(),
            clock.clone(),
            config.session_policy(),
        );
        let user_service = UserService::new(
            users.clone(),
            credentials.clone(),
            hasher.clone(),
            clock.clone(),
        );
        let team_service = TeamService::new(teams.clone(), clock.clone());
        let telemarketer_service = TelemarketerService::new(telemarketers.clone(), clock.clone());
        let permission_service =
            PermissionService::new(permissions.clone(), users.clone(), clock.clone());

        AppState {
            config,
            users,
            credentials,
            teams,
            telemarketers,
            permissions,
            vault,
            session_manager,
            user_service,
            team_service,
            telemarketer_service,
            permission_service,
        }
    }

    /// First-run initialization: seeds the built-in accounts, default
    /// teams and permission templates into empty stores, and recreates
    /// the hidden admin accounts when they have gone missing.
    ///
    /// # Returns
    ///
    /// A `Result<()>`.
    pub async fn initialize(&self) -> Result<()> {
        let accounts = self.user_service.seed_default_accounts().await?;
        let teams = self.team_service.seed_default_teams().await?;
        let templates = self.permission_service.seed_default_templates().await?;
        self.user_service.ensure_admin_accounts().await?;

        tracing::info!(
            "🚀 Platform ready ({} accounts, {} teams, {} templates seeded)",
            accounts,
            teams,
            templates
        );
        Ok(())
    }
}
