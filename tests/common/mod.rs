//! Shared wiring for the integration suites: a fully in-memory platform
//! with a manual clock, a cheap deterministic hasher, an instrumented
//! vault, and failure-injecting store doubles.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use uuid::Uuid;

use teleperf::clock::{Clock, ManualClock};
use teleperf::config::{Config, SessionPolicy};
use teleperf::crypto::password::CredentialHasher;
use teleperf::error::{AppError, Result};
use teleperf::models::credential::Credential;
use teleperf::models::user::{Role, User};
use teleperf::services::auth::SessionManager;
use teleperf::state::AppState;
use teleperf::stores::credential_store::{CredentialStore, InMemoryCredentialStore};
use teleperf::stores::permission_store::InMemoryPermissionStore;
use teleperf::stores::session_vault::{InMemorySessionVault, SessionVault};
use teleperf::stores::team_store::InMemoryTeamStore;
use teleperf::stores::telemarketer_store::InMemoryTelemarketerStore;
use teleperf::stores::user_store::{InMemoryUserStore, UserStore};

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
});

/// Installs the test tracing subscriber once per binary.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// A hasher that tags instead of hashing. Keeps the suites fast and the
/// stored secrets recognizable in assertions.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("t${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(hash == format!("t${password}"))
    }
}

/// A vault that counts its batched writes.
#[derive(Default)]
pub struct CountingVault {
    inner: InMemorySessionVault,
    writes: AtomicUsize,
}

impl CountingVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many `set_items` batches have landed.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// How many keys the vault currently holds.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl SessionVault for CountingVault {
    fn set_items(&self, items: &[(&str, String)]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_items(items)
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_item(key)
    }

    fn clear(&self) -> Result<()> {
        self.inner.clear()
    }
}

/// A user store that is always down.
pub struct UnreachableUserStore;

#[async_trait]
impl UserStore for UnreachableUserStore {
    async fn get_by_username(&self, _username: &str) -> Result<Option<User>> {
        Err(AppError::Storage("user store offline".to_string()))
    }

    async fn get_by_id(&self, _id: Uuid) -> Result<Option<User>> {
        Err(AppError::Storage("user store offline".to_string()))
    }

    async fn list(&self) -> Result<Vec<User>> {
        Err(AppError::Storage("user store offline".to_string()))
    }

    async fn insert(&self, _user: User) -> Result<User> {
        Err(AppError::Storage("user store offline".to_string()))
    }

    async fn update(&self, _user: User) -> Result<User> {
        Err(AppError::Storage("user store offline".to_string()))
    }

    async fn remove(&self, _id: Uuid) -> Result<()> {
        Err(AppError::Storage("user store offline".to_string()))
    }

    async fn count(&self) -> Result<usize> {
        Err(AppError::Storage("user store offline".to_string()))
    }
}

/// A credential store whose reads work but whose writes all fail.
pub struct ReadOnlyCredentialStore {
    inner: InMemoryCredentialStore,
}

impl ReadOnlyCredentialStore {
    pub fn new(inner: InMemoryCredentialStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CredentialStore for ReadOnlyCredentialStore {
    async fn get(&self, username: &str) -> Result<Option<Credential>> {
        self.inner.get(username).await
    }

    async fn upsert(&self, _credential: Credential) -> Result<()> {
        Err(AppError::Storage("credential store is read-only".to_string()))
    }

    async fn rename(&self, _old_username: &str, _new_username: &str) -> Result<()> {
        Err(AppError::Storage("credential store is read-only".to_string()))
    }

    async fn remove(&self, _username: &str) -> Result<()> {
        Err(AppError::Storage("credential store is read-only".to_string()))
    }

    async fn is_empty(&self) -> Result<bool> {
        self.inner.is_empty().await
    }
}

/// An in-memory platform with a manual clock and instrumented vault.
pub struct TestPlatform {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub vault: Arc<CountingVault>,
    pub hasher: Arc<PlainHasher>,
}

impl TestPlatform {
    /// A second session manager over the same stores and vault, as a
    /// fresh process would build after a reload.
    pub fn fresh_session_manager(&self) -> SessionManager {
        SessionManager::new(
            self.state.users.clone(),
            self.state.credentials.clone(),
            self.hasher.clone(),
            self.vault.clone(),
            self.clock.clone(),
            self.state.config.session_policy(),
        )
    }
}

/// Builds the default manual-clock platform.
pub fn manual_platform() -> TestPlatform {
    platform_with_stores(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryCredentialStore::new()),
    )
}

/// Builds a manual-clock platform over caller-provided auth stores.
pub fn platform_with_stores(
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialStore>,
) -> TestPlatform {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let vault = Arc::new(CountingVault::new());
    let hasher = Arc::new(PlainHasher);

    let state = AppState::with_components(
        Config::default(),
        users,
        credentials,
        Arc::new(InMemoryTeamStore::new()),
        Arc::new(InMemoryTelemarketerStore::new()),
        Arc::new(InMemoryPermissionStore::new()),
        vault.clone(),
        hasher.clone(),
        clock.clone(),
    );

    TestPlatform {
        state,
        clock,
        vault,
        hasher,
    }
}

/// A bare user record for store-level setups.
pub fn test_user(username: &str, role: Role, team_id: Option<Uuid>) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        name: username.to_uppercase(),
        email: None,
        role,
        team_id,
        is_active: true,
        is_hidden: false,
        created_at: now,
        updated_at: now,
    }
}

/// A session manager over its own stores with one registered user,
/// for policy-focused tests.
pub async fn session_manager_with_user(
    policy: SessionPolicy,
    clock: Arc<dyn Clock>,
    username: &str,
    password: &str,
) -> SessionManager {
    let users = Arc::new(InMemoryUserStore::new());
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let hasher = Arc::new(PlainHasher);

    users
        .insert(test_user(username, Role::Manager, None))
        .await
        .expect("insert test user");
    credentials
        .upsert(Credential::hashed(
            username,
            hasher.hash(password).expect("hash test password"),
            Utc::now(),
        ))
        .await
        .expect("insert test credential");

    SessionManager::new(
        users,
        credentials,
        hasher,
        Arc::new(InMemorySessionVault::new()),
        clock,
        policy,
    )
}
