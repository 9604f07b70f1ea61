use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

use crate::bootstrap;
use crate::clock::Clock;
use crate::config::SessionPolicy;
use crate::crypto::password::CredentialHasher;
use crate::crypto::token;
use crate::error::{AppError, Result};
use crate::models::credential::{Credential, SecretFormat};
use crate::models::session::SessionRecord;
use crate::models::user::{Capabilities, User};
use crate::redact;
use crate::stores::credential_store::CredentialStore;
use crate::stores::session_vault::{self, SessionVault};
use crate::stores::user_store::UserStore;

/// Why a live session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user asked to leave.
    LoggedOut,
    /// The absolute session lifetime ran out.
    Expired,
    /// No activity was seen for the whole inactivity window.
    IdleTimeout,
}

/// The in-memory state of a live session.
struct ActiveSession {
    token: String,
    user: User,
    expires_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    /// The activity timestamp last written to the vault, used to
    /// coalesce bursts into at most one write per flush interval.
    last_persisted_activity: DateTime<Utc>,
}

struct SessionInner {
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialStore>,
    hasher: Arc<dyn CredentialHasher>,
    vault: Arc<dyn SessionVault>,
    clock: Arc<dyn Clock>,
    policy: SessionPolicy,
    /// The live session, if any. Held only for short synchronous
    /// sections, never across an await.
    current: Mutex<Option<ActiveSession>>,
    /// The deadline watchdog for the live session.
    watchdog: Mutex<Option<AbortHandle>>,
    events: broadcast::Sender<SessionEvent>,
}

/// Owns the authenticated-identity lifecycle: credential checks, token
/// issuance, persistence, deadline enforcement, and capability flags.
///
/// Cloning is cheap; every clone shares the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// Creates a session manager over the given collaborators.
    ///
    /// # Arguments
    ///
    /// * `users` - The user account store.
    /// * `credentials` - The credential store.
    /// * `hasher` - The password hasher.
    /// * `vault` - The tab-scoped session vault.
    /// * `clock` - The time source deadlines are checked against.
    /// * `policy` - The session lifetime rules.
    pub fn new(
        users: Arc<dyn UserStore>,
        credentials: Arc<dyn CredentialStore>,
        hasher: Arc<dyn CredentialHasher>,
        vault: Arc<dyn SessionVault>,
        clock: Arc<dyn Clock>,
        policy: SessionPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(SessionInner {
                users,
                credentials,
                hasher,
                vault,
                clock,
                policy,
                current: Mutex::new(None),
                watchdog: Mutex::new(None),
                events,
            }),
        }
    }

    /// Authenticates a user and opens a session.
    ///
    /// Always answers with a plain `true` or `false`: unknown usernames,
    /// wrong passwords, disabled accounts and storage outages are
    /// deliberately indistinguishable to the caller.
    ///
    /// # Arguments
    ///
    /// * `username` - The claimed username.
    /// * `password` - The claimed password.
    ///
    /// # Returns
    ///
    /// `true` when a session was opened.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        if username.trim().is_empty() || password.trim().is_empty() {
            tracing::warn!("❌ Login rejected: blank username or password");
            return false;
        }

        match self.try_login(username, password).await {
            Ok(opened) => opened,
            Err(e) => {
                tracing::error!(
                    "❌ Login failed for {}: {}",
                    redact::mask_value(username),
                    redact::scrub(&e.to_string())
                );
                false
            }
        }
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<bool> {
        tracing::debug!("🔐 Authenticating {}", redact::mask_value(username));

        let user = match self.inner.users.get_by_username(username).await? {
            Some(user) => user,
            None => {
                tracing::warn!("❌ Login failed for {}", redact::mask_value(username));
                return Ok(false);
            }
        };

        if !user.is_active {
            tracing::warn!(
                "❌ Login rejected for {}: account disabled",
                redact::mask_value(username)
            );
            return Ok(false);
        }

        let verified = match self.inner.credentials.get(username).await? {
            Some(credential) => self.check_credential(username, password, &credential).await?,
            None => self.check_bootstrap(username, password).await?,
        };

        if !verified {
            tracing::warn!("❌ Login failed for {}", redact::mask_value(username));
            return Ok(false);
        }

        self.open_session(user)?;
        Ok(true)
    }

    /// Checks a password against a stored credential, upgrading legacy
    /// plaintext records to Argon2 in place on success. The upgrade is
    /// written before the session opens; when the write fails, the
    /// whole login fails.
    async fn check_credential(
        &self,
        username: &str,
        password: &str,
        credential: &Credential,
    ) -> Result<bool> {
        match credential.format {
            SecretFormat::Hashed => self.inner.hasher.verify(password, &credential.secret),
            SecretFormat::Plain => {
                let matches: bool = password
                    .as_bytes()
                    .ct_eq(credential.secret.as_bytes())
                    .into();
                if !matches {
                    return Ok(false);
                }

                let hash = self.inner.hasher.hash(password)?;
                self.inner
                    .credentials
                    .upsert(Credential {
                        username: username.to_string(),
                        secret: hash,
                        format: SecretFormat::Hashed,
                        created_at: credential.created_at,
                        updated_at: self.inner.clock.now(),
                    })
                    .await?;
                tracing::info!(
                    "🔑 Upgraded legacy credential for {}",
                    redact::mask_value(username)
                );
                Ok(true)
            }
        }
    }

    /// Falls back to the built-in bootstrap table, but only while the
    /// credential store is completely empty. A storage error while
    /// answering that question keeps the gate shut.
    async fn check_bootstrap(&self, username: &str, password: &str) -> Result<bool> {
        if !self.inner.credentials.is_empty().await? {
            return Ok(false);
        }

        let Some(account) = bootstrap::verify_account(username, password) else {
            return Ok(false);
        };

        tracing::warn!(
            "⚠️ Bootstrap credential accepted for {} (credential store empty)",
            redact::mask_value(account.username)
        );

        // Writing the hashed credential closes the bootstrap window.
        let hash = self.inner.hasher.hash(password)?;
        self.inner
            .credentials
            .upsert(Credential::hashed(username, hash, self.inner.clock.now()))
            .await?;
        Ok(true)
    }

    /// Opens a session for an authenticated user: fresh token, absolute
    /// expiry, atomic vault write, then the deadline watchdog.
    fn open_session(&self, user: User) -> Result<()> {
        let now = self.inner.clock.now();
        let token = token::generate_session_token()?;
        let expires_at = now + self.inner.policy.absolute_lifetime;
        let user_json = sonic_rs::to_string(&user)?;

        // Persist before anything else observes the session.
        self.inner.vault.set_items(&[
            (session_vault::KEY_SESSION_TOKEN, token.clone()),
            (session_vault::KEY_SESSION_EXPIRY, expires_at.to_rfc3339()),
            (session_vault::KEY_CURRENT_USER, user_json),
            (session_vault::KEY_LAST_ACTIVITY, now.to_rfc3339()),
        ])?;

        {
            let mut current = self.lock_current();
            *current = Some(ActiveSession {
                token,
                user: user.clone(),
                expires_at,
                last_activity: now,
                last_persisted_activity: now,
            });
        }
        self.start_watchdog();

        tracing::info!(
            "✅ Session opened for {} (role: {})",
            redact::mask_value(&user.username),
            user.role
        );
        Ok(())
    }

    /// Ends the current session.
    ///
    /// Idempotent: calling it while logged out still wipes the vault
    /// and changes nothing else.
    pub fn logout(&self) {
        if self.end_session(SessionEvent::LoggedOut) {
            tracing::info!("👋 User logged out");
        }
    }

    /// Rehydrates a session from the vault without re-authentication.
    ///
    /// All four persisted fields must be present and parseable, the
    /// absolute expiry must not have passed, and the recorded activity
    /// gap must be within the inactivity window. Any failure wipes the
    /// vault and restores nothing.
    ///
    /// # Returns
    ///
    /// The restored user, or `None`.
    pub fn restore_session(&self) -> Option<User> {
        match self.try_restore() {
            Ok(Some(session)) => {
                let user = session.user.clone();
                {
                    let mut current = self.lock_current();
                    *current = Some(session);
                }
                self.start_watchdog();
                tracing::info!(
                    "✅ Session restored for {}",
                    redact::mask_value(&user.username)
                );
                Some(user)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    "⚠️ Stored session rejected: {}",
                    redact::scrub(&e.to_string())
                );
                self.wipe_vault();
                None
            }
        }
    }

    fn try_restore(&self) -> Result<Option<ActiveSession>> {
        let token = self.inner.vault.get_item(session_vault::KEY_SESSION_TOKEN)?;
        let expiry = self.inner.vault.get_item(session_vault::KEY_SESSION_EXPIRY)?;
        let user_json = self.inner.vault.get_item(session_vault::KEY_CURRENT_USER)?;
        let activity = self.inner.vault.get_item(session_vault::KEY_LAST_ACTIVITY)?;

        let (token, expiry, user_json, activity) = match (token, expiry, user_json, activity) {
            (None, None, None, None) => return Ok(None),
            (Some(t), Some(e), Some(u), Some(a)) => (t, e, u, a),
            _ => {
                return Err(AppError::Authentication(
                    "persisted session is incomplete".to_string(),
                ));
            }
        };

        let expires_at = parse_timestamp(&expiry, "expiry")?;
        let last_activity = parse_timestamp(&activity, "activity")?;
        let user: User = sonic_rs::from_str(&user_json)?;

        let now = self.inner.clock.now();
        if now > expires_at {
            return Err(AppError::Authentication("session expired".to_string()));
        }
        if now - last_activity > self.inner.policy.idle_timeout {
            return Err(AppError::Authentication(
                "session idle for too long".to_string(),
            ));
        }

        Ok(Some(ActiveSession {
            token,
            user,
            expires_at,
            last_activity,
            last_persisted_activity: last_activity,
        }))
    }

    /// Records user activity against the live session.
    ///
    /// The in-memory timestamp always moves (last writer wins); the
    /// persisted copy is refreshed at most once per flush interval, and
    /// a failed flush is logged but never ends the session. A no-op
    /// while logged out.
    pub fn notify_activity(&self) {
        let now = self.inner.clock.now();

        let flush = {
            let mut current = self.lock_current();
            let Some(session) = current.as_mut() else {
                return;
            };
            session.last_activity = now;
            if now - session.last_persisted_activity
                >= self.inner.policy.activity_flush_interval
            {
                session.last_persisted_activity = now;
                true
            } else {
                false
            }
        };

        if flush {
            if let Err(e) = self
                .inner
                .vault
                .set_items(&[(session_vault::KEY_LAST_ACTIVITY, now.to_rfc3339())])
            {
                tracing::warn!("⚠️ Failed to persist activity timestamp: {}", e);
            }
        }
    }

    /// Checks the live session against both deadlines, ending it when
    /// one has passed.
    ///
    /// The watchdog calls this on a timer; tests with a manual clock
    /// call it directly.
    ///
    /// # Returns
    ///
    /// The reason the session ended, or `None` when it is still alive
    /// (or there was none).
    pub fn enforce_deadlines(&self) -> Option<SessionEvent> {
        let now = self.inner.clock.now();

        let (verdict, username) = {
            let current = self.lock_current();
            match current.as_ref() {
                None => return None,
                Some(session) => {
                    let verdict = if now > session.expires_at {
                        Some(SessionEvent::Expired)
                    } else if now - session.last_activity > self.inner.policy.idle_timeout {
                        Some(SessionEvent::IdleTimeout)
                    } else {
                        None
                    };
                    (verdict, redact::mask_value(&session.user.username))
                }
            }
        };

        match verdict {
            Some(SessionEvent::Expired) => {
                tracing::warn!("🕐 Session for {} passed its absolute expiry", username);
                self.end_session(SessionEvent::Expired);
            }
            Some(SessionEvent::IdleTimeout) => {
                tracing::warn!("🕐 Session for {} closed after inactivity", username);
                self.end_session(SessionEvent::IdleTimeout);
            }
            Some(SessionEvent::LoggedOut) | None => {}
        }

        verdict
    }

    /// Subscribes to session-end notifications.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// The live session's user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.lock_current().as_ref().map(|s| s.user.clone())
    }

    /// Whether a session is live.
    pub fn is_authenticated(&self) -> bool {
        self.lock_current().is_some()
    }

    /// The capability flags of the live session's role.
    ///
    /// Recomputed on every call; all false while logged out.
    pub fn capabilities(&self) -> Capabilities {
        self.lock_current()
            .as_ref()
            .map(|s| Capabilities::for_role(s.user.role))
            .unwrap_or_default()
    }

    /// A snapshot of the live session for embedding layers.
    pub fn session_snapshot(&self) -> Option<SessionRecord> {
        self.lock_current().as_ref().map(|s| SessionRecord {
            token: s.token.clone(),
            user: s.user.clone(),
            expires_at: s.expires_at,
            last_activity: s.last_activity,
        })
    }

    /// Tears down the session state: watchdog, memory, vault. Returns
    /// whether a session was actually live, and emits `event` only then.
    fn end_session(&self, event: SessionEvent) -> bool {
        self.abort_watchdog();

        let previous = { self.lock_current().take() };
        self.wipe_vault();

        if previous.is_some() {
            let _ = self.inner.events.send(event);
            true
        } else {
            false
        }
    }

    fn wipe_vault(&self) {
        if let Err(e) = self.inner.vault.clear() {
            tracing::warn!("⚠️ Failed to clear session vault: {}", e);
        }
    }

    /// Replaces the deadline watchdog with one for the current session.
    fn start_watchdog(&self) {
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            manager.watchdog_loop().await;
        });

        let mut slot = self.lock_watchdog();
        if let Some(previous) = slot.replace(handle.abort_handle()) {
            previous.abort();
        }
    }

    fn abort_watchdog(&self) {
        let mut slot = self.lock_watchdog();
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Sleeps until the nearer of the two deadlines, then re-checks.
    /// Activity pushes the idle deadline out, so a wake-up may find
    /// nothing to do and go back to sleep.
    async fn watchdog_loop(&self) {
        loop {
            let deadline = {
                let current = self.lock_current();
                match current.as_ref() {
                    None => return,
                    Some(session) => {
                        let idle_deadline =
                            session.last_activity + self.inner.policy.idle_timeout;
                        session.expires_at.min(idle_deadline)
                    }
                }
            };

            let now = self.inner.clock.now();
            let wait = (deadline - now).to_std().unwrap_or_default()
                + std::time::Duration::from_millis(10);
            tokio::time::sleep(wait).await;

            if self.enforce_deadlines().is_some() {
                return;
            }
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_watchdog(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.inner
            .watchdog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_timestamp(value: &str, what: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| AppError::Authentication(format!("invalid {} timestamp", what)))
}
