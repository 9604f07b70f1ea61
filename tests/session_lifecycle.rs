//! End-to-end coverage of the session lifecycle: login, persistence,
//! restore, activity tracking, deadline enforcement, and logout.

mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast::error::TryRecvError;

use teleperf::bootstrap::BOOTSTRAP_ACCOUNTS;
use teleperf::clock::{Clock, SystemClock};
use teleperf::config::SessionPolicy;
use teleperf::models::credential::{Credential, SecretFormat};
use teleperf::models::user::{Role, User, UserUpdate};
use teleperf::services::auth::SessionEvent;
use teleperf::stores::credential_store::{CredentialStore, InMemoryCredentialStore};
use teleperf::stores::session_vault::{
    KEY_CURRENT_USER, KEY_LAST_ACTIVITY, KEY_SESSION_EXPIRY, KEY_SESSION_TOKEN, SessionVault,
};
use teleperf::stores::user_store::{InMemoryUserStore, UserStore};

#[tokio::test]
async fn login_opens_a_session_for_seeded_accounts() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;

    assert!(sessions.login("manager", "XABCZ").await);

    let user = sessions.current_user().unwrap();
    assert_eq!(user.username, "manager");
    assert_eq!(user.role, Role::Manager);
    assert!(sessions.is_authenticated());

    let caps = sessions.capabilities();
    assert!(caps.is_manager);
    assert!(caps.can_manage_users);
    assert!(!caps.can_manage_teams);
    assert!(!caps.is_admin);
}

#[tokio::test]
async fn blank_credentials_are_rejected_up_front() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;

    assert!(!sessions.login("", "XABCZ").await);
    assert!(!sessions.login("manager", "").await);
    assert!(!sessions.login("   ", "   ").await);
    assert!(!sessions.is_authenticated());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;

    // Unknown account and wrong password give the same answer.
    assert!(!sessions.login("nobody", "XABCZ").await);
    assert!(!sessions.login("manager", "not-the-password").await);

    // So does a disabled account with the right password.
    let manager = platform
        .state
        .user_service
        .get_by_username("manager")
        .await
        .unwrap()
        .unwrap();
    platform
        .state
        .user_service
        .update_user(
            manager.id,
            UserUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!sessions.login("manager", "XABCZ").await);

    assert!(!sessions.is_authenticated());
    assert!(sessions.current_user().is_none());
}

#[tokio::test]
async fn a_storage_outage_reads_as_a_failed_login() {
    common::init_tracing();
    let platform = common::platform_with_stores(
        Arc::new(common::UnreachableUserStore),
        Arc::new(InMemoryCredentialStore::new()),
    );

    assert!(!platform.state.session_manager.login("manager", "XABCZ").await);
    assert!(!platform.state.session_manager.is_authenticated());
}

#[tokio::test]
async fn plaintext_credentials_upgrade_on_first_login() {
    common::init_tracing();
    let platform = common::manual_platform();
    let sessions = &platform.state.session_manager;
    let now = platform.clock.now();

    platform
        .state
        .users
        .insert(common::test_user("legacy", Role::Manager, None))
        .await
        .unwrap();
    platform
        .state
        .credentials
        .upsert(Credential::plain("legacy", "demo-pass", now))
        .await
        .unwrap();

    assert!(sessions.login("legacy", "demo-pass").await);

    let stored = platform
        .state
        .credentials
        .get("legacy")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.format, SecretFormat::Hashed);
    assert_ne!(stored.secret, "demo-pass");

    // The upgraded credential still accepts the same password.
    sessions.logout();
    assert!(sessions.login("legacy", "demo-pass").await);
}

#[tokio::test]
async fn a_wrong_password_leaves_a_plaintext_credential_untouched() {
    common::init_tracing();
    let platform = common::manual_platform();
    let now = platform.clock.now();

    platform
        .state
        .users
        .insert(common::test_user("legacy", Role::Manager, None))
        .await
        .unwrap();
    platform
        .state
        .credentials
        .upsert(Credential::plain("legacy", "demo-pass", now))
        .await
        .unwrap();

    assert!(!platform.state.session_manager.login("legacy", "guessed").await);

    let stored = platform
        .state
        .credentials
        .get("legacy")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.format, SecretFormat::Plain);
    assert_eq!(stored.secret, "demo-pass");
}

#[tokio::test]
async fn a_failed_upgrade_write_fails_the_whole_login() {
    common::init_tracing();
    let inner = InMemoryCredentialStore::new();
    inner
        .upsert(Credential::plain("legacy", "demo-pass", Utc::now()))
        .await
        .unwrap();
    let credentials = Arc::new(common::ReadOnlyCredentialStore::new(inner));

    let users = Arc::new(InMemoryUserStore::new());
    users
        .insert(common::test_user("legacy", Role::Manager, None))
        .await
        .unwrap();

    let platform = common::platform_with_stores(users, credentials.clone());

    // Right password, but the upgrade cannot be written.
    assert!(!platform.state.session_manager.login("legacy", "demo-pass").await);
    assert!(platform.state.session_manager.current_user().is_none());

    let stored = credentials.get("legacy").await.unwrap().unwrap();
    assert_eq!(stored.format, SecretFormat::Plain);
}

#[tokio::test]
async fn bootstrap_passwords_only_work_while_the_store_is_empty() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;

    // Strip every stored credential to reopen the bootstrap window.
    for account in BOOTSTRAP_ACCOUNTS.iter() {
        platform
            .state
            .credentials
            .remove(account.username)
            .await
            .unwrap();
    }
    assert!(platform.state.credentials.is_empty().await.unwrap());

    // The window does not loosen password checking.
    assert!(!sessions.login("manager", "guessed").await);

    // A matching bootstrap pair gets in and writes a real credential.
    assert!(sessions.login("manager", "XABCZ").await);
    let healed = platform
        .state
        .credentials
        .get("manager")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(healed.format, SecretFormat::Hashed);

    // That write closed the window for every other bootstrap entry.
    sessions.logout();
    assert!(!sessions.login("CARLY", "XABCZ-2").await);
}

#[tokio::test]
async fn login_persists_all_four_fields_in_one_write() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let login_time = platform.clock.now();

    let before = platform.vault.writes();
    assert!(platform.state.session_manager.login("manager", "XABCZ").await);
    assert_eq!(platform.vault.writes(), before + 1);

    let token = platform.vault.get_item(KEY_SESSION_TOKEN).unwrap().unwrap();
    assert_eq!(token.len(), 43);

    let expiry = platform.vault.get_item(KEY_SESSION_EXPIRY).unwrap().unwrap();
    let expires_at = DateTime::parse_from_rfc3339(&expiry)
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(expires_at, login_time + Duration::hours(8));

    let user_json = platform.vault.get_item(KEY_CURRENT_USER).unwrap().unwrap();
    let persisted: User = serde_json::from_str(&user_json).unwrap();
    assert_eq!(persisted.username, "manager");

    let activity = platform.vault.get_item(KEY_LAST_ACTIVITY).unwrap().unwrap();
    let last_activity = DateTime::parse_from_rfc3339(&activity)
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(last_activity, login_time);
}

#[tokio::test]
async fn restore_rehydrates_without_reauthentication() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    assert!(platform.state.session_manager.login("manager", "XABCZ").await);
    let original = platform.state.session_manager.session_snapshot().unwrap();

    // A fresh manager over the same vault, as after a process restart.
    let revived = platform.fresh_session_manager();
    let user = revived.restore_session().unwrap();

    assert_eq!(user.username, "manager");
    assert!(revived.is_authenticated());
    assert!(revived.capabilities().can_manage_users);

    let snapshot = revived.session_snapshot().unwrap();
    assert_eq!(snapshot.token, original.token);
    assert_eq!(snapshot.expires_at, original.expires_at);
}

#[tokio::test]
async fn an_empty_vault_restores_nothing() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();

    assert!(platform.state.session_manager.restore_session().is_none());
    assert!(!platform.state.session_manager.is_authenticated());
}

#[tokio::test]
async fn restore_rejects_a_partial_vault() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    assert!(platform.state.session_manager.login("manager", "XABCZ").await);

    // Re-persist only three of the four fields, as a torn write would.
    let token = platform.vault.get_item(KEY_SESSION_TOKEN).unwrap().unwrap();
    let expiry = platform.vault.get_item(KEY_SESSION_EXPIRY).unwrap().unwrap();
    let user_json = platform.vault.get_item(KEY_CURRENT_USER).unwrap().unwrap();
    platform.vault.clear().unwrap();
    platform
        .vault
        .set_items(&[
            (KEY_SESSION_TOKEN, token),
            (KEY_SESSION_EXPIRY, expiry),
            (KEY_CURRENT_USER, user_json),
        ])
        .unwrap();

    let revived = platform.fresh_session_manager();
    assert!(revived.restore_session().is_none());
    assert!(!revived.is_authenticated());
    // The leftover fragments were wiped.
    assert_eq!(platform.vault.len(), 0);
}

#[tokio::test]
async fn restore_rejects_garbage_payloads() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let now = platform.clock.now().to_rfc3339();
    let expiry = (platform.clock.now() + Duration::hours(8)).to_rfc3339();

    // A user snapshot that does not parse.
    platform
        .vault
        .set_items(&[
            (KEY_SESSION_TOKEN, "tok".to_string()),
            (KEY_SESSION_EXPIRY, expiry.clone()),
            (KEY_CURRENT_USER, "{not json".to_string()),
            (KEY_LAST_ACTIVITY, now.clone()),
        ])
        .unwrap();
    let revived = platform.fresh_session_manager();
    assert!(revived.restore_session().is_none());
    assert_eq!(platform.vault.len(), 0);

    // A timestamp that does not parse.
    let user_json = serde_json::to_string(&common::test_user("mika", Role::Agent, None)).unwrap();
    platform
        .vault
        .set_items(&[
            (KEY_SESSION_TOKEN, "tok".to_string()),
            (KEY_SESSION_EXPIRY, "yesterday".to_string()),
            (KEY_CURRENT_USER, user_json),
            (KEY_LAST_ACTIVITY, now),
        ])
        .unwrap();
    let revived = platform.fresh_session_manager();
    assert!(revived.restore_session().is_none());
    assert_eq!(platform.vault.len(), 0);
}

#[tokio::test]
async fn restore_honors_the_absolute_expiry_boundary() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;
    assert!(sessions.login("manager", "XABCZ").await);

    // Stay active right up to the expiry instant.
    for _ in 0..16 {
        platform.clock.advance(Duration::minutes(30));
        sessions.notify_activity();
    }

    // Exactly at the expiry instant the session is still restorable.
    let revived = platform.fresh_session_manager();
    assert_eq!(revived.restore_session().unwrap().username, "manager");
}

#[tokio::test]
async fn restore_rejects_a_session_past_its_expiry() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;
    assert!(sessions.login("manager", "XABCZ").await);

    for _ in 0..16 {
        platform.clock.advance(Duration::minutes(30));
        sessions.notify_activity();
    }
    platform.clock.advance(Duration::seconds(1));

    let revived = platform.fresh_session_manager();
    assert!(revived.restore_session().is_none());
    assert_eq!(platform.vault.len(), 0);
}

#[tokio::test]
async fn restore_honors_the_idle_boundary() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    assert!(platform.state.session_manager.login("manager", "XABCZ").await);

    // A gap of exactly the inactivity window is still acceptable.
    platform.clock.advance(Duration::minutes(40));
    let revived = platform.fresh_session_manager();
    assert_eq!(revived.restore_session().unwrap().username, "manager");
}

#[tokio::test]
async fn restore_rejects_a_session_idle_too_long() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    assert!(platform.state.session_manager.login("manager", "XABCZ").await);

    platform.clock.advance(Duration::minutes(40) + Duration::seconds(1));
    let revived = platform.fresh_session_manager();
    assert!(revived.restore_session().is_none());
    assert_eq!(platform.vault.len(), 0);
}

#[tokio::test]
async fn activity_bursts_coalesce_to_one_write() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;
    assert!(sessions.login("manager", "XABCZ").await);
    let base = platform.vault.writes();

    // A burst within the flush interval never touches the vault.
    for _ in 0..5 {
        sessions.notify_activity();
    }
    assert_eq!(platform.vault.writes(), base);

    // Once the interval has passed, exactly one write lands.
    platform.clock.advance(Duration::seconds(2));
    sessions.notify_activity();
    assert_eq!(platform.vault.writes(), base + 1);
    for _ in 0..5 {
        sessions.notify_activity();
    }
    assert_eq!(platform.vault.writes(), base + 1);

    // The in-memory timestamp still tracks the latest call.
    platform.clock.advance(Duration::milliseconds(500));
    sessions.notify_activity();
    assert_eq!(platform.vault.writes(), base + 1);
    let snapshot = sessions.session_snapshot().unwrap();
    assert_eq!(snapshot.last_activity, platform.clock.now());
}

#[tokio::test]
async fn activity_pushes_the_idle_deadline_out() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;
    assert!(sessions.login("manager", "XABCZ").await);

    platform.clock.advance(Duration::minutes(30));
    sessions.notify_activity();

    // An hour after login, but only thirty minutes after activity.
    platform.clock.advance(Duration::minutes(30));
    assert_eq!(sessions.enforce_deadlines(), None);
    assert!(sessions.is_authenticated());

    // The gap since the last activity now crosses the window.
    platform.clock.advance(Duration::minutes(10) + Duration::seconds(1));
    assert_eq!(sessions.enforce_deadlines(), Some(SessionEvent::IdleTimeout));
}

#[tokio::test]
async fn idle_sessions_are_force_terminated() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;
    assert!(sessions.login("manager", "XABCZ").await);
    let mut events = sessions.events();

    platform.clock.advance(Duration::minutes(40) + Duration::seconds(1));
    assert_eq!(sessions.enforce_deadlines(), Some(SessionEvent::IdleTimeout));

    assert!(!sessions.is_authenticated());
    assert!(sessions.current_user().is_none());
    assert!(!sessions.capabilities().is_manager);
    assert_eq!(platform.vault.len(), 0);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::IdleTimeout);
}

#[tokio::test]
async fn an_active_session_still_ends_at_its_absolute_expiry() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;
    assert!(sessions.login("manager", "XABCZ").await);
    let mut events = sessions.events();

    // Constant activity keeps the idle deadline at bay for eight hours.
    for _ in 0..16 {
        platform.clock.advance(Duration::minutes(30));
        sessions.notify_activity();
        assert_eq!(sessions.enforce_deadlines(), None);
    }

    // One second past the absolute lifetime ends it regardless.
    platform.clock.advance(Duration::seconds(1));
    assert_eq!(sessions.enforce_deadlines(), Some(SessionEvent::Expired));
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    assert_eq!(platform.vault.len(), 0);
}

#[tokio::test]
async fn expiry_outranks_idleness_when_both_have_passed() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;
    assert!(sessions.login("manager", "XABCZ").await);

    platform.clock.advance(Duration::hours(9));
    assert_eq!(sessions.enforce_deadlines(), Some(SessionEvent::Expired));
}

#[tokio::test]
async fn logout_is_idempotent() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;
    assert!(sessions.login("manager", "XABCZ").await);
    let mut events = sessions.events();

    sessions.logout();
    assert!(!sessions.is_authenticated());
    assert_eq!(platform.vault.len(), 0);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);

    // A second logout changes nothing and emits nothing.
    sessions.logout();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn a_second_login_replaces_the_live_session() {
    common::init_tracing();
    let platform = common::manual_platform();
    platform.state.initialize().await.unwrap();
    let sessions = &platform.state.session_manager;

    assert!(sessions.login("manager", "XABCZ").await);
    let first = sessions.session_snapshot().unwrap();

    assert!(sessions.login("agent", "demo123").await);
    let second = sessions.session_snapshot().unwrap();

    assert_eq!(second.user.username, "agent");
    assert_ne!(second.token, first.token);

    let user_json = platform.vault.get_item(KEY_CURRENT_USER).unwrap().unwrap();
    let persisted: User = serde_json::from_str(&user_json).unwrap();
    assert_eq!(persisted.username, "agent");
}

#[tokio::test]
async fn the_watchdog_ends_idle_sessions_on_its_own() {
    common::init_tracing();
    let policy = SessionPolicy {
        absolute_lifetime: Duration::hours(1),
        idle_timeout: Duration::milliseconds(200),
        activity_flush_interval: Duration::milliseconds(1),
    };
    let sessions = common::session_manager_with_user(
        policy,
        Arc::new(SystemClock),
        "watch",
        "keepalive-pass",
    )
    .await;

    assert!(sessions.login("watch", "keepalive-pass").await);
    let mut events = sessions.events();

    let event = tokio::time::timeout(StdDuration::from_secs(2), events.recv())
        .await
        .expect("watchdog should have fired")
        .unwrap();
    assert_eq!(event, SessionEvent::IdleTimeout);
    assert!(!sessions.is_authenticated());
    assert!(sessions.current_user().is_none());
}
