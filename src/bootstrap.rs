//! Fixed bootstrap accounts for a fresh deployment.
//!
//! These exist so the very first operator can get in before any
//! credential records have been written. The passwords here are only
//! honored while the credential store is completely empty; the first
//! successful bootstrap login writes a hashed credential and closes
//! that window for good.

use subtle::ConstantTimeEq;

use crate::models::user::Role;

/// A built-in account available on first run.
#[derive(Clone, Copy, Debug)]
pub struct BootstrapAccount {
    /// The account's username.
    pub username: &'static str,
    /// The first-run password, honored only while no credentials exist.
    pub password: &'static str,
    /// The account's display name.
    pub name: &'static str,
    /// The account's email address.
    pub email: &'static str,
    /// The account's role.
    pub role: Role,
    /// Whether the account is hidden from regular directory listings.
    pub hidden: bool,
    /// The username of the manager whose team this account joins,
    /// for agent accounts.
    pub manager_username: Option<&'static str>,
}

/// The bootstrap account table.
pub const BOOTSTRAP_ACCOUNTS: [BootstrapAccount; 5] = [
    BootstrapAccount {
        username: "super_admin1",
        password: "XABCZ-1",
        name: "Super Administrateur",
        email: "super.admin@company.com",
        role: Role::SuperAdmin,
        hidden: true,
        manager_username: None,
    },
    BootstrapAccount {
        username: "admin2",
        password: "XABCZ-2",
        name: "Administrateur Principal",
        email: "admin@company.com",
        role: Role::Admin,
        hidden: true,
        manager_username: None,
    },
    BootstrapAccount {
        username: "manager",
        password: "XABCZ",
        name: "CLEMENT",
        email: "sophie.martin@company.com",
        role: Role::Manager,
        hidden: false,
        manager_username: None,
    },
    BootstrapAccount {
        username: "CARLY",
        password: "XABCZ-2",
        name: "CARLY",
        email: "carly@company.com",
        role: Role::Manager,
        hidden: false,
        manager_username: None,
    },
    BootstrapAccount {
        username: "agent",
        password: "demo123",
        name: "Pierre Dubois",
        email: "pierre.dubois@company.com",
        role: Role::Agent,
        hidden: false,
        manager_username: Some("manager"),
    },
];

/// Looks up a bootstrap account by exact username.
pub fn find_account(username: &str) -> Option<&'static BootstrapAccount> {
    BOOTSTRAP_ACCOUNTS.iter().find(|a| a.username == username)
}

/// Checks a password against the bootstrap table in constant time.
///
/// Returns the matched account, or `None` when the username is unknown
/// or the password does not match.
pub fn verify_account(username: &str, password: &str) -> Option<&'static BootstrapAccount> {
    let account = find_account(username)?;
    let matches: bool = password
        .as_bytes()
        .ct_eq(account.password.as_bytes())
        .into();

    matches.then_some(account)
}
