//! Core of a sales-performance tracking platform: session lifecycle and
//! authorization for the dashboard, tiered commission calculation, and
//! the directory services around them.
//!
//! Storage is abstracted behind async traits with in-memory
//! implementations, so the crate embeds directly into tests or a
//! surrounding application.

pub mod analytics;
pub mod bootstrap;
pub mod clock;
pub mod commission;
pub mod config;
pub mod error;
pub mod redact;
pub mod state;

pub mod crypto {
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod credential;
    pub mod permission;
    pub mod session;
    pub mod team;
    pub mod telemarketer;
    pub mod user;
}

pub mod stores {
    pub mod credential_store;
    pub mod permission_store;
    pub mod session_vault;
    pub mod team_store;
    pub mod telemarketer_store;
    pub mod user_store;
}

pub mod services {
    pub mod auth;
    pub mod permissions;
    pub mod teams;
    pub mod telemarketers;
    pub mod users;
}

pub mod validation {
    pub mod auth;
    pub mod telemarketer;
}

pub use commission::{COMMISSION_TIERS, Commission, CommissionTier, calculate_commission};
pub use config::{Config, SessionPolicy};
pub use error::{AppError, Result};
pub use models::user::{Capabilities, Role, User};
pub use services::auth::{SessionEvent, SessionManager};
pub use state::AppState;
