use anyhow::{Context, Result};
use chrono::Duration;
use std::env;

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The absolute lifetime of a session in hours.
    pub session_lifetime_hours: i64,
    /// The inactivity timeout in minutes.
    pub idle_timeout_minutes: i64,
    /// The minimum gap between persisted activity timestamps, in seconds.
    pub activity_flush_seconds: i64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Unset variables fall back to the defaults: 8 hour sessions, a
    /// 40 minute inactivity timeout, and a 1 second activity flush.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            session_lifetime_hours: env::var("SESSION_LIFETIME_HOURS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .context("Invalid SESSION_LIFETIME_HOURS")?,
            idle_timeout_minutes: env::var("IDLE_TIMEOUT_MINUTES")
                .unwrap_or_else(|_| "40".to_string())
                .parse()
                .context("Invalid IDLE_TIMEOUT_MINUTES")?,
            activity_flush_seconds: env::var("ACTIVITY_FLUSH_SECONDS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("Invalid ACTIVITY_FLUSH_SECONDS")?,
        })
    }

    /// Converts the configured values into a `SessionPolicy`.
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            absolute_lifetime: Duration::hours(self.session_lifetime_hours),
            idle_timeout: Duration::minutes(self.idle_timeout_minutes),
            activity_flush_interval: Duration::seconds(self.activity_flush_seconds),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_lifetime_hours: 8,
            idle_timeout_minutes: 40,
            activity_flush_seconds: 1,
        }
    }
}

/// The session lifetime rules enforced by the session manager.
#[derive(Clone, Copy, Debug)]
pub struct SessionPolicy {
    /// How long a session may live regardless of activity.
    pub absolute_lifetime: Duration,
    /// How long a session survives without any activity.
    pub idle_timeout: Duration,
    /// The minimum gap between persisted activity timestamps.
    pub activity_flush_interval: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Config::default().session_policy()
    }
}
