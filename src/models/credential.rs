use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a stored secret is encoded.
///
/// Legacy records carry the raw password; they are upgraded to `Hashed`
/// in place on the first successful login. The format is recorded
/// explicitly so nothing ever has to sniff the secret's shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretFormat {
    /// The secret is the raw password. Legacy only.
    Plain,
    /// The secret is an Argon2id PHC string.
    Hashed,
}

/// A stored login credential, keyed by username.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// The username this credential belongs to.
    pub username: String,
    /// The secret, encoded per `format`.
    pub secret: String,
    /// How `secret` is encoded.
    pub format: SecretFormat,
    /// The timestamp when the credential was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the credential was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Creates a hashed credential record.
    pub fn hashed(username: impl Into<String>, hash: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            secret: hash.into(),
            format: SecretFormat::Hashed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a legacy plaintext credential record.
    pub fn plain(username: impl Into<String>, secret: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
            format: SecretFormat::Plain,
            created_at: now,
            updated_at: now,
        }
    }
}
