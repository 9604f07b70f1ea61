use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::User;

/// A live authenticated session.
///
/// The token is opaque and unpredictable; it carries no encoded claims.
/// The user snapshot is captured at login time and only replaced by a
/// fresh login or restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The opaque session token.
    pub token: String,
    /// The authenticated user, as of login time.
    pub user: User,
    /// The instant the session expires regardless of activity.
    pub expires_at: DateTime<Utc>,
    /// The last observed user activity.
    pub last_activity: DateTime<Utc>,
}
