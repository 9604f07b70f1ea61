use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A telemarketer's performance record for one month.
///
/// One record per salesperson per performance month; sales counters are
/// absolute totals for that month, not deltas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Telemarketer {
    /// The unique identifier for the record.
    pub id: Uuid,
    /// The salesperson's display name.
    pub name: String,
    /// Confirmed sales for the month.
    pub validated_sales: u32,
    /// Sales awaiting confirmation.
    pub pending_sales: u32,
    /// The monthly sales target.
    pub target: u32,
    /// The month this record covers, as `YYYY-MM`.
    pub performance_month: String,
    /// The manager responsible for this salesperson.
    pub manager_id: Option<Uuid>,
    /// The timestamp when the record was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The fields needed to create a telemarketer record.
#[derive(Clone, Debug)]
pub struct NewTelemarketer {
    pub name: String,
    pub validated_sales: u32,
    pub pending_sales: u32,
    pub target: u32,
    pub performance_month: String,
    pub manager_id: Option<Uuid>,
}

/// A partial update to a telemarketer record. `None` fields are left
/// untouched; the manager assignment can be moved but never cleared.
#[derive(Clone, Debug, Default)]
pub struct TelemarketerUpdate {
    pub name: Option<String>,
    pub validated_sales: Option<u32>,
    pub pending_sales: Option<u32>,
    pub target: Option<u32>,
    pub performance_month: Option<String>,
    pub manager_id: Option<Uuid>,
}
