//! Pure dashboard computations over telemarketer records.
//!
//! Everything here takes plain slices and returns owned results; the
//! caller decides where the rows came from and what month is "current".

use serde::Serialize;
use uuid::Uuid;

use crate::models::telemarketer::Telemarketer;
use crate::models::user::{Role, User};

/// Which telemarketer rows a viewer may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeamScope {
    /// Every row. Admin and super admin views.
    All,
    /// Only rows managed by the given user id. `None` matches rows
    /// without a manager, which creation forbids, so it is an empty
    /// scope in practice.
    ManagedBy(Option<Uuid>),
}

impl TeamScope {
    /// Whether a row falls inside this scope.
    pub fn includes(&self, telemarketer: &Telemarketer) -> bool {
        match self {
            TeamScope::All => true,
            TeamScope::ManagedBy(manager) => telemarketer.manager_id == *manager,
        }
    }
}

/// Derives the scope a viewer gets over the dashboard.
///
/// Admins see everything unless they narrow the view to one manager;
/// managers always see their own team; agents see their manager's team.
pub fn scope_for(viewer: &User, selected_manager: Option<Uuid>) -> TeamScope {
    match viewer.role {
        Role::Admin | Role::SuperAdmin => match selected_manager {
            Some(manager) => TeamScope::ManagedBy(Some(manager)),
            None => TeamScope::All,
        },
        Role::Manager => TeamScope::ManagedBy(Some(viewer.id)),
        Role::Agent => TeamScope::ManagedBy(viewer.team_id),
    }
}

/// Selects the rows of one month inside a scope.
pub fn filter_rows<'a>(
    rows: &'a [Telemarketer],
    month: &str,
    scope: &TeamScope,
) -> Vec<&'a Telemarketer> {
    rows.iter()
        .filter(|t| t.performance_month == month && scope.includes(t))
        .collect()
}

/// Aggregated team numbers for one month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// How many salespeople the summary covers.
    pub headcount: usize,
    /// Confirmed sales across the team.
    pub total_validated: u64,
    /// Sales awaiting confirmation across the team.
    pub total_pending: u64,
    /// Confirmed plus pending sales.
    pub total_sales: u64,
    /// The summed monthly targets.
    pub total_target: u64,
    /// Validated sales as a rounded percentage of target; zero when
    /// no targets are set.
    pub average_performance: u32,
}

/// Aggregates a filtered set of rows into one summary.
pub fn summarize(rows: &[&Telemarketer]) -> MonthlySummary {
    let total_validated: u64 = rows.iter().map(|t| u64::from(t.validated_sales)).sum();
    let total_pending: u64 = rows.iter().map(|t| u64::from(t.pending_sales)).sum();
    let total_target: u64 = rows.iter().map(|t| u64::from(t.target)).sum();

    let average_performance = if total_target > 0 {
        ((total_validated as f64 / total_target as f64) * 100.0).round() as u32
    } else {
        0
    };

    MonthlySummary {
        headcount: rows.len(),
        total_validated,
        total_pending,
        total_sales: total_validated + total_pending,
        total_target,
        average_performance,
    }
}

/// What to order dashboard rows by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Validated sales.
    Performance,
    /// Display name.
    Name,
    /// Performance month.
    Month,
}

/// Which way to order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Orders rows in place by the given key and direction.
pub fn sort_rows(rows: &mut [&Telemarketer], key: SortKey, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Performance => a.validated_sales.cmp(&b.validated_sales),
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Month => a.performance_month.cmp(&b.performance_month),
        };
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Keeps only rows whose name contains the query, case-insensitively.
/// An empty query keeps everything.
pub fn search_by_name<'a>(rows: &[&'a Telemarketer], query: &str) -> Vec<&'a Telemarketer> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|t| t.name.to_lowercase().contains(&needle))
        .copied()
        .collect()
}
