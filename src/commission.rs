//! Tiered commission calculation for monthly validated sales.
//!
//! The whole month's count is paid at the rate of the single tier it
//! lands in; tiers are not marginal brackets. Below the first tier no
//! commission is due at all.

use serde::Serialize;

/// The minimum validated sales before any commission is due.
pub const MIN_COMMISSIONABLE_SALES: u32 = 12;

/// One row of the commission schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CommissionTier {
    /// The tier number, 1-based.
    pub tier: u8,
    /// The lowest sales count in this tier.
    pub min_sales: u32,
    /// The highest sales count in this tier; `None` for the open-ended
    /// top tier.
    pub max_sales: Option<u32>,
    /// The payout per validated sale, in currency minor units.
    pub rate: u64,
    /// The tier's display label.
    pub label: &'static str,
}

/// The commission schedule, ordered by tier.
pub const COMMISSION_TIERS: [CommissionTier; 6] = [
    CommissionTier { tier: 1, min_sales: 12, max_sales: Some(15), rate: 5_000, label: "Débutant" },
    CommissionTier { tier: 2, min_sales: 16, max_sales: Some(20), rate: 6_000, label: "Confirmé" },
    CommissionTier { tier: 3, min_sales: 21, max_sales: Some(25), rate: 7_000, label: "Senior" },
    CommissionTier { tier: 4, min_sales: 26, max_sales: Some(30), rate: 8_000, label: "Expert" },
    CommissionTier { tier: 5, min_sales: 31, max_sales: Some(39), rate: 9_000, label: "Elite" },
    CommissionTier { tier: 6, min_sales: 40, max_sales: None, rate: 10_000, label: "Champion" },
];

/// The outcome of a commission calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commission {
    /// The total payout, in currency minor units.
    pub amount: u64,
    /// The tier the sales count landed in; `None` below the schedule.
    pub tier: Option<&'static CommissionTier>,
}

/// Finds the tier a sales count lands in.
pub fn tier_for(validated_sales: u32) -> Option<&'static CommissionTier> {
    COMMISSION_TIERS.iter().find(|t| {
        validated_sales >= t.min_sales && t.max_sales.is_none_or(|max| validated_sales <= max)
    })
}

/// Calculates the commission for a month's validated sales.
///
/// The count cannot be negative: the domain is `u32`, so the boundary
/// case simply does not exist.
///
/// # Arguments
///
/// * `validated_sales` - Confirmed sales for the month.
///
/// # Returns
///
/// The payout and the tier it was paid at.
pub fn calculate_commission(validated_sales: u32) -> Commission {
    match tier_for(validated_sales) {
        Some(tier) => Commission {
            amount: u64::from(validated_sales) * tier.rate,
            tier: Some(tier),
        },
        None => Commission {
            amount: 0,
            tier: None,
        },
    }
}
