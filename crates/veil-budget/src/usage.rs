//! Usage records and budget snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successful provider call, as billed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// When the call was recorded
    pub timestamp: DateTime<Utc>,

    /// Model id reported by the provider
    pub model: String,

    /// Input tokens consumed
    pub input_tokens: u32,

    /// Output tokens generated
    pub output_tokens: u32,

    /// Cost in USD
    pub cost: f64,
}

/// Snapshot of spend against both budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Spend in the current UTC day
    pub today_cost: f64,
    /// Spend in the current UTC month
    pub month_cost: f64,
    /// Daily limit
    pub daily_budget: f64,
    /// Monthly limit
    pub monthly_budget: f64,
    /// Daily headroom, never negative
    pub daily_remaining: f64,
    /// Monthly headroom, never negative
    pub monthly_remaining: f64,
    /// Share of the daily budget spent, 0 to 100
    pub daily_percent_used: f64,
    /// Share of the monthly budget spent, 0 to 100
    pub monthly_percent_used: f64,
    /// Most recent records, newest last
    pub recent: Vec<UsageRecord>,
}

impl UsageStats {
    pub(crate) fn new(
        today_cost: f64,
        month_cost: f64,
        daily_budget: f64,
        monthly_budget: f64,
        recent: Vec<UsageRecord>,
    ) -> Self {
        Self {
            today_cost,
            month_cost,
            daily_budget,
            monthly_budget,
            daily_remaining: (daily_budget - today_cost).max(0.0),
            monthly_remaining: (monthly_budget - month_cost).max(0.0),
            daily_percent_used: percent_used(today_cost, daily_budget),
            monthly_percent_used: percent_used(month_cost, monthly_budget),
            recent,
        }
    }
}

fn percent_used(spent: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return if spent > 0.0 { 100.0 } else { 0.0 };
    }
    (spent / budget * 100.0).clamp(0.0, 100.0)
}
