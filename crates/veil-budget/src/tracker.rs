//! The spend ledger.
//!
//! All ledger state sits behind one mutex. The lock is held only for the
//! read-modify-write of a single call and never across an `.await`.

use crate::clock::{Clock, SystemClock};
use crate::table::CostTable;
use crate::usage::{UsageRecord, UsageStats};
use chrono::{Datelike, NaiveDate};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use veil_core::BudgetConfig;

/// Number of records kept in the recent view of [`UsageStats`].
pub const RECENT_RECORDS: usize = 10;

/// Slack for float representation when comparing against a limit.
const TOLERANCE: f64 = 1e-9;

/// Tracks spend against daily and monthly limits.
///
/// Share it behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct CostTracker {
    daily_budget: f64,
    monthly_budget: f64,
    table: CostTable,
    clock: Arc<dyn Clock>,
    ledger: Mutex<Ledger>,
}

#[derive(Debug)]
struct Ledger {
    today: f64,
    month: f64,
    date: NaiveDate,
    history: Vec<UsageRecord>,
    recent: VecDeque<UsageRecord>,
}

impl Ledger {
    fn new(date: NaiveDate) -> Self {
        Self {
            today: 0.0,
            month: 0.0,
            date,
            history: Vec::new(),
            recent: VecDeque::with_capacity(RECENT_RECORDS),
        }
    }

    fn roll_over(&mut self, current: NaiveDate) {
        if current == self.date {
            return;
        }

        if (current.year(), current.month()) != (self.date.year(), self.date.month()) {
            tracing::info!(
                "Budget month rolled over to {}-{:02}, resetting ${:.4} spent",
                current.year(),
                current.month(),
                self.month
            );
            self.month = 0.0;
        }

        tracing::info!(
            "Budget day rolled over to {}, resetting ${:.4} spent",
            current,
            self.today
        );
        self.today = 0.0;
        self.date = current;
    }

    fn push(&mut self, record: UsageRecord) {
        self.today += record.cost;
        self.month += record.cost;

        if self.recent.len() == RECENT_RECORDS {
            self.recent.pop_front();
        }
        self.recent.push_back(record.clone());
        self.history.push(record);
    }
}

impl CostTracker {
    /// Create a tracker on the system clock.
    #[must_use]
    pub fn new(daily_budget: f64, monthly_budget: f64, table: CostTable) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let today = clock.now().date_naive();

        Self {
            daily_budget,
            monthly_budget,
            table,
            clock,
            ledger: Mutex::new(Ledger::new(today)),
        }
    }

    /// Create a tracker from the `[budget]` config section.
    #[must_use]
    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(
            config.daily_usd,
            config.monthly_usd,
            CostTable::from_config(config),
        )
    }

    /// Replace the time source. The current period starts at the new
    /// clock's date.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let today = clock.now().date_naive();
        self.ledger
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .date = today;
        self.clock = clock;
        self
    }

    /// Cost of a call, priced from the table.
    #[must_use]
    pub fn calculate_cost(&self, input_tokens: u32, output_tokens: u32, model: &str) -> f64 {
        self.table.rate(model).cost(input_tokens, output_tokens)
    }

    /// Whether a call costing `estimated_cost` fits under both limits.
    ///
    /// Negative estimates count as zero. A NaN estimate is denied.
    #[must_use]
    pub fn can_execute(&self, estimated_cost: f64) -> bool {
        if estimated_cost.is_nan() {
            tracing::warn!("Rejecting call with a NaN cost estimate");
            return false;
        }
        let estimated = estimated_cost.max(0.0);
        let ledger = self.ledger();

        let within_daily = ledger.today + estimated <= self.daily_budget + TOLERANCE;
        let within_monthly = ledger.month + estimated <= self.monthly_budget + TOLERANCE;

        if !within_daily {
            tracing::warn!(
                "Daily budget exceeded: ${:.4} spent + ${:.4} estimated > ${:.4}",
                ledger.today,
                estimated,
                self.daily_budget
            );
        } else if !within_monthly {
            tracing::warn!(
                "Monthly budget exceeded: ${:.4} spent + ${:.4} estimated > ${:.4}",
                ledger.month,
                estimated,
                self.monthly_budget
            );
        }

        within_daily && within_monthly
    }

    /// Bill a completed call and append it to the log.
    pub fn record(&self, input_tokens: u32, output_tokens: u32, model: &str) -> UsageRecord {
        let cost = self.calculate_cost(input_tokens, output_tokens, model);
        let mut ledger = self.ledger();

        let record = UsageRecord {
            timestamp: self.clock.now(),
            model: model.to_string(),
            input_tokens,
            output_tokens,
            cost,
        };
        ledger.push(record.clone());

        tracing::debug!(
            "Recorded {} ({} in / {} out): ${:.6}, today ${:.4}",
            model,
            input_tokens,
            output_tokens,
            cost,
            ledger.today
        );

        record
    }

    /// Snapshot of spend, headroom and the recent records.
    #[must_use]
    pub fn usage_stats(&self) -> UsageStats {
        let ledger = self.ledger();
        UsageStats::new(
            ledger.today,
            ledger.month,
            self.daily_budget,
            self.monthly_budget,
            ledger.recent.iter().cloned().collect(),
        )
    }

    /// Every record since the tracker was created, oldest first.
    #[must_use]
    pub fn usage_history(&self) -> Vec<UsageRecord> {
        self.ledger().history.clone()
    }

    /// Spend in the current day.
    #[must_use]
    pub fn today_cost(&self) -> f64 {
        self.ledger().today
    }

    /// Spend in the current month.
    #[must_use]
    pub fn month_cost(&self) -> f64 {
        self.ledger().month
    }

    /// Daily limit.
    #[must_use]
    pub fn daily_budget(&self) -> f64 {
        self.daily_budget
    }

    /// Monthly limit.
    #[must_use]
    pub fn monthly_budget(&self) -> f64 {
        self.monthly_budget
    }

    /// Pricing in use.
    #[must_use]
    pub fn table(&self) -> &CostTable {
        &self.table
    }

    /// Lock the ledger, rolling periods forward first.
    ///
    /// The ledger is plain numbers, so a poisoned lock is still usable.
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        let today = self.clock.now().date_naive();
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.roll_over(today);
        ledger
    }
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::from_config(&BudgetConfig::default())
    }
}
