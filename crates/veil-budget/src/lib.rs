//! Veil Budget - spend ledger and per-model pricing.
//!
//! [`CostTracker`] keeps running totals for the current UTC day and month,
//! prices calls from a [`CostTable`], and answers whether the next call
//! still fits under both limits.
//!
//! # Example
//!
//! ```rust
//! use veil_budget::{CostTable, CostTracker};
//!
//! let tracker = CostTracker::new(1.0, 20.0, CostTable::builtin());
//! assert!(tracker.can_execute(0.01));
//!
//! let record = tracker.record(1000, 500, "gpt-4o-mini");
//! assert!((record.cost - 0.000_45).abs() < 1e-9);
//! assert_eq!(tracker.usage_stats().recent.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod clock;
pub mod table;
pub mod tracker;
pub mod usage;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use table::{CostTable, ModelRate, DEFAULT_MODEL};
pub use tracker::{CostTracker, RECENT_RECORDS};
pub use usage::{UsageRecord, UsageStats};
