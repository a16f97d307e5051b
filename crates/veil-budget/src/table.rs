//! Per-model token pricing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use veil_core::{BudgetConfig, ModelRateConfig};

/// Key of the fallback entry in config tables.
pub const DEFAULT_MODEL: &str = "default";

/// Price of one model in USD per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRate {
    /// Cost per 1000 input tokens
    pub input_per_1k: f64,
    /// Cost per 1000 output tokens
    pub output_per_1k: f64,
}

impl ModelRate {
    /// Create a rate from per-1K prices.
    #[must_use]
    pub const fn per_1k(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Cost of a call with the given token counts.
    #[must_use]
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        f64::from(input_tokens) / 1000.0 * self.input_per_1k
            + f64::from(output_tokens) / 1000.0 * self.output_per_1k
    }
}

impl From<&ModelRateConfig> for ModelRate {
    fn from(config: &ModelRateConfig) -> Self {
        Self::per_1k(config.input_per_1k, config.output_per_1k)
    }
}

/// Model id → rate, with a fallback for models not listed.
#[derive(Debug, Clone, PartialEq)]
pub struct CostTable {
    rates: HashMap<String, ModelRate>,
    default: ModelRate,
}

impl CostTable {
    /// Table with no entries; every model is priced at `default`.
    #[must_use]
    pub fn new(default: ModelRate) -> Self {
        Self {
            rates: HashMap::new(),
            default,
        }
    }

    /// The standard price list.
    ///
    /// Unknown models are billed at the `gpt-4o` rate so that an
    /// unrecognised id never undercounts spend.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(ModelRate::per_1k(0.0025, 0.01))
            .with_rate("gpt-4o-mini", ModelRate::per_1k(0.000_15, 0.0006))
            .with_rate("gpt-4o", ModelRate::per_1k(0.0025, 0.01))
            .with_rate("gpt-4-turbo", ModelRate::per_1k(0.01, 0.03))
            .with_rate("gpt-3.5-turbo", ModelRate::per_1k(0.0005, 0.0015))
            .with_rate("claude-3-5-sonnet", ModelRate::per_1k(0.003, 0.015))
            .with_rate("claude-3-haiku", ModelRate::per_1k(0.000_25, 0.001_25))
            .with_rate("llama3.1:8b", ModelRate::per_1k(0.0, 0.0))
    }

    /// Builtin table with the config's `[budget.models]` entries laid over it.
    #[must_use]
    pub fn from_config(config: &BudgetConfig) -> Self {
        let mut table = Self::builtin();
        for (model, rate) in &config.models {
            if model == DEFAULT_MODEL {
                table.default = rate.into();
            } else {
                table.rates.insert(model.clone(), rate.into());
            }
        }
        table
    }

    /// Add or replace the rate for `model`.
    #[must_use]
    pub fn with_rate(mut self, model: impl Into<String>, rate: ModelRate) -> Self {
        self.rates.insert(model.into(), rate);
        self
    }

    /// Rate for `model`, or the fallback rate.
    #[must_use]
    pub fn rate(&self, model: &str) -> ModelRate {
        self.rates.get(model).copied().unwrap_or(self.default)
    }

    /// Whether `model` has its own entry.
    #[must_use]
    pub fn contains(&self, model: &str) -> bool {
        self.rates.contains_key(model)
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self::builtin()
    }
}
