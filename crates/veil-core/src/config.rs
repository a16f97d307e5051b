//! Configuration management for Veil.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration for the execution core.
///
/// This is loaded from `~/.config/veil/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Spend limits and per-model pricing
    pub budget: BudgetConfig,
    /// Retry, backoff and deadline settings
    pub orchestrator: OrchestratorConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML or fail validation
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, using defaults if it is absent.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `VEIL_DAILY_BUDGET`: Override the daily budget (USD)
    /// - `VEIL_MONTHLY_BUDGET`: Override the monthly budget (USD)
    /// - `VEIL_MAX_RETRIES`: Override attempts per provider
    /// - `VEIL_TIMEOUT_MS`: Override the overall pipeline deadline
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(daily) = lookup("VEIL_DAILY_BUDGET").and_then(|v| v.parse().ok()) {
            self.budget.daily_usd = daily;
            tracing::debug!("Override budget.daily_usd from env: {}", daily);
        }

        if let Some(monthly) = lookup("VEIL_MONTHLY_BUDGET").and_then(|v| v.parse().ok()) {
            self.budget.monthly_usd = monthly;
            tracing::debug!("Override budget.monthly_usd from env: {}", monthly);
        }

        if let Some(retries) = lookup("VEIL_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.orchestrator.max_retries = retries;
            tracing::debug!("Override orchestrator.max_retries from env: {}", retries);
        }

        if let Some(timeout) = lookup("VEIL_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.orchestrator.timeout_ms = timeout;
            tracing::debug!("Override orchestrator.timeout_ms from env: {}", timeout);
        }
    }

    /// Check that budgets and rates are usable numbers.
    pub fn validate(&self) -> ConfigResult<()> {
        check_amount("budget.daily_usd", self.budget.daily_usd)?;
        check_amount("budget.monthly_usd", self.budget.monthly_usd)?;

        for (model, rate) in &self.budget.models {
            check_amount(&format!("budget.models.{model}.input_per_1k"), rate.input_per_1k)?;
            check_amount(
                &format!("budget.models.{model}.output_per_1k"),
                rate.output_per_1k,
            )?;
        }

        if self.orchestrator.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "orchestrator.timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/veil/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "veil", "veil").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn check_amount(field: &str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a non-negative amount, got {value}"),
        });
    }
    Ok(())
}

/// Spend limits and pricing overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Daily spend limit in USD
    pub daily_usd: f64,
    /// Monthly spend limit in USD
    pub monthly_usd: f64,
    /// Per-model rates overriding the built-in cost table.
    /// The key `default` replaces the fallback rate for unknown models.
    pub models: BTreeMap<String, ModelRateConfig>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_usd: 1.0,
            monthly_usd: 20.0,
            models: BTreeMap::new(),
        }
    }
}

/// Price of one model, in USD per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRateConfig {
    /// Cost per 1000 input tokens
    pub input_per_1k: f64,
    /// Cost per 1000 output tokens
    pub output_per_1k: f64,
}

/// Retry and deadline settings for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Attempts made against each provider before moving on
    pub max_retries: u32,
    /// Overall pipeline deadline in milliseconds
    pub timeout_ms: u64,
    /// Base backoff in milliseconds, multiplied by the attempt number
    pub base_backoff_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout_ms: 60_000,
            base_backoff_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!((config.budget.daily_usd - 1.0).abs() < f64::EPSILON);
        assert!((config.budget.monthly_usd - 20.0).abs() < f64::EPSILON);
        assert!(config.budget.models.is_empty());
        assert_eq!(config.orchestrator.max_retries, 3);
        assert_eq!(config.orchestrator.base_backoff_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.budget.daily_usd = 0.5;
        config.budget.models.insert(
            "local-llama".to_string(),
            ModelRateConfig {
                input_per_1k: 0.0,
                output_per_1k: 0.0,
            },
        );
        config.orchestrator.max_retries = 5;

        config.save_to(&config_path).expect("save config");
        let loaded = AppConfig::load_from(&config_path).expect("load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let loaded =
            AppConfig::load_from(&tmp.path().join("absent.toml")).expect("load defaults");
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[budget]
daily_usd = 0.25

[budget.models.gpt-4o-mini]
input_per_1k = 0.0002
output_per_1k = 0.0008
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert!((config.budget.daily_usd - 0.25).abs() < f64::EPSILON);
        assert!((config.budget.monthly_usd - 20.0).abs() < f64::EPSILON);
        assert_eq!(config.budget.models.len(), 1);
        assert_eq!(config.orchestrator, OrchestratorConfig::default());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VEIL_DAILY_BUDGET", "2.5"),
            ("VEIL_MAX_RETRIES", "7"),
            ("VEIL_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| (*v).to_string()));

        assert!((config.budget.daily_usd - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.orchestrator.max_retries, 7);
        // Unparseable values leave the default in place
        assert_eq!(config.orchestrator.timeout_ms, 60_000);
    }

    #[test]
    fn test_validate_rejects_negative_budget() {
        let mut config = AppConfig::default();
        config.budget.monthly_usd = -1.0;

        let err = config.validate().expect_err("negative budget must fail");
        assert!(err.to_string().contains("budget.monthly_usd"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.orchestrator.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_invalid_rate() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "[budget.models.bad]\ninput_per_1k = -0.1\noutput_per_1k = 0.0\n",
        )
        .expect("write config");

        let result = AppConfig::load_from(&path);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
