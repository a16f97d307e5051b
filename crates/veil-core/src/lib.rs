//! Veil Core - Foundation crate for the Veil execution core.
//!
//! This crate provides the configuration model, error types and logging
//! setup that the budget, LLM and orchestrator crates share.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`logging`] - `tracing-subscriber` initialization
//!
//! # Example
//!
//! ```rust
//! use veil_core::AppConfig;
//!
//! let mut config = AppConfig::default();
//! config.apply_overrides(|key| (key == "VEIL_MAX_RETRIES").then(|| "5".to_string()));
//! assert_eq!(config.orchestrator.max_retries, 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, BudgetConfig, ModelRateConfig, OrchestratorConfig};
pub use error::{ConfigError, ConfigResult, Result, VeilError};
pub use logging::init_tracing;
