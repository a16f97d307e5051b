//! Veil Orchestrator - privacy-safe LLM execution.
//!
//! The [`Orchestrator`] takes a [`Task`] through a fixed pipeline: check the
//! budget, replace PII with placeholders, ask the selector for candidate
//! providers, try them in order with retries, bill the successful call and
//! restore the original values in the answer.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use veil_budget::CostTracker;
//! use veil_llm::{OllamaProvider, StaticProviderSelector};
//! use veil_orchestrator::{ExecutionOptions, Orchestrator, Task};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let selector = StaticProviderSelector::new().with_provider(Arc::new(OllamaProvider::new()?));
//! let orchestrator = Orchestrator::new(Arc::new(CostTracker::default()), Arc::new(selector));
//!
//! let task = Task::new("Categorize: payment to Иванов И.И. 5000 KZT");
//! let result = orchestrator.execute(task, &ExecutionOptions::default()).await;
//!
//! if let Some(response) = result.response() {
//!     println!("{}", response.content);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod options;
pub mod orchestrator;
pub mod result;
pub mod task;

// Re-export commonly used types
pub use options::ExecutionOptions;
pub use orchestrator::Orchestrator;
pub use result::ExecutionResult;
pub use task::Task;
