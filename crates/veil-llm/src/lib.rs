//! Veil LLM - provider abstraction, selection and PII anonymization.
//!
//! This crate holds everything the orchestrator needs to talk to a model
//! without leaking personal data:
//!
//! - **Provider Abstraction**: one async trait for cloud and local backends
//! - **Error Taxonomy**: rate limits, quota, outages and generic failures
//!   are distinct so callers can retry, wait or fall back
//! - **Provider Selection**: ordered fallback lists per routing preference
//! - **PII Anonymization**: reversible `[KIND_n]` placeholders for names,
//!   phones, IDs, accounts, cards, emails and addresses
//!
//! # Example
//!
//! ```rust
//! use veil_llm::PiiAnonymizer;
//!
//! let anonymizer = PiiAnonymizer::new();
//! let result = anonymizer.anonymize("Call me at +77011234567");
//! assert_eq!(result.text, "Call me at [PHONE_1]");
//!
//! let restored = anonymizer.deanonymize(&result.text, &result.mapping);
//! assert_eq!(restored, "Call me at +77011234567");
//! ```
//!
//! # Privacy Model
//!
//! ```text
//! Prompt → anonymize → provider.complete → deanonymize → Response
//!              ↓                                ↑
//!              └──────── placeholder mapping ───┘
//! ```
//!
//! The mapping never leaves the process; providers only see placeholders.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod anonymizer;
pub mod error;
pub mod provider;
pub mod providers;
pub mod selector;

// Re-export commonly used types
pub use anonymizer::{AnonymizationResult, DetectedPii, PiiAnonymizer, PiiKind};
pub use error::{ProviderError, Result};
pub use provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderCapabilities, Usage,
};
pub use providers::{OllamaProvider, OpenAiProvider};
pub use selector::{ProviderSelector, RoutingPreference, StaticProviderSelector};
