//! Provider selection by routing preference.

use crate::provider::LlmProvider;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;

/// Supplies the ordered fallback list of providers for a preference.
///
/// The first provider is tried first; the orchestrator moves down the list
/// as providers fail.
pub trait ProviderSelector: Send + Sync {
    /// Candidates for `preference`, best first. May be empty.
    fn providers_with_fallback(&self, preference: RoutingPreference) -> Vec<Arc<dyn LlmProvider>>;
}

/// Routing preference for provider selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RoutingPreference {
    /// Cheapest adequate provider first
    #[default]
    FastCheap,

    /// Providers with JSON/structured output support first
    StructuredOutput,

    /// Largest context window first, regardless of cost
    HighQuality,

    /// Never send data off the machine
    LocalOnly,
}

/// Selector over a fixed set of registered providers, ordered by capabilities.
#[derive(Default)]
pub struct StaticProviderSelector {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl StaticProviderSelector {
    /// Create an empty selector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to the selector.
    pub fn add_provider(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.push(provider);
    }

    /// Builder form of [`add_provider`](Self::add_provider).
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.add_provider(provider);
        self
    }

    /// Get list of registered providers, in registration order.
    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn LlmProvider>] {
        &self.providers
    }
}

impl ProviderSelector for StaticProviderSelector {
    fn providers_with_fallback(&self, preference: RoutingPreference) -> Vec<Arc<dyn LlmProvider>> {
        let mut candidates = self.providers.clone();

        // Sorts are stable: ties keep registration order.
        match preference {
            RoutingPreference::FastCheap => {
                candidates.sort_by_key(|p| p.capabilities().cost_tier);
            }
            RoutingPreference::StructuredOutput => {
                candidates.sort_by_key(|p| {
                    let caps = p.capabilities();
                    (!caps.supports_structured_output, caps.cost_tier)
                });
            }
            RoutingPreference::HighQuality => {
                candidates.sort_by_key(|p| Reverse(p.capabilities().max_context_tokens));
            }
            RoutingPreference::LocalOnly => {
                candidates.retain(|p| p.capabilities().is_local);
            }
        }

        tracing::debug!(
            "Selected {} of {} providers for {:?}",
            candidates.len(),
            self.providers.len(),
            preference
        );

        candidates
    }
}
