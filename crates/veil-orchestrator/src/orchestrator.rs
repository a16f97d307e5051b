//! The execution pipeline.
//!
//! ```text
//! budget check → anonymize → select providers → attempt (retry / fall back)
//!              → record cost → de-anonymize
//! ```

use crate::options::ExecutionOptions;
use crate::result::ExecutionResult;
use crate::task::Task;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use veil_budget::CostTracker;
use veil_llm::{
    CompletionRequest, CompletionResponse, LlmProvider, PiiAnonymizer, ProviderError,
    ProviderSelector, RoutingPreference,
};

/// Runs tasks against providers within budget, without leaking PII.
///
/// Cheap to share: the only mutable state is the cost tracker's ledger.
pub struct Orchestrator {
    cost_tracker: Arc<CostTracker>,
    selector: Arc<dyn ProviderSelector>,
    anonymizer: PiiAnonymizer,
}

impl Orchestrator {
    /// Create an orchestrator with the default anonymizer.
    #[must_use]
    pub fn new(cost_tracker: Arc<CostTracker>, selector: Arc<dyn ProviderSelector>) -> Self {
        Self {
            cost_tracker,
            selector,
            anonymizer: PiiAnonymizer::new(),
        }
    }

    /// Replace the anonymizer.
    #[must_use]
    pub fn with_anonymizer(mut self, anonymizer: PiiAnonymizer) -> Self {
        self.anonymizer = anonymizer;
        self
    }

    /// The ledger this orchestrator bills to.
    #[must_use]
    pub fn cost_tracker(&self) -> &Arc<CostTracker> {
        &self.cost_tracker
    }

    /// Run `task` through the pipeline.
    pub async fn execute(&self, task: Task, options: &ExecutionOptions) -> ExecutionResult {
        self.execute_with_cancellation(task, options, CancellationToken::new())
            .await
    }

    /// Run `task` routed to providers with structured output support.
    pub async fn execute_structured(
        &self,
        task: Task,
        options: &ExecutionOptions,
    ) -> ExecutionResult {
        self.execute(
            task.with_preference(RoutingPreference::StructuredOutput),
            options,
        )
        .await
    }

    /// Run `task`, abandoning it as soon as `cancel` fires.
    ///
    /// A cancelled or timed-out call records no cost.
    pub async fn execute_with_cancellation(
        &self,
        task: Task,
        options: &ExecutionOptions,
        cancel: CancellationToken,
    ) -> ExecutionResult {
        let task_id = task.id;

        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tracing::warn!("Task {} cancelled", task_id);
                ExecutionResult::Error {
                    message: "cancelled".to_string(),
                    cause: None,
                }
            }

            outcome = tokio::time::timeout(options.timeout, self.run(task, options)) => {
                outcome.unwrap_or_else(|_| {
                    tracing::warn!("Task {} timed out after {:?}", task_id, options.timeout);
                    ExecutionResult::Error {
                        message: format!("timed out after {:?}", options.timeout),
                        cause: None,
                    }
                })
            }
        }
    }

    async fn run(&self, mut task: Task, options: &ExecutionOptions) -> ExecutionResult {
        if !self.cost_tracker.can_execute(task.estimated_cost) {
            tracing::warn!(
                "Task {} denied: estimated ${:.4} exceeds remaining budget",
                task.id,
                task.estimated_cost
            );
            return ExecutionResult::CostLimitExceeded;
        }

        if task.requires_anonymization {
            self.anonymize(&mut task);
        }

        let providers = self.selector.providers_with_fallback(task.preference);
        if providers.is_empty() {
            tracing::warn!("Task {}: no provider for {:?}", task.id, task.preference);
            return ExecutionResult::ProviderUnavailable;
        }

        let request = task.to_request();
        let mut last_error = None;

        for provider in &providers {
            match Self::attempt(provider.as_ref(), &request, options).await {
                Ok(response) => return self.finish(&task, response),
                Err(e) => {
                    tracing::warn!(
                        "Task {}: provider {} failed ({}), falling back",
                        task.id,
                        provider.name(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        ExecutionResult::Error {
            message: format!("all {} providers failed", providers.len()),
            cause: last_error,
        }
    }

    /// Try one provider until it answers, gives a non-retryable error, or
    /// runs out of attempts.
    async fn attempt(
        provider: &dyn LlmProvider,
        request: &CompletionRequest,
        options: &ExecutionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let max_attempts = options.attempts();
        let mut attempt = 1;

        loop {
            let err = match provider.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            let delay = match retry_delay(&err, attempt, options) {
                Some(delay) if attempt < max_attempts => delay,
                _ => return Err(err),
            };

            tracing::warn!(
                "{} failed (attempt {}/{}): {}, retrying in {:?}",
                provider.name(),
                attempt,
                max_attempts,
                err,
                delay
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Swap PII in the prompt and system prompt for placeholders, keeping
    /// the mapping on the task.
    fn anonymize(&self, task: &mut Task) {
        let mut texts = vec![task.prompt.as_str()];
        texts.extend(task.system_prompt.as_deref());

        let mut results = self.anonymizer.anonymize_all(&texts).into_iter();
        let mut mapping = HashMap::new();

        if let Some(prompt) = results.next() {
            mapping.extend(prompt.mapping);
            task.prompt = prompt.text;
        }
        if let Some(system) = results.next() {
            mapping.extend(system.mapping);
            task.system_prompt = Some(system.text);
        }

        tracing::debug!("Task {}: {} values anonymized", task.id, mapping.len());
        task.anonymization_mapping = (!mapping.is_empty()).then_some(mapping);
    }

    fn finish(&self, task: &Task, mut response: CompletionResponse) -> ExecutionResult {
        let usage = response.usage;
        let record = self
            .cost_tracker
            .record(usage.input_tokens, usage.output_tokens, &response.model);

        tracing::info!(
            "Task {} completed by {} ({} tokens, ${:.6})",
            task.id,
            response.model,
            usage.total_tokens(),
            record.cost
        );

        if let Some(mapping) = &task.anonymization_mapping {
            response.content = self.anonymizer.deanonymize(&response.content, mapping);
        }

        ExecutionResult::Success {
            response,
            tokens_used: usage.total_tokens(),
        }
    }
}

/// Wait before retrying the same provider, or `None` to move on at once.
fn retry_delay(err: &ProviderError, attempt: u32, options: &ExecutionOptions) -> Option<Duration> {
    match err {
        ProviderError::QuotaExceeded | ProviderError::Unavailable => None,
        ProviderError::RateLimited {
            retry_after_ms: Some(ms),
        } => Some(Duration::from_millis(*ms)),
        ProviderError::RateLimited {
            retry_after_ms: None,
        }
        | ProviderError::Generic(_) => Some(options.base_backoff.saturating_mul(attempt)),
    }
}
