//! Oracle backed by an [`LlmProvider`].

use async_trait::async_trait;
use std::sync::Arc;

use super::{Oracle, OracleError};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};
use crate::resilience::{CircuitBreaker, LlmUsage, UsageTracker};

/// Sends each prompt as a single user message.
///
/// Before a call it checks the provider's circuit and reserves the estimated
/// tokens; after a call it records actual usage and feeds the outcome back
/// into the circuit.
pub struct ProviderOracle {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    circuit_breaker: Arc<CircuitBreaker>,
    usage: Arc<UsageTracker>,
}

impl ProviderOracle {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            usage: Arc::new(UsageTracker::unlimited()),
        }
    }

    /// Share a circuit breaker with other oracles.
    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    /// Share a usage tracker (and its budget) with other oracles.
    pub fn with_usage_tracker(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = usage;
        self
    }

    /// Usage so far.
    pub fn usage(&self) -> LlmUsage {
        self.usage.get_usage()
    }
}

#[async_trait]
impl Oracle for ProviderOracle {
    async fn invoke(&self, prompt: &str) -> Result<String, OracleError> {
        let key = self.provider.name();

        if self.circuit_breaker.is_open(key) {
            tracing::warn!(provider = key, "Circuit open, refusing oracle call");
            return Err(OracleError::CircuitOpen(key.to_string()));
        }

        let estimated = self
            .provider
            .estimate_tokens(prompt)
            .saturating_add(self.completion.max_tokens);
        if !self.usage.try_reserve(estimated) {
            tracing::warn!(provider = key, estimated, "Token budget exhausted");
            return Err(OracleError::BudgetExceeded);
        }

        let result = self
            .provider
            .complete(vec![ChatMessage::user(prompt)], &self.completion)
            .await;

        // Record actual usage before giving the estimate back
        if let Ok(response) = &result {
            self.usage.record_usage(&response.usage, &response.model);
        }
        self.usage.release(estimated);

        match result {
            Ok(response) => {
                self.circuit_breaker.record_success(key);
                tracing::debug!(
                    provider = key,
                    tokens = response.usage.total(),
                    stop_reason = ?response.stop_reason,
                    "Oracle answered"
                );
                Ok(response.content)
            }
            Err(e) => {
                self.circuit_breaker.record_failure(key);
                Err(e.into())
            }
        }
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}
