//! The fact-checking service.
//!
//! `verify_fact` and `get_last_verdict` are the two public operations:
//! - `verify_fact` runs a consensus round, applies the off-topic fallback to
//!   the accepted record, stores and returns its JSON
//! - `get_last_verdict` returns the stored JSON or a fixed placeholder

use std::sync::Arc;

use mochi_core::{apply_fallback, ConsensusOutcome, VerdictRecord, NO_FACTS_CHECKED_JSON};

use crate::config::RuntimeConfig;
use crate::engine::{ConsensusEngine, ConsensusReport, RuntimeError};
use crate::oracle::ProviderOracle;
use crate::providers::ProviderRegistry;
use crate::resilience::{CircuitBreaker, LlmUsage, UsageTracker};
use crate::store::{InMemoryVerdictStore, VerdictStore};

/// An accepted check.
#[derive(Debug, Clone)]
pub struct Verification {
    /// Exactly what was stored
    pub json: String,

    /// The record after the fallback
    pub record: VerdictRecord,

    /// Round metadata
    pub report: ConsensusReport,
}

/// Checks claims about cats and remembers the last accepted verdict.
pub struct FactChecker {
    engine: ConsensusEngine,
    store: Arc<dyn VerdictStore>,
    usage: Option<Arc<UsageTracker>>,
}

impl FactChecker {
    pub fn new(engine: ConsensusEngine, store: Arc<dyn VerdictStore>) -> Self {
        Self {
            engine,
            store,
            usage: None,
        }
    }

    /// Wire a provider-backed checker from configuration.
    pub fn from_config(
        config: &RuntimeConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;

        let provider = registry.create(&config.provider.provider_type, &config.provider.settings)?;
        let circuit_breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker.clone()));
        let usage = Arc::new(UsageTracker::from_limit(config.token_budget));

        let oracle = ProviderOracle::new(provider, config.completion.clone())
            .with_circuit_breaker(circuit_breaker)
            .with_usage_tracker(usage.clone());

        let engine = ConsensusEngine::new(Arc::new(oracle), config.consensus.clone())?
            .with_oracle_timeout(config.oracle_timeout);

        tracing::debug!(
            provider = %config.provider.provider_type,
            model = %config.completion.model,
            "Fact checker configured"
        );

        Ok(Self {
            engine,
            store: Arc::new(InMemoryVerdictStore::new()),
            usage: Some(usage),
        })
    }

    /// Use a different store.
    pub fn with_store(mut self, store: Arc<dyn VerdictStore>) -> Self {
        self.store = store;
        self
    }

    /// Check a claim; return the accepted verdict JSON.
    ///
    /// On rejection returns [`RuntimeError::NoConsensus`] and leaves the
    /// stored verdict untouched.
    pub async fn verify_fact(&self, fact: &str) -> Result<String, RuntimeError> {
        Ok(self.verify(fact).await?.json)
    }

    /// Like [`verify_fact`](Self::verify_fact), keeping the record and round metadata.
    pub async fn verify(&self, fact: &str) -> Result<Verification, RuntimeError> {
        let report = self.engine.run_consensus(fact).await;

        let accepted = match &report.outcome {
            ConsensusOutcome::Accepted(record) => record.clone(),
            ConsensusOutcome::Rejected(reason) => return Err(RuntimeError::NoConsensus(*reason)),
        };

        let record = apply_fallback(accepted, fact);
        let json = record.to_json()?;
        self.store.replace(json.clone());

        tracing::info!(
            verdict = %record.verdict,
            confidence = record.confidence,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Verdict stored"
        );

        Ok(Verification {
            json,
            record,
            report,
        })
    }

    /// Last accepted verdict JSON, or the "no facts checked" placeholder.
    pub fn get_last_verdict(&self) -> String {
        self.store
            .last()
            .unwrap_or_else(|| NO_FACTS_CHECKED_JSON.to_string())
    }

    /// Oracle usage, when wired from configuration.
    pub fn usage(&self) -> Option<LlmUsage> {
        self.usage.as_ref().map(|usage| usage.get_usage())
    }

    pub fn engine(&self) -> &ConsensusEngine {
        &self.engine
    }
}
