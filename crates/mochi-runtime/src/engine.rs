//! Consensus engine: leader/validator rounds over a non-deterministic oracle.
//!
//! The engine implements:
//! - A leader round, then validator rounds fanned out concurrently
//! - A per-call timeout on every oracle invocation
//! - Deterministic fan-in through [`mochi_core::decide`]
//! - Early rejection when the leader fails

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use mochi_core::{
    decide, tally, ConsensusOutcome, ConsensusPolicy, ExecutionAttempt, PolicyError,
    RejectionReason, Role, Tally,
};

use crate::config::ConfigError;
use crate::oracle::{Oracle, OracleError};
use crate::prompts::fact_check_prompt;
use crate::providers::ProviderError;

/// Default upper bound on one oracle call.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("No consensus: {0}")]
    NoConsensus(RejectionReason),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid consensus policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("Failed to encode verdict: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Outcome of one consensus round plus what it took to get there.
#[derive(Debug, Clone)]
pub struct ConsensusReport {
    /// Accepted record or rejection reason
    pub outcome: ConsensusOutcome,

    /// Validator votes on the leader record
    pub tally: Tally,

    /// Leader first, then validators in index order
    pub attempts: Vec<ExecutionAttempt>,

    /// Wall-clock duration of the round
    pub elapsed: Duration,

    /// When the round finished
    pub completed_at: DateTime<Utc>,
}

impl ConsensusReport {
    /// Number of oracle calls made.
    pub fn oracle_calls(&self) -> usize {
        self.attempts.len()
    }
}

/// Runs leader/validator consensus for a claim.
///
/// # Protocol
/// 1. Leader: render the prompt, invoke the oracle, parse
/// 2. If the leader failed: reject, no validator calls
/// 3. Validators: same prompt, independent concurrent calls
/// 4. Fan-in: [`decide`] against the policy
///
/// Timeouts count as oracle failures. Nothing is retried.
pub struct ConsensusEngine {
    oracle: Arc<dyn Oracle>,
    policy: ConsensusPolicy,
    oracle_timeout: Duration,
}

impl ConsensusEngine {
    /// Create an engine. Fails if the policy is invalid.
    pub fn new(oracle: Arc<dyn Oracle>, policy: ConsensusPolicy) -> Result<Self, RuntimeError> {
        policy.validate()?;
        Ok(Self {
            oracle,
            policy,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        })
    }

    /// Override the per-call timeout.
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &ConsensusPolicy {
        &self.policy
    }

    pub fn oracle_timeout(&self) -> Duration {
        self.oracle_timeout
    }

    /// Run one consensus round for `claim`.
    pub async fn run_consensus(&self, claim: &str) -> ConsensusReport {
        let started = Instant::now();
        let prompt = fact_check_prompt(claim);

        tracing::info!(
            oracle = self.oracle.name(),
            claim_len = claim.chars().count(),
            validators = self.policy.validators,
            quorum = self.policy.quorum,
            "Starting consensus round"
        );

        let leader = self.execute(Role::Leader, &prompt).await;

        if !leader.succeeded() {
            tracing::warn!("Leader failed, skipping validators");
            let tally = tally(&leader, &[], self.policy.confidence_tolerance);
            return Self::report(
                ConsensusOutcome::Rejected(RejectionReason::LeaderFailed),
                tally,
                vec![leader],
                started,
            );
        }

        // Fan-out: validators run concurrently with each other
        let validators = join_all(
            (0..self.policy.validators).map(|i| self.execute(Role::Validator(i), &prompt)),
        )
        .await;

        // Fan-in: deterministic decision (no oracle)
        let outcome = decide(&leader, &validators, &self.policy);
        let tally = tally(&leader, &validators, self.policy.confidence_tolerance);

        match &outcome {
            ConsensusOutcome::Accepted(record) => tracing::info!(
                verdict = %record.verdict,
                confidence = record.confidence,
                agreeing = tally.agreeing,
                "Consensus reached"
            ),
            ConsensusOutcome::Rejected(reason) => tracing::warn!(
                reason = %reason,
                agreeing = tally.agreeing,
                disagreeing = tally.disagreeing,
                failed = tally.failed,
                "Consensus rejected"
            ),
        }

        let mut attempts = Vec::with_capacity(validators.len() + 1);
        attempts.push(leader);
        attempts.extend(validators);

        Self::report(outcome, tally, attempts, started)
    }

    /// One oracle call under the timeout.
    async fn execute(&self, role: Role, prompt: &str) -> ExecutionAttempt {
        match tokio::time::timeout(self.oracle_timeout, self.oracle.invoke(prompt)).await {
            Ok(Ok(raw)) => {
                let attempt = ExecutionAttempt::answered(role, raw);
                if let Some(record) = &attempt.record {
                    tracing::debug!(
                        role = %role,
                        verdict = %record.verdict,
                        confidence = record.confidence,
                        "Oracle answered"
                    );
                }
                attempt
            }
            Ok(Err(e)) => {
                tracing::warn!(role = %role, error = %e, "Oracle call failed");
                ExecutionAttempt::failed(role, e)
            }
            Err(_) => {
                tracing::warn!(role = %role, timeout = ?self.oracle_timeout, "Oracle call timed out");
                ExecutionAttempt::failed(role, OracleError::Timeout(self.oracle_timeout))
            }
        }
    }

    fn report(
        outcome: ConsensusOutcome,
        tally: Tally,
        attempts: Vec<ExecutionAttempt>,
        started: Instant,
    ) -> ConsensusReport {
        ConsensusReport {
            outcome,
            tally,
            attempts,
            elapsed: started.elapsed(),
            completed_at: Utc::now(),
        }
    }
}

/// Builder for ConsensusEngine.
pub struct ConsensusEngineBuilder {
    oracle: Option<Arc<dyn Oracle>>,
    policy: ConsensusPolicy,
    oracle_timeout: Duration,
}

impl ConsensusEngineBuilder {
    pub fn new() -> Self {
        Self {
            oracle: None,
            policy: ConsensusPolicy::default(),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    /// Set the oracle.
    pub fn oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Set the consensus policy.
    pub fn policy(mut self, policy: ConsensusPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the per-call timeout.
    pub fn oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<ConsensusEngine, RuntimeError> {
        let oracle = self
            .oracle
            .ok_or_else(|| RuntimeError::ProviderNotConfigured("No oracle set".to_string()))?;

        Ok(ConsensusEngine::new(oracle, self.policy)?.with_oracle_timeout(self.oracle_timeout))
    }
}

impl Default for ConsensusEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
