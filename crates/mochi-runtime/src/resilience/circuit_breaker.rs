//! Circuit breaker for oracle transports.
//!
//! When a provider fails repeatedly the circuit opens and oracle calls fail
//! immediately instead of waiting on a dead transport. A consensus round that
//! hits an open circuit is rejected like any other oracle failure.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,

    /// Time before a recovery attempt
    #[serde(with = "crate::config::duration_human")]
    pub recovery_timeout: Duration,

    /// Successes in half-open state needed to close
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Calls are refused
    Open { opened_at: Instant },

    /// Probing whether the transport recovered
    HalfOpen { successes: u32 },
}

/// Per-transport circuit breaker, keyed by provider name.
pub struct CircuitBreaker {
    states: RwLock<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls to `key` should be refused.
    ///
    /// An open circuit whose recovery timeout elapsed moves to half-open and
    /// lets the call through.
    pub fn is_open(&self, key: &str) -> bool {
        let states = self.states.read();
        match states.get(key) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(key);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, key: &str) {
        let mut states = self.states.write();
        match states.get(key).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(key.to_string(), CircuitState::Closed { failures: 0 });
                    tracing::info!(provider = key, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        key.to_string(),
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { failures }) if failures > 0 => {
                states.insert(key.to_string(), CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self, key: &str) {
        let mut states = self.states.write();
        let failures = match states.get(key) {
            Some(CircuitState::Closed { failures }) => *failures,
            None => 0,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    key.to_string(),
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(provider = key, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures + 1 >= self.config.failure_threshold {
            states.insert(
                key.to_string(),
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                provider = key,
                failures = failures + 1,
                "Circuit opened after repeated failures"
            );
        } else {
            states.insert(
                key.to_string(),
                CircuitState::Closed {
                    failures: failures + 1,
                },
            );
        }
    }

    fn transition_to_half_open(&self, key: &str) {
        let mut states = self.states.write();
        if matches!(states.get(key), Some(CircuitState::Open { .. })) {
            states.insert(key.to_string(), CircuitState::HalfOpen { successes: 0 });
            tracing::info!(provider = key, "Circuit half-open, probing recovery");
        }
    }

    /// Current state of a circuit.
    pub fn state(&self, key: &str) -> CircuitState {
        self.states
            .read()
            .get(key)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Close every circuit.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32, recovery_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            recovery_timeout,
            success_threshold: 1,
        })
    }

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::default();
        assert!(!cb.is_open("anthropic"));
        assert!(matches!(cb.state("anthropic"), CircuitState::Closed { failures: 0 }));
    }

    #[test]
    fn test_circuit_opens_after_failures() {
        let cb = breaker(2, Duration::from_secs(60));

        cb.record_failure("anthropic");
        assert!(!cb.is_open("anthropic"));

        cb.record_failure("anthropic");
        assert!(cb.is_open("anthropic"));
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = CircuitBreaker::default();

        cb.record_failure("anthropic");
        cb.record_failure("anthropic");
        cb.record_success("anthropic");
        cb.record_failure("anthropic");
        cb.record_failure("anthropic");

        assert!(!cb.is_open("anthropic"));
    }

    #[test]
    fn test_providers_are_independent() {
        let cb = breaker(1, Duration::from_secs(60));

        cb.record_failure("anthropic");
        assert!(cb.is_open("anthropic"));
        assert!(!cb.is_open("scripted"));
    }

    #[test]
    fn test_recovery_through_half_open() {
        let cb = breaker(1, Duration::ZERO);

        cb.record_failure("anthropic");
        assert!(matches!(cb.state("anthropic"), CircuitState::Open { .. }));

        // Zero recovery timeout: the next check probes.
        assert!(!cb.is_open("anthropic"));
        assert!(matches!(cb.state("anthropic"), CircuitState::HalfOpen { .. }));

        cb.record_success("anthropic");
        assert!(matches!(cb.state("anthropic"), CircuitState::Closed { failures: 0 }));
    }

    #[test]
    fn test_failed_probe_reopens() {
        let cb = breaker(1, Duration::ZERO);

        cb.record_failure("anthropic");
        assert!(!cb.is_open("anthropic"));
        cb.record_failure("anthropic");
        assert!(matches!(cb.state("anthropic"), CircuitState::Open { .. }));
    }
}
