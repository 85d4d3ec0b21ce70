//! Resilience patterns for oracle calls.
//!
//! This module provides:
//! - Circuit breaker to stop hammering a failing transport
//! - Token budget and usage accounting
//!
//! Neither retries: a failed oracle call fails its execution round.

mod budget;
mod circuit_breaker;

pub use budget::{LlmUsage, TokenBudget, UsageTracker};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
