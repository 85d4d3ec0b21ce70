//! Token budget and usage accounting for oracle calls.
//!
//! Every consensus round costs at least two completions, so a host may cap
//! total tokens. Each call reserves its estimate up front and releases it
//! afterwards; a call whose estimate does not fit fails with
//! `OracleError::BudgetExceeded`.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::providers::TokenUsage;

/// Token budget for a scope.
pub struct TokenBudget {
    /// Maximum tokens allowed
    pub max_tokens: u32,

    used: AtomicU32,
}

impl TokenBudget {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            used: AtomicU32::new(0),
        }
    }

    /// Atomically claim `tokens` if they fit. Concurrent callers cannot
    /// overrun the cap together.
    pub fn try_reserve(&self, tokens: u32) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(tokens).filter(|&total| total <= self.max_tokens)
            })
            .is_ok()
    }

    /// Return a reservation.
    pub fn release(&self, tokens: u32) {
        // The closure never returns None, so the update cannot fail.
        let _ = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_sub(tokens))
            });
    }

    pub fn record(&self, tokens: u32) {
        let _ = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_add(tokens))
            });
    }

    pub fn remaining(&self) -> u32 {
        self.max_tokens.saturating_sub(self.used.load(Ordering::SeqCst))
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.used.store(0, Ordering::SeqCst);
    }
}

/// Accumulated oracle usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Total tokens used
    pub total_tokens: u32,

    /// Prompt/input tokens
    pub prompt_tokens: u32,

    /// Completion/output tokens
    pub completion_tokens: u32,

    /// Number of completions
    pub llm_calls: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,

    /// Calls that read from the prompt cache
    pub cache_hits: u32,
}

impl LlmUsage {
    /// Add token usage from a provider response.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.llm_calls += 1;

        if usage.cache_read_tokens > 0 {
            self.cache_hits += 1;
        }

        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // USD per million tokens: input, output, cache write, cache read
        let (input_rate, output_rate, cache_write_rate, cache_read_rate) = match model {
            m if m.contains("sonnet-4-5") => (3.0, 15.0, 3.75, 0.3),
            m if m.contains("opus-4-5") => (5.0, 25.0, 6.25, 0.5),
            m if m.contains("haiku-4-5") => (1.0, 5.0, 1.25, 0.1),
            _ => (3.0, 15.0, 3.75, 0.3),
        };

        let per_million = |tokens: u32, rate: f64| tokens as f64 / 1_000_000.0 * rate;

        per_million(usage.prompt_tokens, input_rate)
            + per_million(usage.completion_tokens, output_rate)
            + per_million(usage.cache_creation_tokens, cache_write_rate)
            + per_million(usage.cache_read_tokens, cache_read_rate)
    }
}

/// Shared usage tracker with an optional global token cap.
pub struct UsageTracker {
    budget: Option<TokenBudget>,
    usage: RwLock<LlmUsage>,
}

impl UsageTracker {
    /// Track usage without a cap.
    pub fn unlimited() -> Self {
        Self {
            budget: None,
            usage: RwLock::new(LlmUsage::default()),
        }
    }

    /// Track usage and refuse calls beyond `max_tokens`.
    pub fn with_budget(max_tokens: u32) -> Self {
        Self {
            budget: Some(TokenBudget::new(max_tokens)),
            usage: RwLock::new(LlmUsage::default()),
        }
    }

    pub fn from_limit(max_tokens: Option<u32>) -> Self {
        max_tokens.map_or_else(Self::unlimited, Self::with_budget)
    }

    /// Hold `tokens` of budget for a call about to be made.
    ///
    /// Returns false when the call does not fit. A successful reservation
    /// must be given back with [`release`](Self::release) once the call ends.
    pub fn try_reserve(&self, tokens: u32) -> bool {
        self.budget
            .as_ref()
            .map_or(true, |budget| budget.try_reserve(tokens))
    }

    pub fn release(&self, tokens: u32) {
        if let Some(budget) = &self.budget {
            budget.release(tokens);
        }
    }

    /// Record usage after a call.
    pub fn record_usage(&self, usage: &TokenUsage, model: &str) {
        if let Some(budget) = &self.budget {
            budget.record(usage.total());
        }
        self.usage.write().add(usage, model);
    }

    /// Snapshot of usage so far.
    pub fn get_usage(&self) -> LlmUsage {
        self.usage.read().clone()
    }

    /// Remaining budget, if capped.
    pub fn remaining(&self) -> Option<u32> {
        self.budget.as_ref().map(TokenBudget::remaining)
    }

    pub fn reset(&self) {
        if let Some(budget) = &self.budget {
            budget.reset();
        }
        *self.usage.write() = LlmUsage::default();
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::unlimited()
    }
}
