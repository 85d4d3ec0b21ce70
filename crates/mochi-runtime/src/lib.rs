//! # mochi-runtime
//!
//! Async host for the Mochi fact checker.
//!
//! `mochi-core` decides; this crate runs. It provides:
//! - The [`Oracle`] boundary and a provider-backed adapter
//! - The fact-check prompt
//! - The [`ConsensusEngine`]: leader round, concurrent validator rounds,
//!   per-call timeouts
//! - The [`FactChecker`] service and its [`VerdictStore`]
//! - Configuration, circuit breaker and token budget
//!
//! ## Example
//!
//! ```rust,no_run
//! use mochi_runtime::{FactChecker, ProviderRegistry, RuntimeConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RuntimeConfig::from_yaml_file("mochi.yaml")?;
//! let checker = FactChecker::from_config(&config, &ProviderRegistry::with_defaults())?;
//!
//! let verdict = checker.verify_fact("Cats sleep most of the day").await?;
//! println!("{}", verdict);
//! assert_eq!(checker.get_last_verdict(), verdict);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod oracle;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod service;
pub mod store;

pub use config::{ConfigError, ProviderSettings, RuntimeConfig};
pub use engine::{
    ConsensusEngine, ConsensusEngineBuilder, ConsensusReport, RuntimeError, DEFAULT_ORACLE_TIMEOUT,
};
pub use oracle::{Oracle, OracleError, ProviderOracle};
pub use prompts::fact_check_prompt;
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, MessageRole, ProviderError,
    ProviderRegistry, ScriptedProvider, TokenUsage,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, LlmUsage, UsageTracker};
pub use service::{FactChecker, Verification};
pub use store::{InMemoryVerdictStore, VerdictStore};
