//! The oracle boundary.
//!
//! An oracle takes a prompt and returns raw text. It is non-deterministic:
//! two calls with the same prompt may return different text, or one may fail
//! while the other succeeds. Nothing downstream may assume otherwise.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::providers::ProviderError;

mod provider;

pub use provider::ProviderOracle;

/// Errors from a single oracle call.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Circuit open for provider '{0}'")]
    CircuitOpen(String),

    #[error("Token budget exceeded")]
    BudgetExceeded,
}

/// A non-deterministic text generator.
///
/// # Contract
/// - One call, one completion: no retries, no caching
/// - Identical prompts may yield different text on every call
/// - Failures are returned, never swallowed
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate raw text for a prompt.
    async fn invoke(&self, prompt: &str) -> Result<String, OracleError>;

    /// Name used in logs.
    fn name(&self) -> &str;
}
