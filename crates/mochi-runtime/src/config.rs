//! Runtime configuration.
//!
//! Loaded from YAML. Every section is optional:
//!
//! ```yaml
//! provider:
//!   type: anthropic
//!   settings:
//!     base_url: https://api.anthropic.com/v1
//! completion:
//!   model: claude-sonnet-4-5-20250514
//!   max_tokens: 500
//!   timeout: 15s
//! consensus:
//!   validators: 1
//!   quorum: 1
//!   confidence_tolerance: 20
//! oracle_timeout: 30s
//! circuit_breaker:
//!   failure_threshold: 3
//!   recovery_timeout: 30s
//! token_budget: 20000
//! ```

use mochi_core::{ConsensusPolicy, PolicyError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::providers::CompletionConfig;
use crate::resilience::CircuitBreakerConfig;

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid consensus policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which provider backs the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Registry key
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Provider-specific settings, passed to the factory as JSON
    pub settings: JsonValue,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_type: "anthropic".to_string(),
            settings: JsonValue::Object(Default::default()),
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub provider: ProviderSettings,

    pub completion: CompletionConfig,

    pub consensus: ConsensusPolicy,

    /// Upper bound on a single oracle call, enforced by the engine
    #[serde(with = "duration_human")]
    pub oracle_timeout: Duration,

    pub circuit_breaker: CircuitBreakerConfig,

    /// Global token cap across all oracle calls
    pub token_budget: Option<u32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            completion: CompletionConfig::default(),
            consensus: ConsensusPolicy::default(),
            oracle_timeout: Duration::from_secs(30),
            circuit_breaker: CircuitBreakerConfig::default(),
            token_budget: None,
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.consensus.validate()?;

        if self.provider.provider_type.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.type must not be empty".to_string()));
        }
        if self.oracle_timeout.is_zero() {
            return Err(ConfigError::Invalid("oracle_timeout must be positive".to_string()));
        }
        if self.completion.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "completion.max_tokens must be positive".to_string(),
            ));
        }
        if !self.provider.settings.is_object() {
            return Err(ConfigError::Invalid(
                "provider.settings must be a mapping".to_string(),
            ));
        }

        Ok(())
    }
}

/// Serde adapter for durations written as "30s", "1m 30s", etc.
pub(crate) mod duration_human {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
