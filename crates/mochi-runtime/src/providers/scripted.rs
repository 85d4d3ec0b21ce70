//! Offline provider that replays canned completions.
//!
//! Useful for demos, smoke tests and reproducing a disagreement without a
//! network. Responses are served in order and wrap around; a `null` entry
//! simulates a transport failure.
//!
//! ```yaml
//! provider:
//!   type: scripted
//!   settings:
//!     responses:
//!       - '{"verdict":"true","confidence":90,"explanation":"Yes."}'
//!       - null
//! ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{
    factory::ProviderFactory, ChatMessage, CompletionConfig, CompletionResponse, LlmProvider,
    ProviderError, TokenUsage,
};

/// Replays a fixed list of completions.
#[derive(Debug)]
pub struct ScriptedProvider {
    responses: Vec<Option<String>>,
    cursor: AtomicUsize,
}

impl ScriptedProvider {
    /// `None` entries fail with an HTTP error.
    pub fn new(responses: Vec<Option<String>>) -> Self {
        Self {
            responses,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Every call succeeds with the given texts, in order.
    pub fn replying<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(responses.into_iter().map(|r| Some(r.into())).collect())
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    fn from_settings(settings: &JsonValue) -> Result<Self, ProviderError> {
        let entries = settings["responses"].as_array().ok_or_else(|| {
            ProviderError::NotConfigured("scripted provider requires a 'responses' list".to_string())
        })?;

        if entries.is_empty() {
            return Err(ProviderError::NotConfigured(
                "scripted provider 'responses' must not be empty".to_string(),
            ));
        }

        let responses = entries
            .iter()
            .map(|entry| match entry {
                JsonValue::Null => Ok(None),
                JsonValue::String(text) => Ok(Some(text.clone())),
                other => Err(ProviderError::NotConfigured(format!(
                    "scripted response must be a string or null, got {}",
                    other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(responses))
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        if self.responses.is_empty() {
            return Err(ProviderError::NotConfigured(
                "scripted provider has no responses".to_string(),
            ));
        }

        let turn = self.cursor.fetch_add(1, Ordering::SeqCst);
        let Some(content) = self.responses[turn % self.responses.len()].clone() else {
            return Err(ProviderError::HttpError(format!(
                "scripted failure on call {}",
                turn + 1
            )));
        };

        let prompt_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        Ok(CompletionResponse {
            usage: TokenUsage {
                prompt_tokens: (prompt_chars / 4) as u32,
                completion_tokens: (content.len() / 4) as u32,
                ..Default::default()
            },
            content,
            model: config.model.clone(),
            stop_reason: Some("end_turn".to_string()),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Factory for [`ScriptedProvider`].
pub struct ScriptedProviderFactory;

impl ProviderFactory for ScriptedProviderFactory {
    fn provider_type(&self) -> &'static str {
        "scripted"
    }

    fn create(&self, settings: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(ScriptedProvider::from_settings(settings)?))
    }

    fn validate_config(&self, settings: &JsonValue) -> Result<(), ProviderError> {
        ScriptedProvider::from_settings(settings).map(|_| ())
    }

    fn description(&self) -> &'static str {
        "Replays canned completions from the config file (offline)"
    }
}
