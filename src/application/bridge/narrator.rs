use super::error::BridgeError;
use crate::config::defaults::DEFAULT_NARRATION_PROMPT;
use crate::domain::types::ChatMessage;
use crate::infrastructure::model::{ChatCompletionClient, CompletionRequest, ModelError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Restates a raw tool result in conversational language.
#[async_trait]
pub trait NarrationRequester: Send + Sync {
    async fn narrate(&self, raw_result: &str) -> Result<String, BridgeError>;
}

pub struct ModelNarrator {
    client: Arc<dyn ChatCompletionClient>,
    model: String,
    instruction: String,
}

impl ModelNarrator {
    pub fn new(client: Arc<dyn ChatCompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            instruction: DEFAULT_NARRATION_PROMPT.to_string(),
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    fn narration_error(&self, source: ModelError, raw_result: &str) -> BridgeError {
        BridgeError::Narration {
            source,
            raw_result: raw_result.to_string(),
        }
    }
}

#[async_trait]
impl NarrationRequester for ModelNarrator {
    async fn narrate(&self, raw_result: &str) -> Result<String, BridgeError> {
        info!(
            model = self.model.as_str(),
            raw_len = raw_result.len(),
            "Requesting narration of tool result"
        );
        let message = self
            .client
            .complete(CompletionRequest {
                model: self.model.clone(),
                messages: vec![
                    ChatMessage::user(self.instruction.clone()),
                    ChatMessage::assistant(raw_result),
                ],
                tools: Vec::new(),
            })
            .await
            .map_err(|source| self.narration_error(source, raw_result))?;

        message.content.ok_or_else(|| {
            self.narration_error(
                ModelError::invalid_response(self.model.as_str(), "narration reply has no content"),
                raw_result,
            )
        })
    }
}
