//! OpenAI-compatible chat-completion client (DeepSeek, OpenAI, vLLM, Ollama's /v1 shim, ...)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::PlannerConfig;
use crate::domain::capability::ToolDirective;
use crate::domain::plan::RawToolCall;
use crate::domain::types::ChatMessage;
use crate::infrastructure::model::traits::ChatCompletionClient;
use crate::infrastructure::model::types::{CompletionMessage, CompletionRequest, ModelError};

#[derive(Clone)]
pub struct OpenAICompatibleClient {
    base: HttpClientBase,
    api_path: String,
}

impl OpenAICompatibleClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_path: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base: HttpClientBase::new(endpoint.into(), api_key, timeout),
            api_path: api_path.into(),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.api_path.clone(),
            config.resolve_api_key(),
            config.timeout,
        )
    }

    pub fn url(&self) -> String {
        self.base.build_url(&self.api_path)
    }
}

#[async_trait]
impl ChatCompletionClient for OpenAICompatibleClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage, ModelError> {
        let url = self.url();
        let payload = OpenAIRequest {
            model: &request.model,
            messages: &request.messages,
            tools: (!request.tools.is_empty()).then_some(request.tools.as_slice()),
            stream: false,
        };

        info!(
            url = %url,
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat-completion request"
        );

        let response: OpenAIResponse = self.base.post_json(&url, &payload).await?;
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::invalid_response(&self.base.endpoint, "missing choices[0]"))?
            .message
            .ok_or_else(|| {
                ModelError::invalid_response(&self.base.endpoint, "missing choices[0].message")
            })?;

        let tool_calls = message.tool_calls.unwrap_or_default();
        debug!(
            has_content = message.content.is_some(),
            tool_calls = tool_calls.len(),
            "Received chat-completion response"
        );

        Ok(CompletionMessage {
            content: message.content,
            tool_calls,
        })
    }
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDirective]>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<RawToolCall>>,
}
