//! Plan → execute → narrate pipeline.

pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod narrator;
pub mod orchestrator;
pub mod planner;

pub use directory::CapabilityDirectory;
pub use dispatcher::{DispatchOutcome, ExecutionDispatcher, SequentialDispatcher, StepRecord};
pub use error::BridgeError;
pub use narrator::{ModelNarrator, NarrationRequester};
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use planner::{ModelPlanner, PlanRequester};

use crate::application::tooling::CapabilityProvider;
use crate::config::AppConfig;
use crate::infrastructure::model::{ChatCompletionClient, OpenAICompatibleClient};
use std::sync::Arc;

/// Wire the default planner, dispatcher and narrator around `provider`.
pub fn build_orchestrator(config: &AppConfig, provider: Arc<dyn CapabilityProvider>) -> Orchestrator {
    let client: Arc<dyn ChatCompletionClient> =
        Arc::new(OpenAICompatibleClient::from_config(&config.planner));
    build_orchestrator_with_client(config, provider, client)
}

/// Same as [`build_orchestrator`] with a caller-supplied model client.
pub fn build_orchestrator_with_client(
    config: &AppConfig,
    provider: Arc<dyn CapabilityProvider>,
    client: Arc<dyn ChatCompletionClient>,
) -> Orchestrator {
    let directory = Arc::new(CapabilityDirectory::new(provider));
    let planner = ModelPlanner::new(client.clone(), config.model.clone());
    let dispatcher = SequentialDispatcher::new(directory.clone()).with_timeout(config.tool_timeout);
    let narrator =
        ModelNarrator::new(client, config.model.clone()).with_instruction(config.narration_prompt.clone());
    Orchestrator::new(
        directory,
        Arc::new(planner),
        Arc::new(dispatcher),
        Arc::new(narrator),
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::application::tooling::{CapabilityProvider, ToolInvokeError};
    use crate::domain::capability::CapabilityDescriptor;
    use crate::domain::plan::CallToolResult;
    use crate::infrastructure::model::{
        ChatCompletionClient, CompletionMessage, CompletionRequest, ModelError,
    };
    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Replays canned completion messages in order and records every request.
    #[derive(Clone, Default)]
    pub struct ScriptedClient {
        responses: Arc<Mutex<VecDeque<CompletionMessage>>>,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    impl ScriptedClient {
        pub fn new(responses: Vec<CompletionMessage>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into())),
                requests: Arc::default(),
            }
        }

        /// Every call fails.
        pub fn failing() -> Self {
            Self::new(Vec::new())
        }

        pub async fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().await.clone()
        }
    }

    #[async_trait]
    impl ChatCompletionClient for ScriptedClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage, ModelError> {
            self.requests.lock().await.push(request);
            self.responses
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| ModelError::invalid_response("scripted", "script exhausted"))
        }
    }

    /// In-memory capability provider with per-tool canned results.
    #[derive(Clone, Default)]
    pub struct ScriptedProvider {
        tools: Vec<(String, Result<CallToolResult, String>)>,
        calls: Arc<Mutex<Vec<String>>>,
        arguments: Arc<Mutex<Vec<Map<String, Value>>>>,
        delay: Option<Duration>,
        fail_listing: bool,
    }

    impl ScriptedProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_tool(
            mut self,
            name: &str,
            result: Result<CallToolResult, ToolInvokeError>,
        ) -> Self {
            self.tools
                .push((name.to_string(), result.map_err(|err| err.to_string())));
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn failing_listing(mut self) -> Self {
            self.fail_listing = true;
            self
        }

        pub async fn calls(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }

        pub async fn arguments(&self) -> Vec<Map<String, Value>> {
            self.arguments.lock().await.clone()
        }
    }

    #[async_trait]
    impl CapabilityProvider for ScriptedProvider {
        async fn list_capabilities(&self) -> Result<Vec<CapabilityDescriptor>, ToolInvokeError> {
            if self.fail_listing {
                return Err(ToolInvokeError::Terminated {
                    server: "scripted".into(),
                });
            }
            Ok(self
                .tools
                .iter()
                .map(|(name, _)| {
                    CapabilityDescriptor::new(
                        name.clone(),
                        format!("scripted {name}"),
                        json!({ "type": "object", "properties": {} }),
                    )
                })
                .collect())
        }

        async fn invoke(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> Result<CallToolResult, ToolInvokeError> {
            self.calls.lock().await.push(name.to_string());
            self.arguments.lock().await.push(arguments);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.tools.iter().find(|(tool, _)| tool == name) {
                Some((_, Ok(result))) => Ok(result.clone()),
                Some((_, Err(message))) => Err(ToolInvokeError::Transport {
                    server: "scripted".into(),
                    message: message.clone(),
                }),
                None => Err(ToolInvokeError::UnknownTool {
                    tool: name.to_string(),
                }),
            }
        }
    }
}
