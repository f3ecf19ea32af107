use super::directory::CapabilityDirectory;
use crate::application::tooling::ToolInvokeError;
use crate::domain::plan::{CallToolResult, ExecutionStep, ToolInvocationResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Runs a plan against the capability provider.
#[async_trait]
pub trait ExecutionDispatcher: Send + Sync {
    async fn execute(&self, steps: Vec<ExecutionStep>) -> DispatchOutcome;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    /// Text of the last step processed; empty when that step failed.
    pub raw_result: String,
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StepRecord {
    pub index: u32,
    pub tool: String,
    #[schema(value_type = Object)]
    pub arguments: Value,
    pub success: bool,
    pub message: Option<String>,
}

/// Invokes steps one at a time in ascending `index` order.
///
/// Each step's text replaces the previous step's, so only the final step's
/// output reaches narration. A failed step contributes nothing and does not
/// stop the plan.
pub struct SequentialDispatcher {
    directory: Arc<CapabilityDirectory>,
    timeout: Option<Duration>,
}

impl SequentialDispatcher {
    pub fn new(directory: Arc<CapabilityDirectory>) -> Self {
        Self {
            directory,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    async fn invoke_step(&self, step: &ExecutionStep) -> Result<CallToolResult, ToolInvokeError> {
        let known = self.directory.contains(&step.name).await.unwrap_or(false);
        if !known {
            return Err(ToolInvokeError::UnknownTool {
                tool: step.name.clone(),
            });
        }

        let call = self
            .directory
            .provider()
            .invoke(&step.name, step.arguments.clone());
        match self.timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| ToolInvokeError::Timeout {
                    tool: step.name.clone(),
                    after,
                })?,
            None => call.await,
        }
    }
}

#[async_trait]
impl ExecutionDispatcher for SequentialDispatcher {
    async fn execute(&self, mut steps: Vec<ExecutionStep>) -> DispatchOutcome {
        steps.sort_by_key(|step| step.index);
        info!(steps = steps.len(), "Executing plan");

        let mut outcome = DispatchOutcome::default();
        for step in steps {
            debug!(index = step.index, tool = %step.name, "Invoking capability");
            let (result, message) = match self.invoke_step(&step).await {
                Ok(call) if !call.is_error => (ToolInvocationResult::succeeded(call.joined_text()), None),
                Ok(call) => {
                    let detail = call.joined_text();
                    warn!(index = step.index, tool = %step.name, error = %detail, "Tool reported an error");
                    (ToolInvocationResult::failed(), Some(detail))
                }
                Err(err) => {
                    warn!(index = step.index, tool = %step.name, %err, "Tool invocation failed");
                    (ToolInvocationResult::failed(), Some(err.to_string()))
                }
            };

            outcome.raw_result = result.text_content.clone().unwrap_or_default();
            outcome.steps.push(StepRecord {
                index: step.index,
                tool: step.name,
                arguments: Value::Object(step.arguments),
                success: result.success,
                message,
            });
        }

        debug!(
            raw_len = outcome.raw_result.len(),
            "Plan execution finished"
        );
        outcome
    }
}
