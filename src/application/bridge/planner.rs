use super::error::BridgeError;
use crate::domain::capability::ToolDirective;
use crate::domain::plan::{ExecutionStep, Plan, RawToolCall};
use crate::domain::types::ChatMessage;
use crate::infrastructure::model::{ChatCompletionClient, CompletionRequest};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns an instruction plus the advertised tools into an ordered plan.
#[async_trait]
pub trait PlanRequester: Send + Sync {
    async fn request_plan(
        &self,
        instruction: &str,
        directory: &[ToolDirective],
    ) -> Result<Plan, BridgeError>;
}

pub struct ModelPlanner {
    client: Arc<dyn ChatCompletionClient>,
    model: String,
}

impl ModelPlanner {
    pub fn new(client: Arc<dyn ChatCompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl PlanRequester for ModelPlanner {
    async fn request_plan(
        &self,
        instruction: &str,
        directory: &[ToolDirective],
    ) -> Result<Plan, BridgeError> {
        info!(
            model = self.model.as_str(),
            tools = directory.len(),
            "Requesting execution plan"
        );
        let message = self
            .client
            .complete(CompletionRequest {
                model: self.model.clone(),
                messages: vec![ChatMessage::user(instruction)],
                tools: directory.to_vec(),
            })
            .await
            .map_err(BridgeError::PlanRequest)?;

        if message.tool_calls.is_empty() {
            debug!("Model answered without requesting tools");
            return Ok(Plan {
                steps: Vec::new(),
                direct_reply: message.content,
            });
        }

        let steps = normalize(message.tool_calls)?;
        info!(steps = steps.len(), "Execution plan received");
        Ok(Plan {
            steps,
            direct_reply: None,
        })
    }
}

/// Decode every raw tool call and order the result by the model's `index`.
///
/// A call without an `index` takes its array position. Any undecodable
/// argument payload rejects the whole plan.
pub fn normalize(calls: Vec<RawToolCall>) -> Result<Vec<ExecutionStep>, BridgeError> {
    let mut steps = calls
        .into_iter()
        .enumerate()
        .map(|(position, call)| {
            let index = call.index.unwrap_or(position as u32);
            let name = call.function.name;
            match call.function.arguments.decode() {
                Ok(arguments) => Ok(ExecutionStep {
                    index,
                    name,
                    arguments,
                }),
                Err(reason) => Err(BridgeError::MalformedPlan {
                    index,
                    tool: name,
                    reason,
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    steps.sort_by_key(|step| step.index);

    let mut seen = HashSet::with_capacity(steps.len());
    for step in &steps {
        if !seen.insert(step.index) {
            warn!(
                index = step.index,
                tool = %step.name,
                "Duplicate tool-call index; keeping response order for ties"
            );
        }
    }
    Ok(steps)
}
