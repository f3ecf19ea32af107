use crate::application::bridge::{StepRecord, TurnOutcome};
use crate::domain::capability::CapabilityDescriptor;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestChatRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestChatResponse {
    pub turn_id: String,
    pub content: String,
    /// Un-narrated output of the last tool step; absent for direct replies.
    pub raw_result: Option<String>,
    pub tool_steps: Vec<StepRecord>,
}

impl From<TurnOutcome> for RestChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            turn_id: outcome.turn_id,
            content: outcome.response,
            raw_result: outcome.raw_result,
            tool_steps: outcome.steps,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw_result: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolListResponse {
    pub tools: Vec<CapabilityDescriptor>,
}
