use crate::application::tooling::ToolInvokeError;
use crate::infrastructure::model::ModelError;
use thiserror::Error;

/// Failures that end a turn. Individual tool failures are not here: the
/// dispatcher absorbs them and carries on with the next step.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to list capabilities: {0}")]
    CapabilityListing(#[source] ToolInvokeError),
    #[error("plan request failed: {0}")]
    PlanRequest(#[source] ModelError),
    #[error("tool call #{index} ('{tool}') has undecodable arguments: {reason}")]
    MalformedPlan {
        index: u32,
        tool: String,
        reason: String,
    },
    #[error("narration request failed: {source}")]
    Narration {
        #[source]
        source: ModelError,
        raw_result: String,
    },
}

impl BridgeError {
    /// The un-narrated tool output, when the turn got that far.
    pub fn raw_result(&self) -> Option<&str> {
        match self {
            BridgeError::Narration { raw_result, .. } => Some(raw_result.as_str()),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            BridgeError::CapabilityListing(err) => {
                format!("The tool servers could not be reached ({err}).")
            }
            BridgeError::PlanRequest(err) => err.user_message(),
            BridgeError::MalformedPlan { tool, .. } => format!(
                "The model asked for tool '{tool}' with arguments that could not be read. Try rephrasing the request."
            ),
            BridgeError::Narration { source, .. } => source.user_message(),
        }
    }
}
