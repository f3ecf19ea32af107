//! Model types - Request, Response, and Error types

use crate::domain::capability::ToolDirective;
use crate::domain::plan::RawToolCall;
use crate::domain::types::ChatMessage;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Empty means no `tools` field is sent.
    pub tools: Vec<ToolDirective>,
}

/// `choices[0].message` of a chat-completion response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionMessage {
    pub content: Option<String>,
    pub tool_calls: Vec<RawToolCall>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("network error calling '{endpoint}': {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("'{endpoint}' returned invalid response: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl ModelError {
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn invalid_response(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ModelError::Network { endpoint, source } => {
                if source.is_connect() {
                    format!("Cannot reach the planning model at '{endpoint}'.")
                } else if source.is_timeout() {
                    format!("The planning model at '{endpoint}' did not answer in time.")
                } else if source.is_decode() {
                    format!("The planning model at '{endpoint}' sent a response that could not be read.")
                } else if let Some(status) = source.status() {
                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => format!(
                            "The planning model at '{endpoint}' rejected the API key."
                        ),
                        StatusCode::NOT_FOUND => {
                            format!("Chat endpoint '{endpoint}' was not found (404).")
                        }
                        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                            format!("The planning model at '{endpoint}' is unavailable right now.")
                        }
                        _ => format!(
                            "Request to '{endpoint}' failed with status {}.",
                            status.as_u16()
                        ),
                    }
                } else {
                    format!("Network error while calling '{endpoint}'.")
                }
            }
            ModelError::InvalidResponse { endpoint, .. } => {
                format!("The planning model at '{endpoint}' returned an unusable response.")
            }
        }
    }
}
