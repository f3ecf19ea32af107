use super::types::{CompletionMessage, CompletionRequest, ModelError};
use async_trait::async_trait;

/// A chat-completion endpoint that understands tool declarations.
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    /// Send one request and return the first choice's message.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage, ModelError>;
}
