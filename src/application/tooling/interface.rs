use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::ToolInvokeError;
use crate::domain::capability::CapabilityDescriptor;
use crate::domain::plan::CallToolResult;

/// The RPC channel to whatever serves the capabilities.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn list_capabilities(&self) -> Result<Vec<CapabilityDescriptor>, ToolInvokeError>;

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, ToolInvokeError>;
}
