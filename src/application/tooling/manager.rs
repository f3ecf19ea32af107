use super::error::ToolInvokeError;
use super::interface::CapabilityProvider;
use super::process::McpProcess;
use crate::config::ServerConfig;
use crate::domain::capability::CapabilityDescriptor;
use crate::domain::plan::CallToolResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Presents several MCP servers as a single capability provider.
///
/// Listing walks the servers in configuration order and remembers which
/// server owns each tool; invocation is routed through that table.
pub struct ServerManager {
    servers: Vec<McpProcess>,
    routes: RwLock<HashMap<String, usize>>,
}

impl ServerManager {
    pub fn new(configs: Vec<ServerConfig>) -> Self {
        Self {
            servers: configs.into_iter().map(McpProcess::new).collect(),
            routes: RwLock::new(HashMap::new()),
        }
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub async fn shutdown(&self) {
        for server in &self.servers {
            server.shutdown().await;
        }
    }

    async fn route(&self, tool: &str) -> Option<&McpProcess> {
        let position = *self.routes.read().await.get(tool)?;
        self.servers.get(position)
    }
}

#[async_trait]
impl CapabilityProvider for ServerManager {
    async fn list_capabilities(&self) -> Result<Vec<CapabilityDescriptor>, ToolInvokeError> {
        let mut descriptors = Vec::new();
        let mut routes = HashMap::new();
        for (position, server) in self.servers.iter().enumerate() {
            for descriptor in server.list_capabilities().await? {
                if routes.contains_key(&descriptor.name) {
                    warn!(
                        server = server.name(),
                        tool = %descriptor.name,
                        "Tool name already provided by an earlier server; ignoring duplicate"
                    );
                    continue;
                }
                routes.insert(descriptor.name.clone(), position);
                descriptors.push(descriptor);
            }
        }
        debug!(
            servers = self.servers.len(),
            tools = descriptors.len(),
            "Capability listing assembled"
        );
        *self.routes.write().await = routes;
        Ok(descriptors)
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, ToolInvokeError> {
        let server = self
            .route(name)
            .await
            .ok_or_else(|| ToolInvokeError::UnknownTool {
                tool: name.to_string(),
            })?;
        debug!(server = server.name(), tool = name, "Routing tool call");
        server.invoke(name, arguments).await
    }
}
