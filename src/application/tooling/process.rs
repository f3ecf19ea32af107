//! JSON-RPC client for one MCP server spoken to over the child's stdin/stdout.

use super::error::ToolInvokeError;
use super::interface::CapabilityProvider;
use crate::config::ServerConfig;
use crate::domain::capability::CapabilityDescriptor;
use crate::domain::plan::CallToolResult;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2025-06-18";

type PendingReply = oneshot::Sender<Result<Value, ToolInvokeError>>;
type PendingMap = HashMap<String, PendingReply>;

/// Lazily spawned MCP server. The child is started on first use and restarted
/// on the next call after it exits.
#[derive(Clone)]
pub struct McpProcess {
    inner: Arc<McpProcessInner>,
}

struct McpProcessInner {
    server: ServerConfig,
    /// Held across spawn and handshake so concurrent callers see a ready server.
    startup: AsyncMutex<()>,
    state: AsyncMutex<Option<RunningState>>,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    pending: Mutex<PendingMap>,
    id_counter: AtomicU64,
    generation: AtomicU64,
    tool_cache: AsyncMutex<Vec<CapabilityDescriptor>>,
}

struct RunningState {
    child: Child,
    /// Tags the reader task spawned for this child.
    generation: u64,
}

/// Drops the pending entry when the awaiting call goes away, including when
/// a caller-side timeout cancels it.
struct PendingGuard<'a> {
    pending: &'a Mutex<PendingMap>,
    id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.id);
    }
}

impl McpProcess {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            inner: Arc::new(McpProcessInner {
                server,
                startup: AsyncMutex::new(()),
                state: AsyncMutex::new(None),
                writer: AsyncMutex::new(None),
                pending: Mutex::new(HashMap::new()),
                id_counter: AtomicU64::new(1),
                generation: AtomicU64::new(0),
                tool_cache: AsyncMutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.server.name
    }

    pub async fn ensure_running(&self) -> Result<(), ToolInvokeError> {
        self.inner.ensure_running().await
    }

    /// Stop the child process and fail anything still in flight.
    pub async fn shutdown(&self) {
        info!(server = %self.inner.server.name, "Shutting down MCP server");
        self.inner.reset().await;
    }
}

#[async_trait]
impl CapabilityProvider for McpProcess {
    async fn list_capabilities(&self) -> Result<Vec<CapabilityDescriptor>, ToolInvokeError> {
        self.ensure_running().await?;
        Ok(self.inner.tool_cache.lock().await.clone())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, ToolInvokeError> {
        self.ensure_running().await?;
        self.inner.call_tool(name, arguments).await
    }
}

impl McpProcessInner {
    async fn ensure_running(self: &Arc<Self>) -> Result<(), ToolInvokeError> {
        let _startup = self.startup.lock().await;
        let mut state = self.state.lock().await;
        if state.is_some() {
            return Ok(());
        }

        let mut command = Command::new(&self.server.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.server.workdir {
            command.current_dir(dir);
        }
        if !self.server.args.is_empty() {
            command.args(&self.server.args);
        }
        for (key, value) in &self.server.env {
            command.env(key, value);
        }

        debug!(
            server = %self.server.name,
            command = %self.server.command.display(),
            "Spawning MCP server"
        );
        let mut child = command.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: self.server.name.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdout"))?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.writer.lock().await = Some(BufWriter::new(stdin));
        *state = Some(RunningState { child, generation });
        drop(state);

        let reader_self = Arc::clone(self);
        tokio::spawn(async move {
            reader_self.reader_loop(stdout, generation).await;
        });

        match self.initialize_sequence().await {
            Ok(()) => {
                info!(server = %self.server.name, "MCP server initialized");
                Ok(())
            }
            Err(err) => {
                self.reset().await;
                Err(err)
            }
        }
    }

    async fn initialize_sequence(&self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let init_result = self.send_request("initialize", params).await?;
        debug!(
            server = %self.server.name,
            protocol = init_result.get("protocolVersion").and_then(serde_json::Value::as_str),
            "Received initialize result"
        );
        self.send_notification("notifications/initialized", json!({}))
            .await?;

        self.refresh_tools().await
    }

    async fn call_tool(
        &self,
        tool: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, ToolInvokeError> {
        let params = json!({
            "name": tool,
            "arguments": Value::Object(arguments),
        });
        let result = self.send_request("tools/call", params).await?;
        serde_json::from_value(result).map_err(|source| ToolInvokeError::InvalidJson {
            server: self.server.name.clone(),
            source,
        })
    }

    async fn refresh_tools(&self) -> Result<(), ToolInvokeError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.send_request("tools/list", params).await?;
            tools.extend(self.parse_tool_listing(&result)?);
            cursor = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }

        debug!(server = %self.server.name, count = tools.len(), "Tool catalogue refreshed");
        *self.tool_cache.lock().await = tools;
        Ok(())
    }

    fn parse_tool_listing(&self, result: &Value) -> Result<Vec<CapabilityDescriptor>, ToolInvokeError> {
        let Some(array) = result.get("tools") else {
            return Err(self.transport_error("tools/list result has no 'tools' field"));
        };
        serde_json::from_value(array.clone()).map_err(|source| ToolInvokeError::InvalidJson {
            server: self.server.name.clone(),
            source,
        })
    }

    async fn reader_loop(self: Arc<Self>, stdout: ChildStdout, generation: u64) {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(raw)) = lines.next_line().await {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => {
                    if let Err(err) = self.process_inbound_message(value).await {
                        warn!(
                            server = %self.server.name,
                            %err,
                            "failed to process message from MCP server"
                        );
                    }
                }
                Err(source) => {
                    // Servers built on logging frameworks sometimes print banners to stdout.
                    debug!(
                        server = %self.server.name,
                        line = trimmed,
                        %source,
                        "skipping non-JSON line from MCP server"
                    );
                }
            }
        }

        self.reset_matching(Some(generation)).await;
    }

    async fn process_inbound_message(self: &Arc<Self>, value: Value) -> Result<(), ToolInvokeError> {
        match (value.get("id").cloned(), value.get("method").is_some()) {
            (Some(id), true) => self.handle_server_request(id, value).await,
            (Some(id), false) => self.handle_response(id, value).await,
            (None, true) => {
                self.handle_notification(value);
                Ok(())
            }
            (None, false) => Ok(()),
        }
    }

    async fn handle_response(&self, id: Value, value: Value) -> Result<(), ToolInvokeError> {
        let Some(key) = response_key(&id) else {
            return Ok(());
        };

        let responder = lock_pending(&self.pending).remove(&key);
        let Some(sender) = responder else {
            debug!(
                server = %self.server.name,
                response_id = key,
                "received response for unknown request"
            );
            return Ok(());
        };

        let outcome = match value.get("error") {
            Some(error) => Err(self.rpc_error(error)),
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = sender.send(outcome);
        Ok(())
    }

    fn rpc_error(&self, error: &Value) -> ToolInvokeError {
        match error.as_object() {
            Some(err) => ToolInvokeError::Rpc {
                server: self.server.name.clone(),
                code: err.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            },
            None => self.transport_error("missing error payload in response"),
        }
    }

    async fn handle_server_request(&self, id: Value, value: Value) -> Result<(), ToolInvokeError> {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if method == "ping" {
            return self.send_reply(id, "result", json!({})).await;
        }

        warn!(
            server = %self.server.name,
            method,
            "server sent unsupported request"
        );
        let error = json!({
            "code": -32601,
            "message": format!("client does not implement method '{method}'"),
        });
        self.send_reply(id, "error", error).await
    }

    fn handle_notification(self: &Arc<Self>, value: Value) {
        let Some(method) = value.get("method").and_then(Value::as_str) else {
            return;
        };
        debug!(
            server = %self.server.name,
            method,
            "received notification from server"
        );
        if method == "notifications/tools/list_changed" {
            // The refresh awaits a response that this reader task must deliver.
            let this = Arc::clone(self);
            tokio::spawn(async move {
                if let Err(err) = this.refresh_tools().await {
                    warn!(
                        server = %this.server.name,
                        %err,
                        "failed to refresh tool catalogue"
                    );
                }
            });
        }
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        lock_pending(&self.pending).insert(id.clone(), tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            id: id.clone(),
        };

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        self.write_message(&payload).await?;

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.server.name.clone(),
            }),
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        self.write_message(&payload).await
    }

    async fn send_reply(&self, id: Value, field: &str, body: Value) -> Result<(), ToolInvokeError> {
        let mut payload = Map::new();
        payload.insert("jsonrpc".to_string(), Value::String("2.0".to_string()));
        payload.insert("id".to_string(), id);
        payload.insert(field.to_string(), body);
        self.write_message(&Value::Object(payload)).await
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolInvokeError> {
        let mut encoded =
            serde_json::to_vec(message).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.name.clone(),
                source,
            })?;
        encoded.push(b'\n');

        let mut writer = self.writer.lock().await;
        let stream = writer
            .as_mut()
            .ok_or_else(|| self.transport_error("writer not initialised"))?;
        stream
            .write_all(&encoded)
            .await
            .map_err(|source| self.transport_error(source.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|source| self.transport_error(source.to_string()))
    }

    async fn reset(&self) {
        self.reset_matching(None).await;
    }

    /// With `Some(generation)`, only reset while that child is still the
    /// current one; a reader outliving its child must not tear down a newer one.
    async fn reset_matching(&self, generation: Option<u64>) {
        let running = {
            let mut state = self.state.lock().await;
            if let Some(generation) = generation {
                match state.as_ref() {
                    Some(current) if current.generation == generation => {}
                    _ => {
                        debug!(
                            server = %self.server.name,
                            generation,
                            "stale reader finished; leaving current process alone"
                        );
                        return;
                    }
                }
            }
            state.take()
        };
        self.writer.lock().await.take();

        if let Some(mut running) = running {
            if let Err(err) = running.child.kill().await {
                debug!(
                    server = %self.server.name,
                    %err,
                    "failed to kill MCP server process (may have already exited)"
                );
            }
        }

        self.fail_all_pending();
        self.tool_cache.lock().await.clear();
    }

    fn fail_all_pending(&self) {
        let drained: Vec<_> = lock_pending(&self.pending).drain().collect();
        for (_, sender) in drained {
            let _ = sender.send(Err(ToolInvokeError::Terminated {
                server: self.server.name.clone(),
            }));
        }
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: self.server.name.clone(),
            message: message.into(),
        }
    }
}

fn lock_pending(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}
