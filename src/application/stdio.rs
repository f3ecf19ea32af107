use crate::application::bridge::{Orchestrator, StepRecord, TurnOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize stdio response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct StdioChatRequest {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct StdioChatResponse {
    turn_id: Option<String>,
    content: Option<String>,
    raw_result: Option<String>,
    error: Option<String>,
    tool_steps: Vec<StepRecord>,
}

impl StdioChatResponse {
    fn success(outcome: TurnOutcome) -> Self {
        Self {
            turn_id: Some(outcome.turn_id),
            content: Some(outcome.response),
            raw_result: outcome.raw_result,
            error: None,
            tool_steps: outcome.steps,
        }
    }

    fn error(message: impl Into<String>, raw_result: Option<String>) -> Self {
        Self {
            turn_id: None,
            content: None,
            raw_result,
            error: Some(message.into()),
            tool_steps: Vec::new(),
        }
    }
}

/// Serve JSON-lines requests from stdin until EOF.
pub async fn run(orchestrator: Arc<Orchestrator>) -> Result<(), StdioError> {
    serve(orchestrator, BufReader::new(io::stdin()), io::stdout()).await
}

/// One `{"prompt": ...}` object per input line, one response object per output line.
pub async fn serve<R, W>(orchestrator: Arc<Orchestrator>, input: R, mut output: W) -> Result<(), StdioError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received STDIO line");

        let response = match serde_json::from_str::<StdioChatRequest>(&line) {
            Ok(request) if request.prompt.trim().is_empty() => {
                StdioChatResponse::error("prompt cannot be empty", None)
            }
            Ok(request) => {
                info!("Processing STDIO request");
                match orchestrator.handle_turn(request.prompt.trim()).await {
                    Ok(outcome) => StdioChatResponse::success(outcome),
                    Err(err) => {
                        error!(%err, "STDIO request failed");
                        StdioChatResponse::error(
                            err.user_message(),
                            err.raw_result().map(str::to_string),
                        )
                    }
                }
            }
            Err(err) => {
                error!(%err, "Failed to parse STDIO input line");
                StdioChatResponse::error(format!("invalid input JSON: {err}"), None)
            }
        };
        write_response(&mut output, &response).await?;
    }

    output.flush().await?;
    Ok(())
}

async fn write_response<W>(output: &mut W, response: &StdioChatResponse) -> Result<(), StdioError>
where
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_vec(response)?;
    payload.push(b'\n');
    output.write_all(&payload).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bridge::build_orchestrator_with_client;
    use crate::application::bridge::testing::{ScriptedClient, ScriptedProvider};
    use crate::config::AppConfig;
    use crate::domain::plan::CallToolResult;
    use crate::infrastructure::model::CompletionMessage;
    use serde_json::Value;

    async fn run_lines(client: ScriptedClient, input: &str) -> Vec<Value> {
        let provider = ScriptedProvider::new().with_tool("echo", Ok(CallToolResult::text("x")));
        let orchestrator = Arc::new(build_orchestrator_with_client(
            &AppConfig::default(),
            Arc::new(provider),
            Arc::new(client),
        ));
        let mut output = Vec::new();
        serve(orchestrator, input.as_bytes(), &mut output)
            .await
            .expect("serve");
        String::from_utf8(output)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn direct_reply_is_written_as_one_line() {
        let client = ScriptedClient::new(vec![CompletionMessage {
            content: Some("hello".into()),
            tool_calls: Vec::new(),
        }]);
        let responses = run_lines(client, "{\"prompt\":\"hi\"}\n\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["content"], "hello");
        assert!(responses[0]["error"].is_null());
        assert!(responses[0]["turn_id"].is_string());
    }

    #[tokio::test]
    async fn bad_lines_get_error_responses_and_loop_continues() {
        let client = ScriptedClient::new(vec![CompletionMessage {
            content: Some("second".into()),
            tool_calls: Vec::new(),
        }]);
        let input = "not json\n{\"prompt\":\"   \"}\n{\"prompt\":\"again\"}\n";
        let responses = run_lines(client, input).await;
        assert_eq!(responses.len(), 3);
        assert!(responses[0]["error"].as_str().is_some_and(|e| e.contains("invalid input JSON")));
        assert_eq!(responses[1]["error"], "prompt cannot be empty");
        assert_eq!(responses[2]["content"], "second");
    }
}
