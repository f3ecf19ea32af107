use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use serde_json::{Value, json};

use crate::application::bridge::{BridgeError, TurnOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "mcp-plan-bridge",
    version,
    about = "Plan with a tool-calling model, execute on MCP servers, narrate the result"
)]
pub struct Cli {
    /// Path to bridge.toml (defaults to config/bridge.toml)
    #[arg(long)]
    pub config: Option<String>,
    /// Override the configured model name
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub prompt_file: Option<String>,
    #[arg(long, value_enum, default_value_t = RunMode::Cli)]
    pub mode: RunMode,
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub rest_addr: SocketAddr,
    #[arg()]
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Cli,
    Stdio,
    Rest,
}

/// JSON printed by `--mode cli` for a completed turn.
pub fn render_outcome(outcome: &TurnOutcome) -> Value {
    json!({
        "turn_id": outcome.turn_id,
        "content": outcome.response,
        "raw_result": outcome.raw_result,
        "tool_steps": outcome.steps,
    })
}

/// JSON printed by `--mode cli` for a failed turn. Carries the un-narrated
/// tool output when narration was the step that failed.
pub fn render_failure(err: &BridgeError) -> Value {
    let mut output = json!({ "error": err.user_message() });
    if let Some(raw) = err.raw_result() {
        output["raw_result"] = Value::String(raw.to_string());
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::model::ModelError;

    #[test]
    fn defaults_to_cli_mode() {
        let cli = Cli::parse_from(["mcp-plan-bridge", "杭州", "天气"]);
        assert_eq!(cli.mode, RunMode::Cli);
        assert_eq!(cli.prompt, vec!["杭州", "天气"]);
        assert_eq!(cli.rest_addr.port(), 8080);
    }

    #[test]
    fn parses_rest_mode_and_overrides() {
        let cli = Cli::parse_from([
            "mcp-plan-bridge",
            "--mode",
            "rest",
            "--rest-addr",
            "0.0.0.0:9000",
            "--model",
            "deepseek-reasoner",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(cli.mode, RunMode::Rest);
        assert_eq!(cli.rest_addr.port(), 9000);
        assert_eq!(cli.model.as_deref(), Some("deepseek-reasoner"));
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn narration_failure_output_keeps_raw_result() {
        let err = BridgeError::Narration {
            source: ModelError::invalid_response("https://api.deepseek.com", "no choices"),
            raw_result: "杭州 2025-06-28 温度为 23 摄氏度！".into(),
        };
        let output = render_failure(&err);
        assert_eq!(output["raw_result"], "杭州 2025-06-28 温度为 23 摄氏度！");
        assert!(output["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn plan_failure_output_has_no_raw_result() {
        let err = BridgeError::MalformedPlan {
            index: 0,
            tool: "getDeepSeekBalance".into(),
            reason: "EOF while parsing".into(),
        };
        let output = render_failure(&err);
        assert!(output.get("raw_result").is_none());
        assert!(output["error"].as_str().is_some_and(|e| e.contains("getDeepSeekBalance")));
    }

    #[test]
    fn outcome_output_lists_steps() {
        let outcome = TurnOutcome {
            turn_id: "t-1".into(),
            response: "余额还有 10 块。".into(),
            raw_result: Some("余额 10.00 CNY".into()),
            steps: Vec::new(),
        };
        let output = render_outcome(&outcome);
        assert_eq!(output["turn_id"], "t-1");
        assert_eq!(output["content"], "余额还有 10 块。");
        assert_eq!(output["raw_result"], "余额 10.00 CNY");
        assert!(output["tool_steps"].as_array().is_some_and(Vec::is_empty));
    }
}
