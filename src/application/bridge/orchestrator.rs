use super::directory::CapabilityDirectory;
use super::dispatcher::{ExecutionDispatcher, StepRecord};
use super::error::BridgeError;
use super::narrator::NarrationRequester;
use super::planner::PlanRequester;
use serde::Serialize;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

/// Everything a front end may want to show about one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub turn_id: String,
    pub response: String,
    /// `None` when the model answered without tools.
    pub raw_result: Option<String>,
    pub steps: Vec<StepRecord>,
}

/// Runs the plan → execute → narrate pipeline for one instruction at a time.
pub struct Orchestrator {
    directory: Arc<CapabilityDirectory>,
    planner: Arc<dyn PlanRequester>,
    dispatcher: Arc<dyn ExecutionDispatcher>,
    narrator: Arc<dyn NarrationRequester>,
}

impl Orchestrator {
    pub fn new(
        directory: Arc<CapabilityDirectory>,
        planner: Arc<dyn PlanRequester>,
        dispatcher: Arc<dyn ExecutionDispatcher>,
        narrator: Arc<dyn NarrationRequester>,
    ) -> Self {
        Self {
            directory,
            planner,
            dispatcher,
            narrator,
        }
    }

    pub fn directory(&self) -> &Arc<CapabilityDirectory> {
        &self.directory
    }

    /// Populate the capability directory up front so a broken provider fails
    /// at startup rather than on the first turn.
    pub async fn start(&self) -> Result<usize, BridgeError> {
        Ok(self.directory.list().await?.len())
    }

    pub async fn handle(&self, instruction: &str) -> Result<String, BridgeError> {
        Ok(self.handle_turn(instruction).await?.response)
    }

    pub async fn handle_turn(&self, instruction: &str) -> Result<TurnOutcome, BridgeError> {
        let turn_id = Uuid::new_v4().to_string();
        let span = info_span!("turn", turn_id = turn_id.as_str());
        let result = self.run_turn(turn_id.clone(), instruction).instrument(span).await;
        if let Err(err) = &result {
            error!(turn_id = turn_id.as_str(), %err, "Turn failed");
        }
        result
    }

    async fn run_turn(&self, turn_id: String, instruction: &str) -> Result<TurnOutcome, BridgeError> {
        info!("Turn started");
        let directory = self.directory.envelope().await?;
        let plan = self.planner.request_plan(instruction, &directory).await?;

        if plan.is_empty() {
            info!("No tools required; returning the model's direct reply");
            return Ok(TurnOutcome {
                turn_id,
                response: plan.direct_reply.unwrap_or_default(),
                raw_result: None,
                steps: Vec::new(),
            });
        }

        let dispatch = self.dispatcher.execute(plan.steps).await;
        let response = self.narrator.narrate(&dispatch.raw_result).await?;
        info!(steps = dispatch.steps.len(), "Turn completed");

        Ok(TurnOutcome {
            turn_id,
            response,
            raw_result: Some(dispatch.raw_result),
            steps: dispatch.steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bridge::dispatcher::SequentialDispatcher;
    use crate::application::bridge::narrator::ModelNarrator;
    use crate::application::bridge::planner::ModelPlanner;
    use crate::application::bridge::testing::{ScriptedClient, ScriptedProvider};
    use crate::domain::plan::{CallToolResult, RawArguments, RawFunctionCall, RawToolCall};
    use crate::infrastructure::model::CompletionMessage;

    fn orchestrator(client: ScriptedClient, provider: ScriptedProvider) -> Orchestrator {
        let client = Arc::new(client);
        let directory = Arc::new(CapabilityDirectory::new(Arc::new(provider)));
        Orchestrator::new(
            directory.clone(),
            Arc::new(ModelPlanner::new(client.clone(), "deepseek-chat")),
            Arc::new(SequentialDispatcher::new(directory)),
            Arc::new(ModelNarrator::new(client, "deepseek-chat")),
        )
    }

    fn tool_call(index: u32, name: &str, arguments: &str) -> RawToolCall {
        RawToolCall {
            id: None,
            kind: Some("function".into()),
            index: Some(index),
            function: RawFunctionCall {
                name: name.into(),
                arguments: RawArguments::Encoded(arguments.into()),
            },
        }
    }

    fn reply(text: &str) -> CompletionMessage {
        CompletionMessage {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    #[tokio::test]
    async fn weather_question_is_planned_executed_and_narrated() {
        let client = ScriptedClient::new(vec![
            CompletionMessage {
                content: None,
                tool_calls: vec![tool_call(
                    0,
                    "getWeatherByCityNameAndDate",
                    r#"{"cityName":"杭州","date":"2025-06-28"}"#,
                )],
            },
            reply("杭州 6 月 28 号 23 度，天气不错。"),
        ]);
        let provider = ScriptedProvider::new().with_tool(
            "getWeatherByCityNameAndDate",
            Ok(CallToolResult::text("杭州 2025-06-28 温度为 23 摄氏度！")),
        );
        let bridge = orchestrator(client.clone(), provider.clone());

        let outcome = bridge
            .handle_turn("杭州 2025-06-28 的天气怎么样？")
            .await
            .expect("turn");
        assert_eq!(outcome.response, "杭州 6 月 28 号 23 度，天气不错。");
        assert_eq!(
            outcome.raw_result.as_deref(),
            Some("杭州 2025-06-28 温度为 23 摄氏度！")
        );
        assert_eq!(outcome.steps.len(), 1);
        assert!(outcome.steps[0].success);
        assert!(!outcome.turn_id.is_empty());

        let arguments = provider.arguments().await;
        assert_eq!(arguments[0]["cityName"], "杭州");
        assert_eq!(arguments[0]["date"], "2025-06-28");

        let requests = client.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].function.name, "getWeatherByCityNameAndDate");
        assert_eq!(requests[1].messages[1].content, "杭州 2025-06-28 温度为 23 摄氏度！");
    }

    #[tokio::test]
    async fn steps_follow_model_index_and_only_last_output_is_narrated() {
        let client = ScriptedClient::new(vec![
            CompletionMessage {
                content: None,
                tool_calls: vec![
                    tool_call(1, "getWeatherByCityNameAndDate", r#"{"cityName":"杭州"}"#),
                    tool_call(0, "getDeepSeekBalance", "{}"),
                ],
            },
            reply("done"),
        ]);
        let provider = ScriptedProvider::new()
            .with_tool("getDeepSeekBalance", Ok(CallToolResult::text("balance")))
            .with_tool("getWeatherByCityNameAndDate", Ok(CallToolResult::text("weather")));
        let bridge = orchestrator(client.clone(), provider.clone());

        let outcome = bridge.handle_turn("both please").await.expect("turn");
        assert_eq!(
            provider.calls().await,
            vec!["getDeepSeekBalance", "getWeatherByCityNameAndDate"]
        );
        assert_eq!(outcome.raw_result.as_deref(), Some("weather"));
        assert_eq!(client.requests().await[1].messages[1].content, "weather");
    }

    #[tokio::test]
    async fn all_failing_steps_still_narrate_empty_result() {
        let client = ScriptedClient::new(vec![
            CompletionMessage {
                content: None,
                tool_calls: vec![tool_call(0, "getDeepSeekBalance", "{}")],
            },
            reply("暂时查不到余额。"),
        ]);
        let provider = ScriptedProvider::new()
            .with_tool("getDeepSeekBalance", Ok(CallToolResult::error("upstream 500")));
        let bridge = orchestrator(client.clone(), provider);

        let response = bridge.handle("余额？").await.expect("turn");
        assert_eq!(response, "暂时查不到余额。");
        assert_eq!(client.requests().await[1].messages[1].content, "");
    }

    #[tokio::test]
    async fn empty_plan_short_circuits_without_narration() {
        let client = ScriptedClient::new(vec![CompletionMessage {
            content: Some("Hello there.".into()),
            tool_calls: Vec::new(),
        }]);
        let provider = ScriptedProvider::new().with_tool("unused", Ok(CallToolResult::text("x")));
        let bridge = orchestrator(client.clone(), provider.clone());

        let outcome = bridge.handle_turn("hi").await.expect("turn");
        assert_eq!(outcome.response, "Hello there.");
        assert!(outcome.raw_result.is_none());
        assert!(provider.calls().await.is_empty());
        assert_eq!(client.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_plan_executes_nothing() {
        let client = ScriptedClient::new(vec![CompletionMessage {
            content: None,
            tool_calls: vec![
                tool_call(0, "getDeepSeekBalance", "{}"),
                tool_call(1, "getWeatherByCityNameAndDate", "not json"),
            ],
        }]);
        let provider = ScriptedProvider::new()
            .with_tool("getDeepSeekBalance", Ok(CallToolResult::text("10 CNY")))
            .with_tool("getWeatherByCityNameAndDate", Ok(CallToolResult::text("sunny")));
        let bridge = orchestrator(client, provider.clone());

        let err = bridge.handle("anything").await.unwrap_err();
        assert!(matches!(err, BridgeError::MalformedPlan { .. }));
        assert!(provider.calls().await.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_aborts_before_planning() {
        let client = ScriptedClient::new(Vec::new());
        let bridge = orchestrator(client.clone(), ScriptedProvider::new().failing_listing());

        let err = bridge.start().await.unwrap_err();
        assert!(matches!(err, BridgeError::CapabilityListing(_)));
        assert!(bridge.handle("hi").await.is_err());
        assert!(client.requests().await.is_empty());
    }

    #[tokio::test]
    async fn narration_failure_carries_raw_result() {
        let client = ScriptedClient::new(vec![CompletionMessage {
            content: None,
            tool_calls: vec![tool_call(0, "getDeepSeekBalance", "{}")],
        }]);
        let provider = ScriptedProvider::new()
            .with_tool("getDeepSeekBalance", Ok(CallToolResult::text("[{\"currency\":\"CNY\"}]")));
        let bridge = orchestrator(client, provider);

        // The script is exhausted after the plan, so the narration call fails.
        let err = bridge.handle("余额？").await.unwrap_err();
        assert_eq!(err.raw_result(), Some("[{\"currency\":\"CNY\"}]"));
    }
}
