//! Plan shapes: what the model sends back, and what the dispatcher consumes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool call exactly as the planning model returned it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawToolCall {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    pub function: RawFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: RawArguments,
}

/// OpenAI-style providers encode arguments as a JSON string; Ollama-style
/// providers send the object directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawArguments {
    Encoded(String),
    Structured(Value),
}

impl Default for RawArguments {
    fn default() -> Self {
        RawArguments::Structured(Value::Object(Map::new()))
    }
}

impl RawArguments {
    /// Decode into the mapping handed to the capability provider.
    pub fn decode(self) -> Result<Map<String, Value>, String> {
        let value = match self {
            RawArguments::Encoded(text) => {
                serde_json::from_str::<Value>(&text).map_err(|err| err.to_string())?
            }
            RawArguments::Structured(value) => value,
        };
        match value {
            Value::Object(map) => Ok(map),
            other => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A normalized, ready-to-dispatch tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStep {
    pub index: u32,
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// The model's answer to a plan request.
///
/// `steps` is sorted by ascending `index`. When it is empty the model chose to
/// answer without tools and `direct_reply` holds whatever text it produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub steps: Vec<ExecutionStep>,
    pub direct_reply: Option<String>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Per-step outcome of a capability invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationResult {
    pub success: bool,
    pub text_content: Option<String>,
}

impl ToolInvocationResult {
    pub fn succeeded(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text_content: Some(text.into()),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            text_content: None,
        }
    }
}

/// `tools/call` result payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CallToolResult {
    #[serde(default, rename = "isError")]
    pub is_error: bool,
    #[serde(default)]
    pub content: Vec<ContentFragment>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentFragment {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![ContentFragment::Text { text: text.into() }],
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![ContentFragment::Text { text: text.into() }],
        }
    }

    /// Concatenate every text fragment; other content kinds are skipped.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|fragment| match fragment {
                ContentFragment::Text { text } => Some(text.as_str()),
                ContentFragment::Other => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encoded_arguments_decode_to_mapping() {
        let args = RawArguments::Encoded(r#"{"cityName":"杭州","date":"2025-06-28"}"#.into());
        let map = args.decode().expect("decode");
        assert_eq!(map["cityName"], "杭州");
        assert_eq!(map["date"], "2025-06-28");
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = RawArguments::Encoded("[1,2]".into()).decode().unwrap_err();
        assert!(err.contains("an array"));
        assert!(RawArguments::Structured(json!("x")).decode().is_err());
    }

    #[test]
    fn raw_tool_call_accepts_string_and_object_arguments() {
        let calls: Vec<RawToolCall> = serde_json::from_value(json!([
            {
                "id": "call_0",
                "type": "function",
                "index": 0,
                "function": { "name": "a", "arguments": "{\"x\":1}" }
            },
            {
                "function": { "name": "b", "arguments": { "y": 2 } }
            },
            {
                "function": { "name": "c" }
            }
        ]))
        .expect("parse tool calls");

        assert!(matches!(calls[0].function.arguments, RawArguments::Encoded(_)));
        assert!(matches!(calls[1].function.arguments, RawArguments::Structured(_)));
        assert_eq!(calls[1].index, None);
        assert!(calls[2].function.arguments.clone().decode().expect("empty").is_empty());
    }

    #[test]
    fn call_result_keeps_only_text_fragments() {
        let result: CallToolResult = serde_json::from_value(json!({
            "isError": false,
            "content": [
                { "type": "text", "text": "杭州 2025-06-28 " },
                { "type": "image", "data": "AAAA", "mimeType": "image/png" },
                { "type": "text", "text": "温度为 23 摄氏度！" }
            ]
        }))
        .expect("parse result");

        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "杭州 2025-06-28 温度为 23 摄氏度！");
    }
}
