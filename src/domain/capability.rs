//! Capability descriptors and the tool envelope advertised to the planning model.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

/// A remotely invocable operation as reported by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object_schema")]
    #[schema(value_type = Object)]
    pub input_schema: Value,
}

impl CapabilityDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// One entry of the `tools` array in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDirective {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDeclaration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&CapabilityDescriptor> for ToolDirective {
    fn from(descriptor: &CapabilityDescriptor) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionDeclaration {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: descriptor.input_schema.clone(),
            },
        }
    }
}

/// Build the envelope sent with a plan request. Order follows the input.
pub fn to_directive_envelope(descriptors: &[CapabilityDescriptor]) -> Vec<ToolDirective> {
    descriptors.iter().map(ToolDirective::from).collect()
}
