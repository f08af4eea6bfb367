//! Tool declarations and result helpers

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A function the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

/// Name, description and JSON-schema parameters of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    /// Declare a function tool
    pub fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }

    /// Declare a function tool that takes no arguments
    pub fn no_args(name: &str, description: &str) -> Self {
        Self::function(
            name,
            description,
            json!({"type": "object", "properties": {}, "required": []}),
        )
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// `{"status": "error", "message": ...}`
pub fn error_result(message: impl Into<String>) -> Value {
    json!({"status": "error", "message": message.into()})
}

/// Result for a tool name nobody declared
pub fn unknown_tool(name: &str) -> Value {
    error_result(format!("Unknown function: {}", name))
}
