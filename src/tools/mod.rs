//! Tool trait, registry, and dispatch.
//!
//! A tool is a callable capability with a declared name and parameter schema,
//! exposed to one agent through its registry. Dispatch has total closure: any
//! tool-call request, including unknown names and malformed arguments, yields
//! a serialized tool result. A failure inside a tool is caught at the tool
//! boundary and reported as data; the invocation loop never observes an
//! unhandled fault.

mod audio;
mod image;
mod media;

pub use audio::GenerateAudioClip;
pub use image::GenerateIllustration;
pub use media::SearchStockMedia;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::ToolSchema;
use crate::session::ToolCallRequest;

/// A callable capability exposed to an agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as referenced by the model.
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `workspace` is the directory the tool may write into.
    /// Implementations return their payload as a serialized JSON object.
    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// The fixed set of tools available to one agent.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry (for agents that work without tools).
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry from a fixed tool set.
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Register an additional tool.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// List registered tools.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Export tool schemas for the model request.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Dispatch one tool-call request.
    ///
    /// Always returns a serialized tool result: unknown tool names and
    /// tool-level failures are converted into `{"error": ...}` payloads and
    /// fed back to the model, which may retry differently or explain the
    /// failure in its final answer.
    pub async fn dispatch(&self, request: &ToolCallRequest, workspace: &Path) -> String {
        let tool = match self.tools.iter().find(|t| t.name() == request.tool_name) {
            Some(tool) => tool,
            None => {
                tracing::warn!("Dispatch requested unknown tool: {}", request.tool_name);
                return json!({
                    "error": format!("Unknown tool: {}", request.tool_name)
                })
                .to_string();
            }
        };

        let args: Value = serde_json::from_str(&request.arguments).unwrap_or(Value::Null);

        match tool.execute(args, workspace).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", request.tool_name, e);
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the 'text' argument back."
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }

        async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
            let text = args["text"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;
            Ok(json!({ "text": text }).to_string())
        }
    }

    fn request(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".to_string(),
            tool_name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[tokio::test]
    async fn dispatch_returns_payload_on_success() {
        let registry = ToolRegistry::with_tools(vec![Arc::new(Echo)]);
        let result = registry
            .dispatch(&request("echo", r#"{"text":"hi"}"#), Path::new("."))
            .await;

        let value: Value = serde_json::from_str(&result).expect("valid json");
        assert_eq!(value["text"], "hi");
    }

    #[tokio::test]
    async fn unknown_tool_yields_error_result() {
        let registry = ToolRegistry::with_tools(vec![Arc::new(Echo)]);
        let result = registry
            .dispatch(&request("no_such_tool", "{}"), Path::new("."))
            .await;

        let value: Value = serde_json::from_str(&result).expect("valid json");
        assert!(value["error"]
            .as_str()
            .expect("error field")
            .contains("no_such_tool"));
    }

    #[tokio::test]
    async fn malformed_arguments_yield_error_result() {
        let registry = ToolRegistry::with_tools(vec![Arc::new(Echo)]);

        for arguments in ["not json at all", "[1, 2, 3]", "{\"wrong\": true}"] {
            let result = registry
                .dispatch(&request("echo", arguments), Path::new("."))
                .await;
            let value: Value = serde_json::from_str(&result).expect("valid json");
            assert!(value.get("error").is_some(), "arguments: {}", arguments);
        }
    }

    #[test]
    fn schemas_cover_every_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));

        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "echo");
        assert_eq!(schemas[0].parameters["type"], "object");
    }
}
