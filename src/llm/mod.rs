//! Backing model boundary.
//!
//! The core treats the generative model as an opaque service: the request is
//! the accumulated transcript plus the declared tool schemas, the response is
//! either a terminal text answer or one or more tool-call requests. The
//! concrete wire format lives behind [`LlmClient`].

mod openrouter;

pub use openrouter::OpenRouterClient;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::session::{ToolCallRequest, Turn};

/// Declared schema for one callable tool, as advertised to the model.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: Value,
}

/// One model response: a terminal answer, tool-call requests, or both
/// (content alongside tool calls is preserved in the transcript).
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

impl ModelResponse {
    /// True when the response carries no tool-call requests, i.e. it is the
    /// invocation's terminal answer.
    pub fn is_terminal(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|calls| calls.is_empty())
            .unwrap_or(true)
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to model service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed model response: {0}")]
    Malformed(String),
}

/// Client for the backing generative model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Submit the transcript and tool declarations, returning the model's
    /// next turn.
    async fn generate(
        &self,
        model: &str,
        transcript: &[Turn],
        tools: &[ToolSchema],
    ) -> Result<ModelResponse, LlmError>;
}
