//! Core invocation loop implementation.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::llm::{LlmClient, LlmError};
use crate::session::{SessionError, SessionKey, SessionStore, Turn};

use super::AgentDef;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Iteration cap reached without a terminal answer.
    #[error("iteration limit ({0}) reached without a terminal answer")]
    LoopExhausted(usize),

    /// Caller-requested cancellation observed at a suspension point.
    #[error("invocation cancelled")]
    Cancelled,

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Drives one conversational exchange for one agent against one session.
///
/// The runner itself is stateless between invocations; the session transcript
/// is the only carried state. Callers must not run two invocations against
/// the same session concurrently.
pub struct Runner {
    llm: Arc<dyn LlmClient>,
    sessions: SessionStore,
    max_iterations: usize,
    workspace: PathBuf,
}

impl Runner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        sessions: SessionStore,
        max_iterations: usize,
        workspace: PathBuf,
    ) -> Self {
        Self {
            llm,
            sessions,
            max_iterations,
            workspace,
        }
    }

    /// Run one invocation: append `message` as a user turn, then cycle
    /// through model and tool rounds until the model emits a terminal answer.
    ///
    /// Cancellation is observed at suspension-point boundaries: an in-flight
    /// model or tool round completes, then the loop halts with
    /// [`AgentError::Cancelled`]. The terminal answer is committed to the
    /// transcript before being returned, so a follow-up invocation on the
    /// same session sees the model's own prior answer.
    pub async fn run(
        &self,
        agent: &AgentDef,
        key: &SessionKey,
        message: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        self.sessions.append_turn(key, Turn::user(message)).await?;

        let tool_schemas = agent.tools.schemas();

        for iteration in 0..self.max_iterations {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            tracing::debug!("Agent {} iteration {}", agent.name, iteration + 1);

            let transcript = self.sessions.transcript(key).await?;
            let response = self
                .llm
                .generate(&agent.model, &transcript, &tool_schemas)
                .await?;

            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            // Tool round: commit the model turn, dispatch every requested
            // call, commit results in request order, and go back to the model.
            if let Some(tool_calls) = &response.tool_calls {
                if !tool_calls.is_empty() {
                    let requests = tool_calls.clone();
                    self.sessions
                        .append_turn(key, Turn::model(response.content.clone(), Some(requests.clone())))
                        .await?;

                    // Dispatch concurrently; join_all yields results in
                    // request order regardless of completion order.
                    let results = join_all(
                        requests
                            .iter()
                            .map(|call| agent.tools.dispatch(call, &self.workspace)),
                    )
                    .await;

                    for (call, result) in requests.iter().zip(results) {
                        self.sessions
                            .append_turn(key, Turn::tool_result(call.id.clone(), result))
                            .await?;
                    }

                    continue;
                }
            }

            // No tool calls - this is the terminal answer.
            if let Some(content) = response.content {
                self.sessions
                    .append_turn(key, Turn::model(Some(content.clone()), None))
                    .await?;
                return Ok(content);
            }

            return Err(AgentError::EmptyResponse);
        }

        Err(AgentError::LoopExhausted(self.max_iterations))
    }
}
