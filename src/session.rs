//! In-memory session store (non-persistent).
//!
//! A session is identified by an `(app_id, user_id, session_id)` triple and
//! owns exactly one transcript: the append-only, ordered record of turns
//! exchanged with one agent. Sessions live for the process lifetime; there is
//! no persistence across restarts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Identifies one session within the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_id: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_id, self.user_id, self.session_id)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instruction text submitted to the agent
    User,
    /// The backing model's output (terminal answer or tool-call requests)
    Model,
    /// Serialized result of one dispatched tool call
    ToolResult,
}

/// A tool invocation requested by the model.
///
/// `arguments` is kept as the raw JSON string the model emitted; it is parsed
/// at dispatch time so that malformed argument payloads surface as tool-level
/// errors rather than transcript corruption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub tool_name: String,
    pub arguments: String,
}

/// One committed entry in a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    /// For `ToolResult` turns: the id of the request this result answers.
    pub tool_call_id: Option<String>,
    /// RFC 3339 commit timestamp.
    pub committed_at: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(text.into()),
            tool_calls: None,
            tool_call_id: None,
            committed_at: now_string(),
        }
    }

    pub fn model(content: Option<String>, tool_calls: Option<Vec<ToolCallRequest>>) -> Self {
        Self {
            role: Role::Model,
            content,
            tool_calls,
            tool_call_id: None,
            committed_at: now_string(),
        }
    }

    pub fn tool_result(call_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: Some(payload.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
            committed_at: now_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session already exists: {0}")]
    AlreadyExists(SessionKey),

    #[error("unknown session: {0}")]
    Unknown(SessionKey),
}

/// Process-wide keyed store of transcripts.
///
/// The store is the only state shared across invocation loop executions.
/// Callers must not run two loops against the same session concurrently; the
/// pipeline upholds this by executing stages sequentially.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionKey, Vec<Turn>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new, empty session. Sessions must be created explicitly
    /// before the first append.
    pub async fn create_session(&self, key: &SessionKey) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(key) {
            return Err(SessionError::AlreadyExists(key.clone()));
        }
        sessions.insert(key.clone(), Vec::new());
        Ok(())
    }

    /// Append one turn to a session's transcript. Returns the new transcript
    /// length. Committed turns are never edited or removed.
    pub async fn append_turn(&self, key: &SessionKey, turn: Turn) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().await;
        let transcript = sessions
            .get_mut(key)
            .ok_or_else(|| SessionError::Unknown(key.clone()))?;
        transcript.push(turn);
        Ok(transcript.len())
    }

    /// Snapshot a session's transcript in commit order.
    pub async fn transcript(&self, key: &SessionKey) -> Result<Vec<Turn>, SessionError> {
        self.sessions
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| SessionError::Unknown(key.clone()))
    }

    /// Number of committed turns in a session.
    pub async fn turn_count(&self, key: &SessionKey) -> Result<usize, SessionError> {
        Ok(self.transcript(key).await?.len())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now_string() -> String {
    Utc::now().to_rfc3339()
}
