//! Agent identity.

use crate::tools::ToolRegistry;

/// A named capability: identity, backing model reference, and the fixed set
/// of tools it may call. Holds no conversational state; all state lives in
/// the session a runner executes it against.
pub struct AgentDef {
    pub name: String,
    pub description: String,
    pub model: String,
    pub tools: ToolRegistry,
}

impl AgentDef {
    /// Create an agent with no tools.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            model: model.into(),
            tools: ToolRegistry::new(),
        }
    }

    /// Bind a tool registry to this agent.
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }
}
