//! Agent module - identities and the invocation loop.
//!
//! An agent is a named capability bound to a model and a tool registry; it is
//! stateless and reusable across sessions. The runner drives one multi-turn
//! exchange between an agent's model and its tools:
//! 1. Append the new user message to the session transcript
//! 2. Call the model with the transcript and declared tool schemas
//! 3. If the model requests tool calls, dispatch them and append results
//! 4. Repeat until the model emits a terminal answer or the cap is reached

mod definition;
mod runner;

pub use definition::AgentDef;
pub use runner::{AgentError, Runner};
