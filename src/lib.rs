//! # Reelsmith
//!
//! An agent-orchestrated pipeline that turns a topic string into a
//! structured, multi-scene educational content package.
//!
//! This library provides:
//! - A tool-calling invocation loop driving one model/tool exchange
//! - A process-lifetime session store with append-only transcripts
//! - A staged pipeline (script -> keywords -> assets) with contract
//!   enforcement on every stage boundary
//!
//! ## Architecture
//!
//! Each pipeline stage follows the "tools in a loop" pattern:
//! 1. Build a stage instruction from the previous stage's validated output
//! 2. Call the model with the session transcript and declared tools
//! 3. If the model requests tool calls, dispatch them and feed results back
//! 4. Repeat until the model emits a terminal answer or the cap is hit
//! 5. Parse the terminal answer against the stage contract
//!
//! ## Example
//!
//! ```rust,ignore
//! use reelsmith::{config::Config, pipeline::Pipeline};
//!
//! let config = Config::from_env()?;
//! let pipeline = Pipeline::new(config);
//! let result = pipeline.run("powerhouse of the cell", "en", 3, &cancel).await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod session;
pub mod tools;

pub use config::Config;
