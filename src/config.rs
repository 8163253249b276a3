//! Configuration management for Reelsmith.
//!
//! Configuration can be set via environment variables:
//! - `OPENROUTER_API_KEY` - Required. API key for the backing model service.
//! - `DEFAULT_MODEL` - Optional. The model to use for all stages. Defaults to `google/gemini-2.0-flash-001`.
//! - `OUTPUT_DIR` - Optional. Directory for generated artifacts and results. Defaults to current directory.
//! - `MAX_ITERATIONS` - Optional. Maximum invocation loop iterations per stage. Defaults to `10`.
//! - `STAGE_RETRY` - Optional. Stage retry policy: `corrective` (default) or `abort`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// What the pipeline does when a stage's terminal answer violates its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Fail the run on the first contract violation.
    Abort,
    /// Append one corrective follow-up to the stage session, then fail.
    CorrectiveRetry,
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the backing model service
    pub api_key: String,

    /// Model identifier used by every stage agent
    pub default_model: String,

    /// Directory where tools and the pipeline write their output
    pub output_dir: PathBuf,

    /// Maximum iterations for one invocation loop
    pub max_iterations: usize,

    /// Contract-violation retry policy
    pub retry_policy: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let default_model = std::env::var("DEFAULT_MODEL")
            .unwrap_or_else(|_| "google/gemini-2.0-flash-001".to_string());

        let output_dir = std::env::var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e)))?;

        let retry_policy = match std::env::var("STAGE_RETRY").as_deref() {
            Ok("abort") => RetryPolicy::Abort,
            Ok("corrective") | Err(_) => RetryPolicy::CorrectiveRetry,
            Ok(other) => {
                return Err(ConfigError::InvalidValue(
                    "STAGE_RETRY".to_string(),
                    format!("expected 'corrective' or 'abort', got: {}", other),
                ))
            }
        };

        Ok(Self {
            api_key,
            default_model,
            output_dir,
            max_iterations,
            retry_policy,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String, output_dir: PathBuf) -> Self {
        Self {
            api_key,
            default_model,
            output_dir,
            max_iterations: 10,
            retry_policy: RetryPolicy::CorrectiveRetry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_config_uses_corrective_retry_by_default() {
        let config = Config::new(
            "test-key".to_string(),
            "test-model".to_string(),
            PathBuf::from("/tmp"),
        );
        assert_eq!(config.retry_policy, RetryPolicy::CorrectiveRetry);
        assert_eq!(config.max_iterations, 10);
    }
}
