//! Staged pipeline: script -> keywords -> assets.
//!
//! Each stage owns one agent and one session, wraps one invocation loop
//! execution, and enforces a contract on its terminal answer before the next
//! stage runs. Stages execute sequentially; a failed stage fails the whole
//! run, carrying the stage name, the cause, and the validated outputs of the
//! stages that already completed.

pub mod contract;
mod prompt;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agent::{AgentDef, AgentError, Runner};
use crate::config::{Config, RetryPolicy};
use crate::llm::{LlmClient, OpenRouterClient};
use crate::session::{SessionKey, SessionStore};
use crate::tools::{GenerateAudioClip, GenerateIllustration, SearchStockMedia, ToolRegistry};

use contract::{ArtifactDescriptor, ContractViolation, Script};

/// Application id under which all pipeline sessions are registered.
pub const APP_NAME: &str = "reelsmith";

const USER_ID: &str = "pipeline";

const STAGE_SCRIPT: &str = "script";
const STAGE_KEYWORDS: &str = "keywords";
const STAGE_ASSETS: &str = "assets";

/// Why a stage failed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Validated outputs of the stages that completed before a failure.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PartialOutputs {
    pub script: Option<Script>,
    pub keywords: Option<Vec<String>>,
}

/// A failed run: the failing stage's identity, the cause, and whatever the
/// earlier stages already produced. Prior stage outputs are recorded as
/// validated and are never altered by the failure path.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {error}")]
pub struct PipelineFailure {
    pub stage: &'static str,
    pub error: StageError,
    pub partial: PartialOutputs,
}

impl PipelineFailure {
    /// True when the run stopped because the caller cancelled it, as opposed
    /// to a stage error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, StageError::Agent(AgentError::Cancelled))
    }
}

/// The final aggregate of all stage outputs.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub topic: String,
    pub language: String,
    pub script: Script,
    pub keywords: Vec<String>,
    pub artifacts: Vec<ArtifactDescriptor>,
    pub created_at: String,
}

/// Orchestrates the three stages over one shared session store.
///
/// The pipeline exclusively owns its stage sessions: every run registers
/// fresh sessions keyed by the run id, and no two loops ever execute against
/// one session concurrently.
pub struct Pipeline {
    config: Config,
    llm: Arc<dyn LlmClient>,
    sessions: SessionStore,
}

impl Pipeline {
    /// Create a pipeline backed by the configured model service.
    pub fn new(config: Config) -> Self {
        let llm = Arc::new(OpenRouterClient::new(config.api_key.clone()));
        Self::with_client(config, llm)
    }

    /// Create a pipeline with an injected model client (tests, proxies).
    pub fn with_client(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            llm,
            sessions: SessionStore::new(),
        }
    }

    /// Run the full pipeline for one topic.
    pub async fn run(
        &self,
        topic: &str,
        language: &str,
        scene_count: usize,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, PipelineFailure> {
        let run_id = Uuid::new_v4();
        tracing::info!("Pipeline run {} starting for topic: {}", run_id, topic);

        let runner = Runner::new(
            Arc::clone(&self.llm),
            self.sessions.clone(),
            self.config.max_iterations,
            self.config.output_dir.clone(),
        );

        let script_agent = AgentDef::new(
            "script_agent",
            "Educational content creator producing structured video scripts.",
            &self.config.default_model,
        );
        let keyword_agent = AgentDef::new(
            "keyword_agent",
            "Extracts illustration search keywords from script content.",
            &self.config.default_model,
        );
        let asset_agent = AgentDef::new(
            "asset_agent",
            "Produces media assets for each keyword using content tools.",
            &self.config.default_model,
        )
        .with_tools(ToolRegistry::with_tools(vec![
            Arc::new(SearchStockMedia),
            Arc::new(GenerateAudioClip),
            Arc::new(GenerateIllustration),
        ]));

        let mut partial = PartialOutputs::default();

        // Stage 1: topic -> script.
        let script_key = self
            .open_stage_session(STAGE_SCRIPT, run_id, &partial)
            .await?;
        let script = self
            .run_stage(
                &runner,
                &script_agent,
                &script_key,
                STAGE_SCRIPT,
                prompt::script_instruction(topic, language, scene_count),
                cancel,
                &partial,
                |answer| contract::parse_script(answer, scene_count),
            )
            .await?;
        tracing::info!("Stage '{}' produced {} scenes", STAGE_SCRIPT, script.scenes.len());
        partial.script = Some(script.clone());

        // Stage 2: script -> keywords.
        let script_json = serde_json::to_string_pretty(&script).map_err(|e| PipelineFailure {
            stage: STAGE_KEYWORDS,
            error: StageError::Contract(ContractViolation(format!(
                "could not serialize script for stage input: {}",
                e
            ))),
            partial: partial.clone(),
        })?;
        let keywords_key = self
            .open_stage_session(STAGE_KEYWORDS, run_id, &partial)
            .await?;
        let keywords = self
            .run_stage(
                &runner,
                &keyword_agent,
                &keywords_key,
                STAGE_KEYWORDS,
                prompt::keywords_instruction(&script_json),
                cancel,
                &partial,
                contract::parse_keywords,
            )
            .await?
            .keywords;
        tracing::info!("Stage '{}' produced {} keywords", STAGE_KEYWORDS, keywords.len());
        partial.keywords = Some(keywords.clone());

        // Stage 3: keywords -> artifact manifest.
        let assets_key = self
            .open_stage_session(STAGE_ASSETS, run_id, &partial)
            .await?;
        let manifest = self
            .run_stage(
                &runner,
                &asset_agent,
                &assets_key,
                STAGE_ASSETS,
                prompt::assets_instruction(&keywords),
                cancel,
                &partial,
                |answer| contract::parse_manifest(answer, &keywords),
            )
            .await?;
        tracing::info!(
            "Stage '{}' produced {} artifacts",
            STAGE_ASSETS,
            manifest.artifacts.len()
        );

        Ok(PipelineResult {
            run_id,
            topic: topic.to_string(),
            language: language.to_string(),
            script,
            keywords,
            artifacts: manifest.artifacts,
            created_at: Utc::now().to_rfc3339(),
        })
    }

    async fn open_stage_session(
        &self,
        stage: &'static str,
        run_id: Uuid,
        partial: &PartialOutputs,
    ) -> Result<SessionKey, PipelineFailure> {
        let key = SessionKey::new(APP_NAME, USER_ID, format!("{}-{}", stage, run_id));
        self.sessions
            .create_session(&key)
            .await
            .map_err(|e| PipelineFailure {
                stage,
                error: StageError::Agent(AgentError::Session(e)),
                partial: partial.clone(),
            })?;
        Ok(key)
    }

    /// Execute one stage: run the invocation loop, then parse the terminal
    /// answer against the stage contract. On a contract violation, the
    /// default policy appends one corrective follow-up to the same session
    /// (the model sees its own malformed answer) and re-parses; the retry is
    /// bounded to a single attempt.
    async fn run_stage<T, F>(
        &self,
        runner: &Runner,
        agent: &AgentDef,
        key: &SessionKey,
        stage: &'static str,
        instruction: String,
        cancel: &CancellationToken,
        partial: &PartialOutputs,
        parse: F,
    ) -> Result<T, PipelineFailure>
    where
        F: Fn(&str) -> Result<T, ContractViolation>,
    {
        let fail = |error: StageError| PipelineFailure {
            stage,
            error,
            partial: partial.clone(),
        };

        let answer = runner
            .run(agent, key, instruction, cancel)
            .await
            .map_err(|e| fail(e.into()))?;

        match parse(&answer) {
            Ok(value) => Ok(value),
            Err(violation) if self.config.retry_policy == RetryPolicy::CorrectiveRetry => {
                tracing::warn!(
                    "Stage '{}' violated its contract, retrying once: {}",
                    stage,
                    violation
                );
                let answer = runner
                    .run(agent, key, prompt::corrective_instruction(&violation), cancel)
                    .await
                    .map_err(|e| fail(e.into()))?;
                parse(&answer).map_err(|v| fail(v.into()))
            }
            Err(violation) => Err(fail(violation.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RetryPolicy;
    use crate::llm::testing::ScriptedClient;

    use super::*;

    const TOPIC: &str = "powerhouse of the cell";

    fn test_config(retry_policy: RetryPolicy) -> (Config, tempfile::TempDir) {
        let workspace = tempfile::tempdir().expect("tempdir");
        let mut config = Config::new(
            "test-key".to_string(),
            "test-model".to_string(),
            workspace.path().to_path_buf(),
        );
        config.retry_policy = retry_policy;
        (config, workspace)
    }

    fn script_answer() -> String {
        serde_json::json!({
            "scenes": [
                {"title": "Meet the Mitochondria", "content": ["Ever wonder where your energy comes from?"]},
                {"title": "The ATP Factory", "content": ["Sugar in, ATP out.", "Thousands per cell."]},
                {"title": "Why It Matters", "content": ["No mitochondria, no marathon."]}
            ]
        })
        .to_string()
    }

    fn keywords_answer() -> String {
        serde_json::json!({
            "keywords": ["mitochondria", "atp molecule", "cell cross section", "energy flow", "muscle cell"]
        })
        .to_string()
    }

    fn manifest_answer() -> String {
        let artifacts: Vec<_> = [
            "mitochondria",
            "atp molecule",
            "cell cross section",
            "energy flow",
            "muscle cell",
        ]
        .iter()
        .enumerate()
        .map(|(i, keyword)| {
            serde_json::json!({
                "keyword": keyword,
                "media_url": format!("https://example.com/{}.mp4", i),
                "image_file": format!("generated_images/{}_{}.txt", keyword.replace(' ', "_"), i + 1),
            })
        })
        .collect();
        serde_json::json!({ "artifacts": artifacts }).to_string()
    }

    #[tokio::test]
    async fn end_to_end_run_produces_one_artifact_per_keyword() {
        let (config, _workspace) = test_config(RetryPolicy::CorrectiveRetry);
        let client = ScriptedClient::new(vec![
            // Stage 1 answer arrives fenced; normalization handles it.
            ScriptedClient::final_text(&format!("```json\n{}\n```", script_answer())),
            ScriptedClient::final_text(&keywords_answer()),
            // Stage 3 does one tool round before its terminal manifest.
            ScriptedClient::tool_round(&[
                (
                    "call_media",
                    "search_stock_media",
                    r#"{"query":"mitochondria"}"#,
                ),
                (
                    "call_image",
                    "generate_illustration",
                    r#"{"keyword":"mitochondria","index":0}"#,
                ),
            ]),
            ScriptedClient::final_text(&manifest_answer()),
        ]);
        let pipeline = Pipeline::with_client(config, Arc::new(client));

        let result = pipeline
            .run(TOPIC, "en", 3, &CancellationToken::new())
            .await
            .expect("pipeline run");

        assert_eq!(result.topic, TOPIC);
        assert_eq!(result.script.scenes.len(), 3);
        for scene in &result.script.scenes {
            assert!(!scene.title.is_empty());
            assert!(!scene.content.is_empty());
        }
        assert!((5..=8).contains(&result.keywords.len()));
        assert_eq!(result.artifacts.len(), result.keywords.len());
    }

    #[tokio::test]
    async fn contract_violation_aborts_under_abort_policy() {
        let (config, _workspace) = test_config(RetryPolicy::Abort);
        // Structurally valid JSON, but the second scene is missing its title.
        let client = ScriptedClient::new(vec![ScriptedClient::final_text(
            r#"{"scenes": [
                {"title": "Intro", "content": ["line"]},
                {"content": ["line"]},
                {"title": "Outro", "content": ["line"]}
            ]}"#,
        )]);
        let pipeline = Pipeline::with_client(config, Arc::new(client));

        let failure = pipeline
            .run(TOPIC, "en", 3, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(failure.stage, STAGE_SCRIPT);
        assert!(matches!(failure.error, StageError::Contract(_)));
        assert!(!failure.is_cancelled());
        assert!(failure.partial.script.is_none());
    }

    #[tokio::test]
    async fn corrective_retry_recovers_and_grows_the_same_session() {
        let (config, _workspace) = test_config(RetryPolicy::CorrectiveRetry);
        let client = ScriptedClient::new(vec![
            ScriptedClient::final_text("here is your script! (not JSON)"),
            ScriptedClient::final_text(&script_answer()),
            ScriptedClient::final_text(&keywords_answer()),
            ScriptedClient::final_text(&manifest_answer()),
        ]);
        let pipeline = Pipeline::with_client(config, Arc::new(client));

        let result = pipeline
            .run(TOPIC, "en", 3, &CancellationToken::new())
            .await
            .expect("retry recovers the run");

        // The corrective follow-up went into the script stage's own session:
        // user, malformed answer, corrective user turn, corrected answer.
        let script_key = SessionKey::new(
            APP_NAME,
            USER_ID,
            format!("{}-{}", STAGE_SCRIPT, result.run_id),
        );
        let transcript = pipeline
            .sessions
            .transcript(&script_key)
            .await
            .expect("script session transcript");
        assert_eq!(transcript.len(), 4);
        assert!(transcript[2]
            .content
            .as_deref()
            .expect("corrective turn")
            .contains("rejected"));
    }

    #[tokio::test]
    async fn second_violation_fails_even_with_retry_policy() {
        let (config, _workspace) = test_config(RetryPolicy::CorrectiveRetry);
        let client = ScriptedClient::new(vec![
            ScriptedClient::final_text("still not JSON"),
            ScriptedClient::final_text("also not JSON"),
        ]);
        let pipeline = Pipeline::with_client(config, Arc::new(client));

        let failure = pipeline
            .run(TOPIC, "en", 3, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(failure.stage, STAGE_SCRIPT);
        assert!(matches!(failure.error, StageError::Contract(_)));
    }

    #[tokio::test]
    async fn cancellation_mid_stage_two_preserves_stage_one_output() {
        let (config, _workspace) = test_config(RetryPolicy::CorrectiveRetry);
        let token = CancellationToken::new();
        // The token trips while stage 2's model call (overall call 2) is in
        // flight; the keywords loop must halt instead of finishing.
        let client = ScriptedClient::new(vec![
            ScriptedClient::final_text(&script_answer()),
            ScriptedClient::final_text(&keywords_answer()),
        ])
        .cancel_on_call(2, token.clone());
        let pipeline = Pipeline::with_client(config, Arc::new(client));

        let failure = pipeline.run(TOPIC, "en", 3, &token).await.unwrap_err();

        assert_eq!(failure.stage, STAGE_KEYWORDS);
        assert!(failure.is_cancelled());

        // Stage 1's validated output is present and unaltered.
        let expected = contract::parse_script(&script_answer(), 3).expect("fixture script");
        assert_eq!(failure.partial.script.as_ref(), Some(&expected));
        assert!(failure.partial.keywords.is_none());
    }

    #[tokio::test]
    async fn artifact_count_mismatch_is_an_assets_contract_violation() {
        let (config, _workspace) = test_config(RetryPolicy::Abort);
        let short_manifest = serde_json::json!({
            "artifacts": [{"keyword": "mitochondria"}]
        })
        .to_string();
        let client = ScriptedClient::new(vec![
            ScriptedClient::final_text(&script_answer()),
            ScriptedClient::final_text(&keywords_answer()),
            ScriptedClient::final_text(&short_manifest),
        ]);
        let pipeline = Pipeline::with_client(config, Arc::new(client));

        let failure = pipeline
            .run(TOPIC, "en", 3, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(failure.stage, STAGE_ASSETS);
        assert!(matches!(failure.error, StageError::Contract(_)));
        // Both completed stages survive in the partial result.
        assert!(failure.partial.script.is_some());
        assert_eq!(
            failure.partial.keywords.as_ref().map(|k| k.len()),
            Some(5)
        );
    }
}
