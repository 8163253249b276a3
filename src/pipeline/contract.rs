//! Stage contracts: the typed shapes each stage must hand downstream.
//!
//! A stage's terminal answer is parsed and validated here. Shape mismatches
//! are surfaced as [`ContractViolation`]s, never coerced: a scene missing its
//! title fails the stage rather than being default-filled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stage's terminal answer does not satisfy its declared output shape.
#[derive(Debug, Clone, Error)]
#[error("contract violation: {0}")]
pub struct ContractViolation(pub String);

/// One scene of the generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub title: String,
    pub content: Vec<String>,
}

/// Stage 1 output: the structured video script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub scenes: Vec<Scene>,
}

/// Stage 2 output: search keywords for illustrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub keywords: Vec<String>,
}

/// One generated or located artifact, as reported by stage 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub keyword: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub audio_file: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
}

/// Stage 3 output: one artifact descriptor per keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub artifacts: Vec<ArtifactDescriptor>,
}

/// Bounded normalization applied to a terminal answer before parsing.
///
/// Exactly one documented rule: trim surrounding whitespace and, when the
/// whole answer is wrapped in a single Markdown code fence (with an optional
/// language tag), strip the fence lines. Nothing else is repaired; any other
/// mismatch is a [`ContractViolation`].
pub fn normalize_terminal_answer(answer: &str) -> String {
    let trimmed = answer.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            let inner = match inner.split_once('\n') {
                // Opening fence line holds only a language tag, not payload.
                Some((tag, body)) if !tag.contains('{') && !tag.contains('[') => body,
                _ => inner,
            };
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Parse and validate a stage-1 terminal answer.
pub fn parse_script(answer: &str, expected_scenes: usize) -> Result<Script, ContractViolation> {
    let normalized = normalize_terminal_answer(answer);
    let script: Script = serde_json::from_str(&normalized)
        .map_err(|e| ContractViolation(format!("script is not valid scene JSON: {}", e)))?;

    if script.scenes.len() != expected_scenes {
        return Err(ContractViolation(format!(
            "script must have exactly {} scenes, got {}",
            expected_scenes,
            script.scenes.len()
        )));
    }
    for (i, scene) in script.scenes.iter().enumerate() {
        if scene.title.trim().is_empty() {
            return Err(ContractViolation(format!("scene {} has an empty title", i)));
        }
        if scene.content.is_empty() {
            return Err(ContractViolation(format!(
                "scene {} ('{}') has no content lines",
                i, scene.title
            )));
        }
    }
    Ok(script)
}

/// Parse and validate a stage-2 terminal answer: 5-8 non-empty keywords.
pub fn parse_keywords(answer: &str) -> Result<KeywordSet, ContractViolation> {
    let normalized = normalize_terminal_answer(answer);
    let set: KeywordSet = serde_json::from_str(&normalized)
        .map_err(|e| ContractViolation(format!("keywords are not valid JSON: {}", e)))?;

    if !(5..=8).contains(&set.keywords.len()) {
        return Err(ContractViolation(format!(
            "expected 5 to 8 keywords, got {}",
            set.keywords.len()
        )));
    }
    if let Some(i) = set.keywords.iter().position(|k| k.trim().is_empty()) {
        return Err(ContractViolation(format!("keyword {} is empty", i)));
    }
    Ok(set)
}

/// Parse and validate a stage-3 terminal answer: exactly one artifact
/// descriptor per upstream keyword.
pub fn parse_manifest(
    answer: &str,
    keywords: &[String],
) -> Result<ArtifactManifest, ContractViolation> {
    let normalized = normalize_terminal_answer(answer);
    let manifest: ArtifactManifest = serde_json::from_str(&normalized)
        .map_err(|e| ContractViolation(format!("manifest is not valid JSON: {}", e)))?;

    if manifest.artifacts.len() != keywords.len() {
        return Err(ContractViolation(format!(
            "expected one artifact per keyword ({}), got {}",
            keywords.len(),
            manifest.artifacts.len()
        )));
    }

    let mut remaining: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .collect();
    for artifact in &manifest.artifacts {
        let needle = artifact.keyword.trim().to_lowercase();
        match remaining.iter().position(|k| *k == needle) {
            Some(i) => {
                remaining.swap_remove(i);
            }
            None => {
                return Err(ContractViolation(format!(
                    "artifact keyword '{}' does not match a remaining upstream keyword",
                    artifact.keyword
                )))
            }
        }
    }
    Ok(manifest)
}
