//! Narration audio placeholder tool.

use std::path::Path;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};

use super::Tool;

const FILENAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a narration audio clip for one scene's text.
///
/// Placeholder implementation: writes a sidecar text file describing the clip
/// under `static/audio/` and reports the would-be mp3 path. A real
/// text-to-speech backend replaces this behind the same result schema.
pub struct GenerateAudioClip;

#[async_trait]
impl Tool for GenerateAudioClip {
    fn name(&self) -> &str {
        "generate_audio_clip"
    }

    fn description(&self) -> &str {
        "Generate a narration audio file for a text segment. Returns the audio file path. Pass the scene index so files sort in scene order."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The narration text to synthesize"
                },
                "index": {
                    "type": "integer",
                    "description": "Zero-based scene index"
                }
            },
            "required": ["text", "index"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;
        let index = args["index"]
            .as_u64()
            .ok_or_else(|| anyhow::anyhow!("Missing 'index' argument"))?;

        let audio_dir = workspace.join("static/audio");
        tokio::fs::create_dir_all(&audio_dir).await?;

        let suffix: String = {
            let mut rng = rand::thread_rng();
            (0..4)
                .map(|_| FILENAME_CHARSET[rng.gen_range(0..FILENAME_CHARSET.len())] as char)
                .collect()
        };

        let audio_file = format!("static/audio/{}_{}.mp3", index, suffix);
        let placeholder = audio_dir.join(format!("{}_{}.txt", index, suffix));
        tokio::fs::write(
            &placeholder,
            format!("Audio placeholder for: {}\n", text),
        )
        .await?;

        Ok(json!({
            "audio_file": audio_file,
            "text": text,
        })
        .to_string())
    }
}
