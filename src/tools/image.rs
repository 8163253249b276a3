//! Illustration placeholder tool.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Generate an educational vector-style illustration for a keyword.
///
/// Placeholder implementation: writes the illustration prompt to a file under
/// `generated_images/` and reports its path. A real image generation backend
/// replaces this behind the same result schema.
pub struct GenerateIllustration;

#[async_trait]
impl Tool for GenerateIllustration {
    fn name(&self) -> &str {
        "generate_illustration"
    }

    fn description(&self) -> &str {
        "Generate a flat-design educational illustration for a keyword. Returns the image file path. Pass the keyword index so files sort in keyword order."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keyword": {
                    "type": "string",
                    "description": "The visual concept to illustrate"
                },
                "index": {
                    "type": "integer",
                    "description": "Zero-based keyword index"
                }
            },
            "required": ["keyword", "index"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let keyword = args["keyword"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'keyword' argument"))?;
        let index = args["index"]
            .as_u64()
            .ok_or_else(|| anyhow::anyhow!("Missing 'index' argument"))?;

        let images_dir = workspace.join("generated_images");
        tokio::fs::create_dir_all(&images_dir).await?;

        let prompt = format!(
            "Create a clean, educational vector-style illustration of {}. \
             Use bright, engaging colors with a modern flat design style, \
             clear and simple enough for educational video content.",
            keyword
        );

        let stem = format!("{}_{}", keyword.to_lowercase().replace(' ', "_"), index + 1);
        let image_file = format!("generated_images/{}.txt", stem);
        tokio::fs::write(
            images_dir.join(format!("{}.txt", stem)),
            format!("Image prompt: {}\nKeyword: {}\n", prompt, keyword),
        )
        .await?;

        Ok(json!({
            "image_file": image_file,
            "keyword": keyword,
        })
        .to_string())
    }
}
