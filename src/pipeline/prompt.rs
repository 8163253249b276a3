//! Stage instruction templates.
//!
//! Each template embeds the upstream payload and fixes the exact output
//! schema the stage contract validates against.

use super::contract::ContractViolation;

/// Stage 1: topic -> structured script.
pub fn script_instruction(topic: &str, language: &str, scene_count: usize) -> String {
    format!(
        r#"You are an expert educational content creator with extensive knowledge of science topics.

Your task: write an engaging short video script about this topic: "{topic}"

Requirements:
- Use your built-in knowledge of the topic to keep the content accurate
- Write in language: {language}
- Produce exactly {scene_count} scenes, each roughly 30-40 seconds of narration
- Include interactive elements like questions for the audience
- Return JSON with strictly these keys: {{"scenes": [{{"title": "", "content": ["line1", "line2"]}}]}}
- Return only the JSON document, no commentary

Create the script now."#,
        topic = topic,
        language = language,
        scene_count = scene_count
    )
}

/// Stage 2: script text -> illustration search keywords.
pub fn keywords_instruction(script_json: &str) -> String {
    format!(
        r#"You are an expert at analyzing video scripts and identifying visual elements for illustrations.

Analyze this video script and extract search keywords for finding vector illustrations for its content.

Script:
{script_json}

Requirements:
- Extract 5 to 8 relevant keywords
- Focus on visual elements, concepts, and objects mentioned in the script
- Keywords should suit educational vector illustrations
- Return JSON strictly like this: {{"keywords": ["keyword1", "keyword2"]}}
- Return only the JSON document, no commentary

Provide the keywords now."#,
        script_json = script_json
    )
}

/// Stage 3: keywords -> generated-artifact manifest.
pub fn assets_instruction(keywords: &[String]) -> String {
    let keyword_list = keywords
        .iter()
        .enumerate()
        .map(|(i, k)| format!("{}. {}", i + 1, k))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You produce media assets for an educational video using your tools.

Keywords:
{keyword_list}

For each keyword, in order:
1. Call search_stock_media to find a stock clip for the keyword
2. Call generate_illustration with the keyword and its zero-based index
3. Optionally call generate_audio_clip for narration of the keyword's concept

When every keyword has its assets, return JSON strictly like this, with exactly one artifact object per keyword:
{{"artifacts": [{{"keyword": "", "media_url": "", "poster_url": "", "audio_file": "", "image_file": ""}}]}}

Copy each keyword into its artifact object unchanged. Use the file paths and URLs your tools returned. Omit fields you did not produce. Return only the JSON document, no commentary."#,
        keyword_list = keyword_list
    )
}

/// Corrective follow-up appended to a stage session after a contract
/// violation; the model sees its own prior malformed answer above it.
pub fn corrective_instruction(violation: &ContractViolation) -> String {
    format!(
        r#"Your previous answer was rejected: {violation}.

Produce the answer again, following the required JSON schema exactly. Return only the JSON document, with the same field names and no surrounding commentary."#,
        violation = violation
    )
}
