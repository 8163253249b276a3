//! Stock media lookup tool (mock backend).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Look up a stock video clip and poster image for a search query.
///
/// The lookup is a deterministic mock: the clip id is derived from a hash of
/// the query, so the same query always resolves to the same URLs. Swap this
/// implementation for a real stock media API behind the same result schema.
pub struct SearchStockMedia;

#[async_trait]
impl Tool for SearchStockMedia {
    fn name(&self) -> &str {
        "search_stock_media"
    }

    fn description(&self) -> &str {
        "Search for a stock video clip matching a query. Returns a video URL and a poster image URL. Use one focused query per scene or keyword."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query describing the desired footage"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;

        let slug = slugify(query);
        let clip_id = stable_id(query);

        Ok(json!({
            "media_url": format!("https://media.gettyimages.com/id/{}/video/{}.mp4", clip_id, slug),
            "poster_url": format!("https://media.gettyimages.com/id/{}/video/{}.jpg", clip_id, slug),
            "query": query,
        })
        .to_string())
    }
}

/// Lowercase, hyphen-joined, URL-safe form of a query.
fn slugify(query: &str) -> String {
    let hyphenated = query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    urlencoding::encode(&hyphenated).into_owned()
}

fn stable_id(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish() % 10_000_000
}
