//! Reelsmith - CLI Entry Point
//!
//! Runs the content pipeline for a topic and writes the result document.
//!
//! Usage: `reelsmith <topic> [language] [scene_count]`

use std::path::{Path, PathBuf};

use reelsmith::{pipeline::Pipeline, Config};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelsmith=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.default_model);

    let mut args = std::env::args().skip(1);
    let topic = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("Usage: reelsmith <topic> [language] [scene_count]"))?;
    let language = args.next().unwrap_or_else(|| "en".to_string());
    let scene_count: usize = match args.next() {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid scene count '{}': {}", raw, e))?,
        None => 7,
    };

    // Ctrl-C requests cancellation; the active stage halts at its next
    // suspension point.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Cancellation requested");
                cancel.cancel();
            }
        });
    }

    let output_dir = config.output_dir.clone();
    let pipeline = Pipeline::new(config);

    match pipeline.run(&topic, &language, scene_count, &cancel).await {
        Ok(result) => {
            let path = save_result(&output_dir, &topic, &result)?;
            info!(
                "Pipeline run {} complete: {} scenes, {} artifacts, saved to {}",
                result.run_id,
                result.script.scenes.len(),
                result.artifacts.len(),
                path.display()
            );
            Ok(())
        }
        Err(failure) => {
            error!("{}", failure);
            if failure.is_cancelled() {
                error!("Run cancelled during stage '{}'", failure.stage);
            }
            Err(failure.into())
        }
    }
}

/// Write the result document, named from a slug of the topic.
fn save_result(
    output_dir: &Path,
    topic: &str,
    result: &reelsmith::pipeline::PipelineResult,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("video_content_{}.json", topic_slug(topic)));
    std::fs::write(&path, serde_json::to_string_pretty(result)?)?;
    Ok(path)
}

fn topic_slug(topic: &str) -> String {
    topic
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
