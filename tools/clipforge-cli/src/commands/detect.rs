//! Run scene detection through the pipeline.

use std::path::PathBuf;

use clipforge_common::config::AppConfig;
use clipforge_media_model::samples::parse_samples;
use clipforge_media_model::scene::{MediaMetadata, SceneDetectionOptions};
use clipforge_pipeline::PipelineJob;

use super::{run_job, write_output};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    samples: PathBuf,
    media: String,
    duration: Option<f64>,
    (width, height, fps): (u32, u32, f64),
    no_thumbnails: bool,
    manifest_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&samples)
        .map_err(|_| anyhow::anyhow!("Samples file not found: {}", samples.display()))?;
    let samples =
        parse_samples(&content).map_err(|e| anyhow::anyhow!("Failed to parse samples: {e}"))?;

    let options = SceneDetectionOptions {
        min_scene_duration_secs: config.segmentation.min_scene_duration_secs,
        threshold: config.segmentation.threshold,
        detect_content: config.pipeline.detect_content,
        generate_thumbnails: config.pipeline.generate_thumbnails && !no_thumbnails,
        thumbnail_width: config.thumbnails.width,
        thumbnail_height: config.thumbnails.height,
    };
    let metadata = MediaMetadata {
        width,
        height,
        fps,
        ..MediaMetadata::default()
    };

    let outcome = run_job(
        config,
        manifest_dir,
        media,
        PipelineJob::DetectScenes {
            samples,
            duration_secs: duration,
            metadata,
            options,
        },
    )
    .await?;

    write_output(&outcome, output.as_deref())
}
