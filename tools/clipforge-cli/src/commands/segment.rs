//! Segment a change-metric stream into scenes.

use std::path::PathBuf;

use clipforge_common::config::AppConfig;
use clipforge_media_model::samples::{parse_samples, parse_scene_metadata};
use clipforge_media_model::scene::MediaMetadata;
use clipforge_processing_core::segment::{SegmentBuilder, SegmentConfig};

use super::write_output;

pub fn run(
    config: &AppConfig,
    samples: PathBuf,
    duration: Option<f64>,
    min_scene: Option<f64>,
    threshold: Option<f64>,
    metadata_dump: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&samples)
        .map_err(|_| anyhow::anyhow!("Samples file not found: {}", samples.display()))?;

    let samples = if metadata_dump {
        parse_scene_metadata(&content)
    } else {
        parse_samples(&content).map_err(|e| anyhow::anyhow!("Failed to parse samples: {e}"))?
    };
    tracing::debug!(samples = samples.len(), "Loaded samples");

    let builder = SegmentBuilder::new(SegmentConfig::new(
        min_scene.unwrap_or(config.segmentation.min_scene_duration_secs),
        threshold.unwrap_or(config.segmentation.threshold),
    ));
    builder.config().validate()?;

    let result = builder.detect(&samples, duration, MediaMetadata::default())?;
    write_output(&result, output.as_deref())
}
