//! Plan and grab thumbnails.

use std::path::PathBuf;

use clipforge_common::config::AppConfig;
use clipforge_media_model::scene::{Scene, SceneDetectionResult};
use clipforge_media_model::thumbnail::{ImageFormat, ThumbnailInterval, ThumbnailOptions};
use clipforge_pipeline::PipelineJob;

use super::{read_json, run_job, write_output};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    media: String,
    duration: f64,
    count: u32,
    smart: bool,
    scenes: Option<PathBuf>,
    format: String,
    manifest_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let format = match format.as_str() {
        "jpg" | "jpeg" => ImageFormat::Jpg,
        "png" => ImageFormat::Png,
        "webp" => ImageFormat::Webp,
        other => anyhow::bail!("Unknown format: {other}. Use jpg, png, or webp."),
    };

    let scenes: Vec<Scene> = match scenes {
        Some(path) => read_json::<SceneDetectionResult>(&path)?.scenes,
        None if smart => anyhow::bail!("--smart needs --scenes (output of `clipforge segment`)"),
        None => Vec::new(),
    };

    let options = ThumbnailOptions {
        count,
        interval: if smart {
            ThumbnailInterval::Smart
        } else {
            ThumbnailInterval::Uniform
        },
        width: config.thumbnails.width,
        height: config.thumbnails.height,
        format,
        ..ThumbnailOptions::default()
    };

    let outcome = run_job(
        config,
        manifest_dir,
        media,
        PipelineJob::Thumbnails {
            duration_secs: duration,
            options,
            scenes,
        },
    )
    .await?;

    write_output(&outcome, output.as_deref())
}
