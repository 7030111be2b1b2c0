//! Compile overlays and apply them through the pipeline.

use std::path::PathBuf;

use clipforge_common::config::AppConfig;
use clipforge_media_model::geometry::Resolution;
use clipforge_media_model::overlay::Overlay;
use clipforge_pipeline::PipelineJob;

use super::{read_json, read_uploads, run_job, write_output};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    overlays: PathBuf,
    media: String,
    width: u32,
    height: u32,
    uploads: Option<PathBuf>,
    manifest_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let overlays: Vec<Overlay> = read_json(&overlays)?;
    let uploads = read_uploads(uploads.as_deref())?;

    let outcome = run_job(
        config,
        manifest_dir,
        media,
        PipelineJob::ApplyOverlays {
            overlays,
            resolution: Resolution::new(width, height),
            uploads,
        },
    )
    .await?;

    write_output(&outcome, output.as_deref())
}
