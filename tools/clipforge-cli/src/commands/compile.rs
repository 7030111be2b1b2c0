//! Compile overlays into transform operations without applying them.

use std::path::PathBuf;

use serde_json::json;

use clipforge_media_model::geometry::Resolution;
use clipforge_media_model::operation::TimeRange;
use clipforge_media_model::overlay::Overlay;
use clipforge_pipeline::directive::encode_directives;
use clipforge_processing_core::compiler::TransformCompiler;
use clipforge_processing_core::overlay_model::OverlayModel;

use super::{read_json, read_uploads, write_output};

pub fn run(
    overlays: PathBuf,
    width: u32,
    height: u32,
    at: Option<f64>,
    uploads: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let overlays: Vec<Overlay> = read_json(&overlays)?;
    let model = OverlayModel::from_overlays(overlays)?;
    let compiler = TransformCompiler::new(read_uploads(uploads.as_deref())?);
    let resolution = Resolution::new(width, height);

    let batch = match at {
        Some(t) => compiler.compile_window(model.list(), resolution, TimeRange::at(t))?,
        None => compiler.compile(model.list(), resolution)?,
    };

    for issue in &batch.skipped {
        tracing::warn!(overlay = %issue.overlay_id, "Skipped: {}", issue.to_error());
    }

    let report = json!({
        "signature": batch.signature()?,
        "directives": encode_directives(&batch.operations, resolution),
        "operations": batch.operations,
        "skipped": batch.skipped,
    });
    write_output(&report, output.as_deref())
}
