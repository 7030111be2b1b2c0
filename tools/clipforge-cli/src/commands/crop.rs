//! Content-aware fill crop.

use std::path::PathBuf;

use clipforge_common::config::AppConfig;
use clipforge_media_model::crop::{CropMode, FocusPoint, SmartCropSettings};
use clipforge_pipeline::PipelineJob;

use super::{run_job, write_output};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    media: String,
    mode: String,
    width: u32,
    height: u32,
    focus: Option<String>,
    manifest_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mode = match mode.as_str() {
        "auto" => CropMode::Auto,
        "face" => CropMode::Face,
        "object" => CropMode::Object,
        other => anyhow::bail!("Unknown crop mode: {other}. Use auto, face, or object."),
    };

    let custom_focus = focus.as_deref().map(parse_focus).transpose()?;

    let settings = SmartCropSettings {
        mode,
        width,
        height,
        custom_focus,
        ..SmartCropSettings::default()
    };

    let outcome = run_job(
        config,
        manifest_dir,
        media,
        PipelineJob::SmartCrop { settings },
    )
    .await?;

    write_output(&outcome, output.as_deref())
}

fn parse_focus(value: &str) -> anyhow::Result<FocusPoint> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("Focus must be `x,y`, got {value}"))?;
    Ok(FocusPoint {
        x: x.trim().parse()?,
        y: y.trim().parse()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_focus() {
        let focus = parse_focus("0.25, 0.75").unwrap();
        assert_eq!(focus, FocusPoint { x: 0.25, y: 0.75 });
        assert!(parse_focus("0.5").is_err());
        assert!(parse_focus("a,b").is_err());
    }
}
