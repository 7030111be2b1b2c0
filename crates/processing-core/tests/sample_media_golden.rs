use std::path::PathBuf;

use clipforge_media_model::geometry::Resolution;
use clipforge_media_model::operation::TimeRange;
use clipforge_media_model::overlay::Overlay;
use clipforge_media_model::samples::{parse_samples, ChangeSample};
use clipforge_processing_core::compiler::{TransformCompiler, UploadedRefs};
use clipforge_processing_core::overlay_model::OverlayModel;
use clipforge_processing_core::segment::SegmentBuilder;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-media")
        .join(name)
}

fn load_fixture_samples() -> Vec<ChangeSample> {
    let content =
        std::fs::read_to_string(fixture_path("samples.jsonl")).expect("fixture samples should be readable");
    parse_samples(&content).expect("fixture samples should parse")
}

fn load_fixture_overlays() -> Vec<Overlay> {
    let content =
        std::fs::read_to_string(fixture_path("overlays.json")).expect("fixture overlays should be readable");
    serde_json::from_str(&content).expect("fixture overlays should parse")
}

#[test]
fn default_segmentation_of_fixture_is_stable() {
    let samples = load_fixture_samples();
    assert_eq!(samples.len(), 51);

    let scenes = SegmentBuilder::with_defaults().build(&samples, None).unwrap();
    let bounds: Vec<(f64, f64)> = scenes.iter().map(|s| (s.start_secs, s.end_secs)).collect();
    assert_eq!(
        bounds,
        vec![(0.0, 4.0), (4.0, 11.5), (11.5, 19.0), (19.0, 23.5), (23.5, 25.0)]
    );

    let scores: Vec<Option<f64>> = scenes.iter().map(|s| s.cut_score).collect();
    assert_eq!(scores, vec![None, Some(0.82), Some(0.93), Some(0.77), Some(0.36)]);
    assert!(scenes.iter().all(|s| s.confidence.is_none()));
}

#[test]
fn fixture_overlays_load_into_model_in_order() {
    let model = OverlayModel::from_overlays(load_fixture_overlays()).unwrap();
    let ids: Vec<&str> = model.list().iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["lower-third-bg", "speaker-name", "logo", "sticker"]);
}

#[test]
fn fixture_compile_skips_transient_sticker_until_uploaded() {
    let overlays = load_fixture_overlays();
    let resolution = Resolution::new(1920, 1080);

    let batch = TransformCompiler::with_defaults()
        .compile(&overlays, resolution)
        .unwrap();
    assert_eq!(batch.operations.len(), 3);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].overlay_id, "sticker");

    let logo = &batch.operations[2];
    assert_eq!(logo.overlay_id, "logo");
    assert!((logo.rotation_deg - 345.0).abs() < 1e-9);

    let mut uploads = UploadedRefs::new();
    uploads.insert("blob:http://localhost:5173/7f3e2a", "overlays/sticker_v1");
    let uploaded = TransformCompiler::new(uploads)
        .compile(&overlays, resolution)
        .unwrap();
    assert!(uploaded.is_complete());
    assert_eq!(uploaded.operations.len(), 4);
    assert_ne!(batch.signature().unwrap(), uploaded.signature().unwrap());
}

#[test]
fn fixture_preview_at_five_seconds() {
    let overlays = load_fixture_overlays();
    let batch = TransformCompiler::with_defaults()
        .compile_window(&overlays, Resolution::new(1920, 1080), TimeRange::at(5.0))
        .unwrap();
    let ids: Vec<&str> = batch.operations.iter().map(|op| op.overlay_id.as_str()).collect();
    assert_eq!(ids, vec!["lower-third-bg", "speaker-name", "logo"]);
    assert!(batch.skipped.is_empty());
}
