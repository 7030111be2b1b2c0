//! Overlay list to ordered transform operations.
//!
//! Compilation is a pure projection: pixel positions become normalized
//! geometry, timing becomes an activation window, and list order becomes
//! z-order. Identical input always yields an identical batch, so a batch
//! signature can be compared across backends.
//!
//! Overlays compile one at a time. An overlay that cannot compile is
//! reported in [`CompiledBatch::skipped`] and the rest proceed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use clipforge_common::error::{ClipforgeError, ClipforgeResult};
use clipforge_media_model::geometry::{normalize_degrees, NormalizedRect, Resolution};
use clipforge_media_model::operation::{
    normalize_color, ActivationWindow, ImageRef, OperationPayload, ShapeDescriptor, Stroke,
    TextRun, TimeRange, TransformOperation,
};
use clipforge_media_model::overlay::{ImageFit, Overlay, OverlayContent};
use clipforge_media_model::reference::is_durable;

/// Resolves an image overlay's reference to one a backend can fetch.
pub trait ReferenceResolver {
    /// `None` when `reference` has no durable equivalent.
    fn resolve(&self, overlay_id: &str, reference: &str) -> Option<String>;
}

/// Accepts durable references as-is and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurableOnly;

impl ReferenceResolver for DurableOnly {
    fn resolve(&self, _overlay_id: &str, reference: &str) -> Option<String> {
        is_durable(reference).then(|| reference.trim().to_string())
    }
}

/// Maps transient references to the durable ids they were uploaded as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadedRefs {
    uploads: BTreeMap<String, String>,
}

impl UploadedRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `transient` was uploaded as `durable`.
    pub fn insert(&mut self, transient: impl Into<String>, durable: impl Into<String>) {
        self.uploads.insert(transient.into(), durable.into());
    }

    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }
}

impl ReferenceResolver for UploadedRefs {
    fn resolve(&self, overlay_id: &str, reference: &str) -> Option<String> {
        if let Some(durable) = DurableOnly.resolve(overlay_id, reference) {
            return Some(durable);
        }
        self.uploads
            .get(reference.trim())
            .filter(|uploaded| is_durable(uploaded))
            .cloned()
    }
}

/// Why an overlay was left out of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CompileIssueKind {
    ContentUnresolved { reference: String },
    Invalid { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileIssue {
    pub overlay_id: String,
    #[serde(flatten)]
    pub kind: CompileIssueKind,
}

impl CompileIssue {
    pub fn to_error(&self) -> ClipforgeError {
        match &self.kind {
            CompileIssueKind::ContentUnresolved { reference } => {
                ClipforgeError::ContentUnresolved {
                    overlay_id: self.overlay_id.clone(),
                    reference: reference.clone(),
                }
            }
            CompileIssueKind::Invalid { message } => ClipforgeError::validation(format!(
                "overlay {:?}: {message}",
                self.overlay_id
            )),
        }
    }
}

/// Compiled operations plus the overlays that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledBatch {
    pub operations: Vec<TransformOperation>,
    pub skipped: Vec<CompileIssue>,
}

impl CompiledBatch {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Canonical JSON: struct fields in declaration order, no whitespace.
    pub fn canonical_json(&self) -> ClipforgeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// FNV-1a 64 of the canonical JSON, as 16 hex digits.
    pub fn signature(&self) -> ClipforgeResult<String> {
        Ok(format!("{:016x}", fnv1a_64(self.canonical_json()?.as_bytes())))
    }
}

/// FNV-1a 64-bit hash.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Projects overlays into transform operations.
pub struct TransformCompiler<R = DurableOnly> {
    resolver: R,
}

impl TransformCompiler<DurableOnly> {
    pub fn with_defaults() -> Self {
        Self::new(DurableOnly)
    }
}

impl Default for TransformCompiler<DurableOnly> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<R: ReferenceResolver> TransformCompiler<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Compile every overlay, bottom to top.
    pub fn compile(
        &self,
        overlays: &[Overlay],
        resolution: Resolution,
    ) -> ClipforgeResult<CompiledBatch> {
        self.compile_filtered(overlays, resolution, None)
    }

    /// Compile only overlays whose activation intersects `range`.
    pub fn compile_window(
        &self,
        overlays: &[Overlay],
        resolution: Resolution,
        range: TimeRange,
    ) -> ClipforgeResult<CompiledBatch> {
        if range.start_secs.is_nan() || range.end_secs.is_nan() || range.end_secs < range.start_secs
        {
            return Err(ClipforgeError::validation(format!(
                "invalid time range [{}, {}]",
                range.start_secs, range.end_secs
            )));
        }
        self.compile_filtered(overlays, resolution, Some(range))
    }

    fn compile_filtered(
        &self,
        overlays: &[Overlay],
        resolution: Resolution,
        range: Option<TimeRange>,
    ) -> ClipforgeResult<CompiledBatch> {
        if !resolution.is_valid() {
            return Err(ClipforgeError::validation(format!(
                "media resolution must be non-zero, got {}x{}",
                resolution.width, resolution.height
            )));
        }

        let mut batch = CompiledBatch::default();

        for overlay in overlays {
            if let Err(e) = overlay.validate() {
                tracing::debug!(id = %overlay.id, error = %e, "Skipping invalid overlay");
                batch.skipped.push(CompileIssue {
                    overlay_id: overlay.id.clone(),
                    kind: CompileIssueKind::Invalid {
                        message: e.to_string(),
                    },
                });
                continue;
            }

            let window = activation_window(overlay);
            if let Some(range) = &range {
                if !window.intersects(range) {
                    continue;
                }
            }

            let payload = match self.payload(overlay, resolution) {
                Ok(payload) => payload,
                Err(issue) => {
                    tracing::debug!(id = %overlay.id, issue = ?issue.kind, "Skipping overlay");
                    batch.skipped.push(issue);
                    continue;
                }
            };

            let pos = &overlay.position;
            batch.operations.push(TransformOperation {
                sequence: batch.operations.len(),
                overlay_id: overlay.id.clone(),
                geometry: NormalizedRect::from_pixels(
                    pos.x, pos.y, pos.width, pos.height, resolution,
                ),
                rotation_deg: normalize_degrees(pos.rotation.unwrap_or(0.0)),
                opacity: overlay.style.opacity,
                blend_mode: overlay.style.blend_mode,
                window,
                payload,
            });
        }

        tracing::debug!(
            operations = batch.operations.len(),
            skipped = batch.skipped.len(),
            "Compiled overlays"
        );

        Ok(batch)
    }

    fn payload(
        &self,
        overlay: &Overlay,
        resolution: Resolution,
    ) -> Result<OperationPayload, CompileIssue> {
        let height = resolution.height.max(1) as f64;

        let payload = match &overlay.content {
            OverlayContent::Text(text) => OperationPayload::Text(TextRun {
                text: text.text.clone(),
                font_family: text.font.trim().to_string(),
                font_size: text.size / height,
                color: normalize_color(&text.color),
                alignment: text.alignment,
                bold: text.bold,
                italic: text.italic,
            }),
            OverlayContent::Image(image) => {
                let reference = self
                    .resolver
                    .resolve(&overlay.id, &image.url)
                    .ok_or_else(|| CompileIssue {
                        overlay_id: overlay.id.clone(),
                        kind: CompileIssueKind::ContentUnresolved {
                            reference: image.url.clone(),
                        },
                    })?;
                OperationPayload::Image(ImageRef {
                    reference,
                    fit: image.fit.unwrap_or(ImageFit::Contain),
                })
            }
            OverlayContent::Shape(shape) => OperationPayload::Shape(ShapeDescriptor {
                shape: shape.shape,
                fill: normalize_color(&shape.color),
                stroke: shape.stroke_color.as_ref().map(|color| Stroke {
                    color: normalize_color(color),
                    width: shape.stroke_width.unwrap_or(1.0) / height,
                }),
            }),
        };

        Ok(payload)
    }
}

fn activation_window(overlay: &Overlay) -> ActivationWindow {
    match overlay.timing {
        Some(timing) => ActivationWindow::Span {
            start_secs: timing.start,
            duration_secs: timing.duration,
            fade_in_secs: timing.fade_in.unwrap_or(0.0),
            fade_out_secs: timing.fade_out.unwrap_or(0.0),
        },
        None => ActivationWindow::Always,
    }
}

#[cfg(test)]
mod tests {
    use clipforge_media_model::overlay::{
        ImageContent, OverlayPosition, OverlayTiming, ShapeContent, ShapeKind, TextAlignment,
        TextContent,
    };
    use clipforge_media_model::OverlayKind;

    use super::*;

    const HD: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };

    fn shape(id: &str) -> Overlay {
        Overlay::new(
            id,
            OverlayPosition::new(960.0, 540.0, 480.0, 270.0),
            OverlayContent::Shape(ShapeContent {
                shape: ShapeKind::Circle,
                color: "#FF0000".to_string(),
                stroke_color: Some("#00FF00".to_string()),
                stroke_width: Some(10.8),
            }),
        )
    }

    fn text(id: &str) -> Overlay {
        Overlay::new(
            id,
            OverlayPosition::new(0.0, 0.0, 1920.0, 108.0),
            OverlayContent::Text(TextContent {
                text: "Title".to_string(),
                font: "Inter".to_string(),
                size: 54.0,
                color: "#FFFFFF".to_string(),
                alignment: TextAlignment::Center,
                bold: false,
                italic: false,
            }),
        )
    }

    fn image(id: &str, url: &str) -> Overlay {
        Overlay::new(
            id,
            OverlayPosition::new(0.0, 0.0, 100.0, 100.0),
            OverlayContent::Image(ImageContent {
                url: url.to_string(),
                fit: None,
            }),
        )
    }

    #[test]
    fn test_order_and_always_windows() {
        let batch = TransformCompiler::with_defaults()
            .compile(&[shape("s"), text("t")], HD)
            .unwrap();
        assert!(batch.is_complete());
        let kinds: Vec<_> = batch.operations.iter().map(|op| op.kind()).collect();
        assert_eq!(kinds, vec![OverlayKind::Shape, OverlayKind::Text]);
        assert!(batch.operations.iter().all(|op| op.window.is_always()));
        assert_eq!(batch.operations[0].sequence, 0);
        assert_eq!(batch.operations[1].sequence, 1);
    }

    #[test]
    fn test_geometry_is_normalized() {
        let batch = TransformCompiler::with_defaults()
            .compile(&[shape("s")], HD)
            .unwrap();
        let op = &batch.operations[0];
        assert!((op.geometry.x - 0.5).abs() < 1e-9);
        assert!((op.geometry.y - 0.5).abs() < 1e-9);
        assert!((op.geometry.w - 0.25).abs() < 1e-9);
        assert!((op.geometry.h - 0.25).abs() < 1e-9);

        match &op.payload {
            OperationPayload::Shape(desc) => {
                assert_eq!(desc.fill, "ff0000");
                let stroke = desc.stroke.as_ref().unwrap();
                assert!((stroke.width - 0.01).abs() < 1e-9);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_text_size_relative_to_height() {
        let batch = TransformCompiler::with_defaults()
            .compile(&[text("t")], HD)
            .unwrap();
        match &batch.operations[0].payload {
            OperationPayload::Text(run) => {
                assert!((run.font_size - 0.05).abs() < 1e-9);
                assert_eq!(run.color, "ffffff");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_timing_becomes_span() {
        let overlay = text("t").with_timing(OverlayTiming::new(1.5, 3.0));
        let batch = TransformCompiler::with_defaults()
            .compile(&[overlay], HD)
            .unwrap();
        assert_eq!(batch.operations[0].window.end_secs(), Some(4.5));
    }

    #[test]
    fn test_transient_image_is_skipped_rest_compiles() {
        let overlays = vec![
            shape("s"),
            image("local", "blob:http://localhost/abc"),
            image("remote", "https://cdn.example.com/logo.png"),
        ];
        let batch = TransformCompiler::with_defaults()
            .compile(&overlays, HD)
            .unwrap();
        assert_eq!(batch.operations.len(), 2);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].overlay_id, "local");
        assert!(matches!(
            batch.skipped[0].to_error(),
            ClipforgeError::ContentUnresolved { .. }
        ));
        assert_eq!(batch.operations[1].sequence, 1);
    }

    #[test]
    fn test_uploaded_refs_resolve_transient() {
        let mut uploads = UploadedRefs::new();
        uploads.insert("blob:http://localhost/abc", "overlays/logo_v2");
        let compiler = TransformCompiler::new(uploads);
        let batch = compiler
            .compile(&[image("local", "blob:http://localhost/abc")], HD)
            .unwrap();
        assert!(batch.is_complete());
        match &batch.operations[0].payload {
            OperationPayload::Image(img) => assert_eq!(img.reference, "overlays/logo_v2"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_invalid_overlay_is_reported_not_fatal() {
        let mut bad = text("bad");
        bad.position.width = 0.0;
        let batch = TransformCompiler::with_defaults()
            .compile(&[bad, shape("s")], HD)
            .unwrap();
        assert_eq!(batch.operations.len(), 1);
        assert!(matches!(
            batch.skipped[0].kind,
            CompileIssueKind::Invalid { .. }
        ));
    }

    #[test]
    fn test_zero_resolution_is_rejected() {
        let result = TransformCompiler::with_defaults().compile(&[shape("s")], Resolution::new(0, 720));
        assert!(result.is_err());
    }

    #[test]
    fn test_compile_window_filters_by_activation() {
        let overlays = vec![
            shape("always"),
            text("early").with_timing(OverlayTiming::new(0.0, 2.0)),
            text("late").with_timing(OverlayTiming::new(5.0, 2.0)),
        ];
        let batch = TransformCompiler::with_defaults()
            .compile_window(&overlays, HD, TimeRange::at(6.0))
            .unwrap();
        let ids: Vec<_> = batch.operations.iter().map(|op| op.overlay_id.as_str()).collect();
        assert_eq!(ids, vec!["always", "late"]);
    }

    #[test]
    fn test_signature_is_stable_and_order_sensitive() {
        let compiler = TransformCompiler::with_defaults();
        let a = compiler.compile(&[shape("s"), text("t")], HD).unwrap();
        let b = compiler.compile(&[shape("s"), text("t")], HD).unwrap();
        let swapped = compiler.compile(&[text("t"), shape("s")], HD).unwrap();
        assert_eq!(a.signature().unwrap(), b.signature().unwrap());
        assert_ne!(a.signature().unwrap(), swapped.signature().unwrap());
        assert_eq!(a.signature().unwrap().len(), 16);
    }

    #[test]
    fn test_fnv_reference_values() {
        assert_eq!(fnv1a_64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63dc4c8601ec8c);
    }
}
