//! Compiled transform operations.
//!
//! A [`TransformOperation`] is the resolution-independent form of one
//! overlay: normalized geometry, an activation window, and a type-specific
//! payload. Operations are produced fresh on every compile and are never
//! edited in place.

use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedRect;
use crate::overlay::{BlendMode, ImageFit, OverlayKind, ShapeKind, TextAlignment};

/// A closed time range in media seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TimeRange {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    /// A single instant, as used for preview frames.
    pub fn at(t: f64) -> Self {
        Self::new(t, t)
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t <= self.end_secs
    }
}

/// When an operation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivationWindow {
    /// The whole media duration, whatever it turns out to be.
    Always,
    /// Active on `[start_secs, start_secs + duration_secs]`.
    Span {
        start_secs: f64,
        duration_secs: f64,
        #[serde(default)]
        fade_in_secs: f64,
        #[serde(default)]
        fade_out_secs: f64,
    },
}

impl ActivationWindow {
    pub fn is_always(&self) -> bool {
        matches!(self, ActivationWindow::Always)
    }

    /// End of the window, `None` for [`ActivationWindow::Always`].
    pub fn end_secs(&self) -> Option<f64> {
        match self {
            ActivationWindow::Always => None,
            ActivationWindow::Span {
                start_secs,
                duration_secs,
                ..
            } => Some(start_secs + duration_secs),
        }
    }

    /// Whether the window overlaps `range` (both closed).
    pub fn intersects(&self, range: &TimeRange) -> bool {
        match self {
            ActivationWindow::Always => true,
            ActivationWindow::Span {
                start_secs,
                duration_secs,
                ..
            } => *start_secs <= range.end_secs && start_secs + duration_secs >= range.start_secs,
        }
    }
}

/// Text run for a text operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub font_family: String,
    /// Font size as a fraction of the output height.
    pub font_size: f64,
    /// Lowercase hex without `#`.
    pub color: String,
    pub alignment: TextAlignment,
    pub bold: bool,
    pub italic: bool,
}

/// Resolved image reference for an image operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Durable reference the backend can fetch.
    pub reference: String,
    pub fit: ImageFit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    /// Fraction of the output height.
    pub width: f64,
}

/// Shape kind plus fill and optional stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub shape: ShapeKind,
    pub fill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
}

/// Type-specific payload of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationPayload {
    Image(ImageRef),
    Text(TextRun),
    Shape(ShapeDescriptor),
}

impl OperationPayload {
    pub fn kind(&self) -> OverlayKind {
        match self {
            OperationPayload::Image(_) => OverlayKind::Image,
            OperationPayload::Text(_) => OverlayKind::Text,
            OperationPayload::Shape(_) => OverlayKind::Shape,
        }
    }
}

/// One compiled, resolution-independent effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOperation {
    /// Z-order position: 0 renders first (bottom).
    pub sequence: usize,
    /// Overlay this operation was compiled from.
    pub overlay_id: String,
    pub geometry: NormalizedRect,
    /// Clockwise rotation in [0, 360).
    pub rotation_deg: f64,
    pub opacity: f64,
    pub blend_mode: BlendMode,
    pub window: ActivationWindow,
    pub payload: OperationPayload,
}

impl TransformOperation {
    pub fn kind(&self) -> OverlayKind {
        self.payload.kind()
    }
}

/// Canonical color form: trimmed, no leading `#`, lowercase.
pub fn normalize_color(color: &str) -> String {
    color.trim().trim_start_matches('#').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_window_serializes_as_sentinel() {
        let json = serde_json::to_value(ActivationWindow::Always).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "always"}));
    }

    #[test]
    fn test_span_intersection() {
        let window = ActivationWindow::Span {
            start_secs: 2.0,
            duration_secs: 3.0,
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
        };
        assert_eq!(window.end_secs(), Some(5.0));
        assert!(window.intersects(&TimeRange::at(2.0)));
        assert!(window.intersects(&TimeRange::at(5.0)));
        assert!(window.intersects(&TimeRange::new(0.0, 2.5)));
        assert!(!window.intersects(&TimeRange::at(5.01)));
        assert!(!window.intersects(&TimeRange::new(0.0, 1.9)));
        assert!(ActivationWindow::Always.intersects(&TimeRange::at(1e6)));
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#FFAA00"), "ffaa00");
        assert_eq!(normalize_color(" white "), "white");
    }
}
