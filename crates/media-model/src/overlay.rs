//! Overlay elements placed on top of a media item.
//!
//! Positions are editor-canvas pixels; the compiler normalizes them.
//! The overlay's `type` and its content's `type` tag are separate fields on
//! the wire, so a mismatched pair can be deserialized and must be rejected
//! by [`Overlay::validate`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;
use crate::reference::ReferenceKind;

/// Overlay discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Image,
    Text,
    Shape,
}

/// Placement in editor-canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl OverlayPosition {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: None,
        }
    }
}

/// How an overlay composites with the layers below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
}

impl BlendMode {
    /// Wire name, as used in overlay JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// [0.0, 1.0]
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    Contain,
    Cover,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Triangle => "triangle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    /// Font family name.
    pub font: String,
    /// Font size in canvas pixels.
    pub size: f64,
    pub color: String,
    #[serde(default)]
    pub alignment: TextAlignment,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Image location. May be transient while editing.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<ImageFit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeContent {
    pub shape: ShapeKind,
    /// Fill color.
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// Stroke width in canvas pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

/// Type-specific payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayContent {
    Image(ImageContent),
    Text(TextContent),
    Shape(ShapeContent),
}

impl OverlayContent {
    pub fn kind(&self) -> OverlayKind {
        match self {
            OverlayContent::Image(_) => OverlayKind::Image,
            OverlayContent::Text(_) => OverlayKind::Text,
            OverlayContent::Shape(_) => OverlayKind::Shape,
        }
    }
}

/// When an overlay is visible, in media seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayTiming {
    pub start: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<f64>,
}

impl OverlayTiming {
    pub fn new(start: f64, duration: f64) -> Self {
        Self {
            start,
            duration,
            fade_in: None,
            fade_out: None,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A positioned, optionally time-bounded visual element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Caller-supplied stable identity.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OverlayKind,
    pub position: OverlayPosition,
    #[serde(default)]
    pub style: OverlayStyle,
    pub content: OverlayContent,
    /// `None` means visible for the whole media duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<OverlayTiming>,
}

impl Overlay {
    /// Create an overlay whose `kind` follows its content, with default style.
    pub fn new(id: impl Into<String>, position: OverlayPosition, content: OverlayContent) -> Self {
        Self {
            id: id.into(),
            kind: content.kind(),
            position,
            style: OverlayStyle::default(),
            content,
            timing: None,
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_timing(mut self, timing: OverlayTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Whether the overlay is visible at media time `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        match self.timing {
            Some(timing) => t >= timing.start && t <= timing.end(),
            None => true,
        }
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ModelError> {
        let id = self.id.as_str();

        if id.trim().is_empty() {
            return Err(ModelError::overlay(id, "id", "must not be empty"));
        }

        if self.content.kind() != self.kind {
            return Err(ModelError::overlay(
                id,
                "content",
                format!(
                    "type {:?} does not match overlay type {:?}",
                    self.content.kind(),
                    self.kind
                ),
            ));
        }

        let pos = &self.position;
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return Err(ModelError::overlay(id, "position", "x and y must be finite"));
        }
        if !(pos.width.is_finite() && pos.width > 0.0) {
            return Err(ModelError::overlay(
                id,
                "position.width",
                format!("must be > 0, got {}", pos.width),
            ));
        }
        if !(pos.height.is_finite() && pos.height > 0.0) {
            return Err(ModelError::overlay(
                id,
                "position.height",
                format!("must be > 0, got {}", pos.height),
            ));
        }
        if pos.rotation.is_some_and(|r| !r.is_finite()) {
            return Err(ModelError::overlay(id, "position.rotation", "must be finite"));
        }

        let opacity = self.style.opacity;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ModelError::overlay(
                id,
                "style.opacity",
                format!("must be within [0, 1], got {opacity}"),
            ));
        }

        if let Some(timing) = &self.timing {
            validate_timing(id, timing)?;
        }

        match &self.content {
            OverlayContent::Text(text) => {
                if text.font.trim().is_empty() {
                    return Err(ModelError::overlay(id, "content.font", "must not be empty"));
                }
                if !(text.size.is_finite() && text.size > 0.0) {
                    return Err(ModelError::overlay(
                        id,
                        "content.size",
                        format!("must be > 0, got {}", text.size),
                    ));
                }
                validate_color(id, "content.color", &text.color)?;
            }
            OverlayContent::Image(image) => {
                if ReferenceKind::classify(&image.url) == ReferenceKind::Empty {
                    return Err(ModelError::overlay(id, "content.url", "must not be empty"));
                }
            }
            OverlayContent::Shape(shape) => {
                validate_color(id, "content.color", &shape.color)?;
                if let Some(stroke) = &shape.stroke_color {
                    validate_color(id, "content.stroke_color", stroke)?;
                }
                if shape
                    .stroke_width
                    .is_some_and(|w| !(w.is_finite() && w >= 0.0))
                {
                    return Err(ModelError::overlay(
                        id,
                        "content.stroke_width",
                        "must be finite and >= 0",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn validate_timing(id: &str, timing: &OverlayTiming) -> Result<(), ModelError> {
    if !(timing.start.is_finite() && timing.start >= 0.0) {
        return Err(ModelError::overlay(
            id,
            "timing.start",
            format!("must be >= 0, got {}", timing.start),
        ));
    }
    if !(timing.duration.is_finite() && timing.duration > 0.0) {
        return Err(ModelError::overlay(
            id,
            "timing.duration",
            format!("must be > 0, got {}", timing.duration),
        ));
    }

    let fade_in = timing.fade_in.unwrap_or(0.0);
    let fade_out = timing.fade_out.unwrap_or(0.0);
    for (field, fade) in [("timing.fade_in", fade_in), ("timing.fade_out", fade_out)] {
        if !(fade.is_finite() && fade >= 0.0) {
            return Err(ModelError::overlay(id, field, format!("must be >= 0, got {fade}")));
        }
    }
    if fade_in + fade_out > timing.duration {
        return Err(ModelError::overlay(
            id,
            "timing",
            format!(
                "fades ({fade_in} + {fade_out}) exceed duration {}",
                timing.duration
            ),
        ));
    }
    Ok(())
}

fn validate_color(id: &str, field: &'static str, color: &str) -> Result<(), ModelError> {
    if color.trim().is_empty() {
        return Err(ModelError::overlay(id, field, "must not be empty"));
    }
    Ok(())
}

/// Partial update for [`OverlayPosition`]. Absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
}

/// Partial update for [`OverlayStyle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePatch {
    pub opacity: Option<f64>,
    pub blend_mode: Option<BlendMode>,
}

/// Partial update for an [`Overlay`].
///
/// `timing` distinguishes "leave alone" (field absent) from "clear"
/// (`"timing": null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<OverlayKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StylePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<OverlayContent>,
    #[serde(
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub timing: Option<Option<OverlayTiming>>,
}

impl OverlayPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.position.is_none()
            && self.style.is_none()
            && self.content.is_none()
            && self.timing.is_none()
    }

    /// Produce the merged overlay without touching `base`.
    /// The result is not validated.
    pub fn merged_with(&self, base: &Overlay) -> Overlay {
        let mut merged = base.clone();

        if let Some(kind) = self.kind {
            merged.kind = kind;
        }
        if let Some(p) = &self.position {
            let pos = &mut merged.position;
            pos.x = p.x.unwrap_or(pos.x);
            pos.y = p.y.unwrap_or(pos.y);
            pos.width = p.width.unwrap_or(pos.width);
            pos.height = p.height.unwrap_or(pos.height);
            if p.rotation.is_some() {
                pos.rotation = p.rotation;
            }
        }
        if let Some(s) = &self.style {
            merged.style.opacity = s.opacity.unwrap_or(merged.style.opacity);
            merged.style.blend_mode = s.blend_mode.unwrap_or(merged.style.blend_mode);
        }
        if let Some(content) = &self.content {
            merged.content = content.clone();
        }
        if let Some(timing) = self.timing {
            merged.timing = timing;
        }

        merged
    }
}

/// Maps a present field (including `null`) to `Some(..)`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_overlay(id: &str) -> Overlay {
        Overlay::new(
            id,
            OverlayPosition::new(100.0, 50.0, 400.0, 80.0),
            OverlayContent::Text(TextContent {
                text: "Hello".to_string(),
                font: "Inter".to_string(),
                size: 32.0,
                color: "#ffffff".to_string(),
                alignment: TextAlignment::Center,
                bold: false,
                italic: false,
            }),
        )
    }

    #[test]
    fn test_valid_overlay_passes() {
        assert!(text_overlay("title").validate().is_ok());
    }

    #[test]
    fn test_content_type_mismatch_rejected() {
        let mut overlay = text_overlay("title");
        overlay.kind = OverlayKind::Image;
        let err = overlay.validate().unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidOverlay {
                field: "content",
                ..
            }
        ));
    }

    #[test]
    fn test_non_positive_size_rejected() {
        let mut overlay = text_overlay("title");
        overlay.position.width = -10.0;
        assert!(overlay.validate().is_err());

        let mut overlay = text_overlay("title");
        overlay.position.height = 0.0;
        assert!(overlay.validate().is_err());
    }

    #[test]
    fn test_opacity_range() {
        let overlay = text_overlay("title").with_style(OverlayStyle {
            opacity: 1.5,
            blend_mode: BlendMode::Screen,
        });
        assert!(overlay.validate().is_err());
    }

    #[test]
    fn test_timing_rules() {
        assert!(text_overlay("t")
            .with_timing(OverlayTiming::new(0.0, 2.0))
            .validate()
            .is_ok());
        assert!(text_overlay("t")
            .with_timing(OverlayTiming::new(-1.0, 2.0))
            .validate()
            .is_err());
        assert!(text_overlay("t")
            .with_timing(OverlayTiming::new(1.0, 0.0))
            .validate()
            .is_err());

        let mut fading = OverlayTiming::new(0.0, 2.0);
        fading.fade_in = Some(1.5);
        fading.fade_out = Some(1.0);
        assert!(text_overlay("t").with_timing(fading).validate().is_err());
    }

    #[test]
    fn test_untimed_overlay_always_active() {
        let overlay = text_overlay("t");
        assert!(overlay.is_active_at(0.0));
        assert!(overlay.is_active_at(1e9));

        let timed = text_overlay("t").with_timing(OverlayTiming::new(2.0, 1.0));
        assert!(!timed.is_active_at(1.0));
        assert!(timed.is_active_at(2.5));
        assert!(timed.is_active_at(3.0));
    }

    #[test]
    fn test_overlay_json_shape() {
        let raw = r##"{
            "id": "logo",
            "type": "image",
            "position": {"x": 10, "y": 20, "width": 100, "height": 50},
            "style": {"opacity": 0.8, "blend_mode": "color-dodge"},
            "content": {"type": "image", "url": "https://cdn.example.com/logo.png"}
        }"##;
        let overlay: Overlay = serde_json::from_str(raw).unwrap();
        assert_eq!(overlay.kind, OverlayKind::Image);
        assert_eq!(overlay.style.blend_mode, BlendMode::ColorDodge);
        assert!(overlay.timing.is_none());
        assert!(overlay.validate().is_ok());
    }

    #[test]
    fn test_mismatched_json_deserializes_but_fails_validation() {
        let raw = r##"{
            "id": "oops",
            "type": "shape",
            "position": {"x": 0, "y": 0, "width": 10, "height": 10},
            "content": {"type": "text", "text": "hi", "font": "Inter", "size": 12, "color": "#000"}
        }"##;
        let overlay: Overlay = serde_json::from_str(raw).unwrap();
        assert!(overlay.validate().is_err());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let base = text_overlay("title");
        let patch = OverlayPatch {
            position: Some(PositionPatch {
                x: Some(5.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = patch.merged_with(&base);
        assert!((merged.position.x - 5.0).abs() < 1e-9);
        assert!((merged.position.width - base.position.width).abs() < 1e-9);
        assert_eq!(merged.content, base.content);
    }

    #[test]
    fn test_patch_timing_absent_vs_null() {
        let base = text_overlay("t").with_timing(OverlayTiming::new(1.0, 2.0));

        let keep: OverlayPatch = serde_json::from_str(r#"{"style":{"opacity":0.5}}"#).unwrap();
        assert!(keep.timing.is_none());
        assert!(keep.merged_with(&base).timing.is_some());

        let clear: OverlayPatch = serde_json::from_str(r#"{"timing":null}"#).unwrap();
        assert_eq!(clear.timing, Some(None));
        assert!(clear.merged_with(&base).timing.is_none());
    }
}
