//! Content-aware crop settings.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CropMode {
    #[default]
    Auto,
    Face,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "4:3")]
    Standard4x3,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn ratio(&self) -> f64 {
        match self {
            AspectRatio::Landscape16x9 => 16.0 / 9.0,
            AspectRatio::Portrait9x16 => 9.0 / 16.0,
            AspectRatio::Standard4x3 => 4.0 / 3.0,
            AspectRatio::Square => 1.0,
        }
    }
}

/// Normalized focus point, `(0.5, 0.5)` is the frame center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

/// Where the crop window is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CropGravity {
    Auto,
    Face,
    Object,
    Focus { x: f64, y: f64 },
}

impl CropGravity {
    /// Provider gravity value.
    pub fn as_directive(&self) -> &'static str {
        match self {
            CropGravity::Auto => "auto",
            CropGravity::Face => "face",
            CropGravity::Object => "auto:object",
            CropGravity::Focus { .. } => "xy_center",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartCropSettings {
    pub mode: CropMode,
    pub aspect_ratio: AspectRatio,
    /// 100..=4096
    pub width: u32,
    /// 100..=4096
    pub height: u32,
    /// Overrides `mode` when set.
    pub custom_focus: Option<FocusPoint>,
}

impl Default for SmartCropSettings {
    fn default() -> Self {
        Self {
            mode: CropMode::Auto,
            aspect_ratio: AspectRatio::Landscape16x9,
            width: 1280,
            height: 720,
            custom_focus: None,
        }
    }
}

impl SmartCropSettings {
    pub fn validate(&self) -> Result<(), ModelError> {
        for (setting, value) in [("crop width", self.width), ("crop height", self.height)] {
            if !(100..=4096).contains(&value) {
                return Err(ModelError::setting(
                    setting,
                    format!("must be within 100..=4096, got {value}"),
                ));
            }
        }
        if let Some(focus) = self.custom_focus {
            if !(0.0..=1.0).contains(&focus.x) || !(0.0..=1.0).contains(&focus.y) {
                return Err(ModelError::setting(
                    "crop focus",
                    format!("must be normalized, got ({}, {})", focus.x, focus.y),
                ));
            }
        }
        Ok(())
    }

    pub fn gravity(&self) -> CropGravity {
        if let Some(focus) = self.custom_focus {
            return CropGravity::Focus {
                x: focus.x,
                y: focus.y,
            };
        }
        match self.mode {
            CropMode::Auto => CropGravity::Auto,
            CropMode::Face => CropGravity::Face,
            CropMode::Object => CropGravity::Object,
        }
    }

    /// Validate and turn into a request for the media-processing capability.
    pub fn to_request(&self) -> Result<CropRequest, ModelError> {
        self.validate()?;
        Ok(CropRequest {
            width: self.width,
            height: self.height,
            gravity: self.gravity(),
        })
    }
}

/// Fill-crop parameters sent to the media-processing capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    pub width: u32,
    pub height: u32,
    pub gravity: CropGravity,
}
