//! Thumbnail generation settings.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How thumbnail timestamps are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailInterval {
    /// Evenly spaced across the duration.
    #[default]
    Uniform,
    /// Start of the longest detected scenes.
    Smart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailLayout {
    #[default]
    Grid,
    Filmstrip,
    Storyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Jpg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }
}

/// Options for a thumbnail run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailOptions {
    /// 1..=20
    pub count: u32,
    pub layout: ThumbnailLayout,
    pub interval: ThumbnailInterval,
    /// 100..=3840
    pub width: u32,
    /// 100..=2160
    pub height: u32,
    /// 1..=100
    pub quality: u8,
    pub format: ImageFormat,
    pub include_timestamps: bool,
    /// Run scene segmentation first so `Smart` has scenes to pick from.
    pub smart_detection: bool,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            count: 6,
            layout: ThumbnailLayout::Grid,
            interval: ThumbnailInterval::Uniform,
            width: 320,
            height: 180,
            quality: 80,
            format: ImageFormat::Jpg,
            include_timestamps: true,
            smart_detection: false,
        }
    }
}

impl ThumbnailOptions {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(1..=20).contains(&self.count) {
            return Err(ModelError::setting(
                "thumbnail count",
                format!("must be within 1..=20, got {}", self.count),
            ));
        }
        if !(100..=3840).contains(&self.width) {
            return Err(ModelError::setting(
                "thumbnail width",
                format!("must be within 100..=3840, got {}", self.width),
            ));
        }
        if !(100..=2160).contains(&self.height) {
            return Err(ModelError::setting(
                "thumbnail height",
                format!("must be within 100..=2160, got {}", self.height),
            ));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ModelError::setting(
                "thumbnail quality",
                format!("must be within 1..=100, got {}", self.quality),
            ));
        }
        Ok(())
    }
}

/// Parameters for one thumbnail request to the media-processing capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    pub timestamp_secs: f64,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub format: ImageFormat,
}

/// A generated thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailResult {
    pub url: String,
    pub timestamp: f64,
}
