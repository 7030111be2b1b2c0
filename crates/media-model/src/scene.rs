//! Scene records and detection results.

use serde::{Deserialize, Serialize};

/// A contiguous time interval of the source treated as one visual unit.
///
/// Intervals are half-open: `[start_secs, end_secs)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Stable identifier derived from the scene's position (`scene-0001`, ...).
    pub id: String,

    #[serde(rename = "start_time")]
    pub start_secs: f64,

    #[serde(rename = "end_time")]
    pub end_secs: f64,

    /// Change score of the sample that opened this scene.
    /// `None` for the first scene, which starts at zero without a cut.
    #[serde(default)]
    pub cut_score: Option<f64>,

    /// Confidence reported by an analysis capability. Unknown until supplied.
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Durable thumbnail reference, filled in by enrichment.
    #[serde(default, rename = "thumbnail")]
    pub thumbnail_ref: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Scene {
    /// Create an un-enriched scene.
    pub fn new(index: usize, start_secs: f64, end_secs: f64, cut_score: Option<f64>) -> Self {
        Self {
            id: scene_id(index),
            start_secs,
            end_secs,
            cut_score,
            confidence: None,
            thumbnail_ref: None,
            tags: vec![],
            description: None,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }

    /// Midpoint of the interval.
    pub fn midpoint_secs(&self) -> f64 {
        self.start_secs + self.duration_secs() / 2.0
    }
}

/// Identifier for the scene at `index` (zero-based) in emission order.
pub fn scene_id(index: usize) -> String {
    format!("scene-{:04}", index + 1)
}

/// Technical metadata of the analysed media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container/codec short name (e.g. "mp4").
    pub format: String,
}

impl Default for MediaMetadata {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fps: 30.0,
            format: "mp4".to_string(),
        }
    }
}

/// The immutable output of a scene detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDetectionResult {
    pub scenes: Vec<Scene>,

    /// Media duration in seconds.
    pub duration: f64,

    /// Always equal to `scenes.len()`.
    pub total_scenes: usize,

    pub metadata: MediaMetadata,
}

impl SceneDetectionResult {
    pub fn new(scenes: Vec<Scene>, duration: f64, metadata: MediaMetadata) -> Self {
        Self {
            total_scenes: scenes.len(),
            scenes,
            duration,
            metadata,
        }
    }

    /// The scene covering time `t`, if any.
    pub fn scene_at(&self, t: f64) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.contains(t))
    }

    /// Check ordering, non-overlap, and full coverage of `[0, duration)`.
    /// Returns the list of violations (empty when well-formed).
    pub fn check_partition(&self) -> Vec<String> {
        let mut problems = vec![];

        if self.total_scenes != self.scenes.len() {
            problems.push(format!(
                "total_scenes {} does not match {} scenes",
                self.total_scenes,
                self.scenes.len()
            ));
        }

        let mut cursor = 0.0;
        for scene in &self.scenes {
            if scene.start_secs.is_nan() || scene.start_secs < 0.0 || scene.start_secs >= scene.end_secs {
                problems.push(format!(
                    "{} has invalid interval [{}, {})",
                    scene.id, scene.start_secs, scene.end_secs
                ));
            }
            if scene.start_secs != cursor {
                problems.push(format!(
                    "{} starts at {} but previous scene ended at {}",
                    scene.id, scene.start_secs, cursor
                ));
            }
            cursor = scene.end_secs;
        }

        if !self.scenes.is_empty() && cursor != self.duration {
            problems.push(format!(
                "last scene ends at {} but duration is {}",
                cursor, self.duration
            ));
        }

        problems
    }
}

/// User-facing options for a scene detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDetectionOptions {
    /// Minimum scene length; closer cuts are merged (seconds).
    pub min_scene_duration_secs: f64,

    /// Change score a sample must exceed to propose a cut.
    pub threshold: f64,

    /// Ask the enrichment capability for tags and a description.
    pub detect_content: bool,

    /// Ask the enrichment capability for a thumbnail per scene.
    pub generate_thumbnails: bool,

    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
}

impl Default for SceneDetectionOptions {
    fn default() -> Self {
        Self {
            min_scene_duration_secs: 2.0,
            threshold: 0.3,
            detect_content: true,
            generate_thumbnails: true,
            thumbnail_width: 320,
            thumbnail_height: 180,
        }
    }
}

impl SceneDetectionOptions {
    /// Whether any enrichment work is requested.
    pub fn wants_enrichment(&self) -> bool {
        self.detect_content || self.generate_thumbnails
    }
}
