//! Scene segmentation: change-metric samples to scene intervals.
//!
//! # Algorithm
//!
//! 1. Walk the samples in time order with a cursor starting at zero.
//! 2. A sample whose score exceeds the threshold **proposes** a cut.
//! 3. The cut is **accepted** only if it is at least `min_scene_duration_secs`
//!    past the cursor; otherwise it is merged into the current scene.
//! 4. After the last sample the final scene is closed at the stream end.
//!
//! The output always partitions `[0, end)` with no gaps or overlaps.

use clipforge_common::error::{ClipforgeError, ClipforgeResult};
use clipforge_media_model::samples::ChangeSample;
use clipforge_media_model::scene::{
    MediaMetadata, Scene, SceneDetectionOptions, SceneDetectionResult,
};

/// Configuration for the segment builder.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Shortest scene a cut may close (seconds). Zero disables merging.
    pub min_scene_duration_secs: f64,

    /// A sample proposes a cut when its score is strictly greater than this.
    pub threshold: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_scene_duration_secs: 2.0,
            threshold: 0.3,
        }
    }
}

impl SegmentConfig {
    pub fn new(min_scene_duration_secs: f64, threshold: f64) -> Self {
        Self {
            min_scene_duration_secs,
            threshold,
        }
    }

    pub fn from_options(options: &SceneDetectionOptions) -> Self {
        Self::new(options.min_scene_duration_secs, options.threshold)
    }

    pub fn validate(&self) -> ClipforgeResult<()> {
        if !(self.min_scene_duration_secs.is_finite() && self.min_scene_duration_secs >= 0.0) {
            return Err(ClipforgeError::segmentation_input(format!(
                "min scene duration must be finite and >= 0, got {}",
                self.min_scene_duration_secs
            )));
        }
        if self.threshold.is_nan() {
            return Err(ClipforgeError::segmentation_input("threshold must not be NaN"));
        }
        Ok(())
    }
}

/// Turns a change-metric sample stream into scenes.
pub struct SegmentBuilder {
    config: SegmentConfig,
}

impl SegmentBuilder {
    pub fn new(config: SegmentConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SegmentConfig::default())
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Segment `samples` into scenes covering `[0, end)`.
    ///
    /// `end` is `duration_secs` when given, otherwise the last sample's
    /// timestamp. With no samples a duration is required.
    pub fn build(
        &self,
        samples: &[ChangeSample],
        duration_secs: Option<f64>,
    ) -> ClipforgeResult<Vec<Scene>> {
        self.config.validate()?;
        validate_samples(samples, duration_secs)?;

        let end = stream_end(samples, duration_secs)?;
        let min_duration = self.config.min_scene_duration_secs;

        let mut scenes = Vec::new();
        let mut cursor = 0.0_f64;
        let mut opening_score: Option<f64> = None;

        for sample in samples {
            if sample.score <= self.config.threshold {
                continue;
            }

            let t = sample.timestamp_secs;
            if t <= cursor || t >= end {
                tracing::debug!(t, cursor, end, "Ignoring cut outside the open scene");
                continue;
            }

            if t - cursor < min_duration {
                tracing::debug!(
                    t,
                    gap = t - cursor,
                    min_duration,
                    "Merging cut into current scene"
                );
                continue;
            }

            tracing::debug!(t, score = sample.score, "Accepted cut");
            scenes.push(Scene::new(scenes.len(), cursor, t, opening_score));
            cursor = t;
            opening_score = Some(sample.score).filter(|s| s.is_finite());
        }

        scenes.push(Scene::new(scenes.len(), cursor, end, opening_score));

        tracing::debug!(
            samples = samples.len(),
            scenes = scenes.len(),
            end,
            "Segmentation complete"
        );

        Ok(scenes)
    }

    /// Segment and wrap the scenes in a detection result.
    pub fn detect(
        &self,
        samples: &[ChangeSample],
        duration_secs: Option<f64>,
        metadata: MediaMetadata,
    ) -> ClipforgeResult<SceneDetectionResult> {
        let scenes = self.build(samples, duration_secs)?;
        let end = scenes.last().map(|s| s.end_secs).unwrap_or(0.0);
        Ok(SceneDetectionResult::new(scenes, end, metadata))
    }
}

fn validate_samples(samples: &[ChangeSample], duration_secs: Option<f64>) -> ClipforgeResult<()> {
    if let Some(duration) = duration_secs {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(ClipforgeError::segmentation_input(format!(
                "duration must be finite and > 0, got {duration}"
            )));
        }
    }

    let mut previous: Option<f64> = None;
    for (index, sample) in samples.iter().enumerate() {
        let t = sample.timestamp_secs;
        if !(t.is_finite() && t >= 0.0) {
            return Err(ClipforgeError::segmentation_input(format!(
                "sample {index} has invalid timestamp {t}"
            )));
        }
        if sample.score.is_nan() || sample.score < 0.0 {
            return Err(ClipforgeError::segmentation_input(format!(
                "sample {index} has invalid score {}",
                sample.score
            )));
        }
        if let Some(prev) = previous {
            if t < prev {
                return Err(ClipforgeError::segmentation_input(format!(
                    "sample {index} at {t}s goes back in time (previous {prev}s)"
                )));
            }
        }
        if let Some(duration) = duration_secs {
            if t > duration {
                return Err(ClipforgeError::segmentation_input(format!(
                    "sample {index} at {t}s is past the media duration {duration}s"
                )));
            }
        }
        previous = Some(t);
    }

    Ok(())
}

fn stream_end(samples: &[ChangeSample], duration_secs: Option<f64>) -> ClipforgeResult<f64> {
    let end = match (duration_secs, samples.last()) {
        (Some(duration), _) => duration,
        (None, Some(last)) => last.timestamp_secs,
        (None, None) => {
            return Err(ClipforgeError::segmentation_input(
                "empty sample stream and no media duration",
            ))
        }
    };

    if end <= 0.0 {
        return Err(ClipforgeError::segmentation_input(
            "stream ends at 0s; cannot form a scene",
        ));
    }
    Ok(end)
}
