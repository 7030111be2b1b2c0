//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ClipforgeError, ClipforgeResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scene segmentation defaults.
    pub segmentation: SegmentationDefaults,

    /// Thumbnail extraction defaults.
    pub thumbnails: ThumbnailDefaults,

    /// Orchestration behavior.
    pub pipeline: PipelineDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default segmentation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationDefaults {
    /// Cuts closer than this to the previous cut are merged (seconds).
    pub min_scene_duration_secs: f64,

    /// Change score a sample must exceed to propose a cut.
    pub threshold: f64,
}

/// Default thumbnail dimensions for per-scene thumbnails.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailDefaults {
    pub width: u32,
    pub height: u32,
}

/// Orchestrator defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineDefaults {
    /// Per-call timeout for external capabilities. `None` waits forever.
    pub external_timeout_secs: Option<u64>,

    /// Run the enrichment capability (tags/description) on detected scenes.
    pub detect_content: bool,

    /// Request a thumbnail per detected scene.
    pub generate_thumbnails: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipforge_pipeline=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for SegmentationDefaults {
    fn default() -> Self {
        Self {
            min_scene_duration_secs: 2.0,
            threshold: 0.3,
        }
    }
}

impl Default for ThumbnailDefaults {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
        }
    }
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            external_timeout_secs: Some(300),
            detect_content: true,
            generate_thumbnails: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    ///
    /// The fallback is only reported through `tracing`; callers that load
    /// before a subscriber exists should use [`AppConfig::load_checked_from`].
    pub fn load_from(config_path: &std::path::Path) -> Self {
        Self::load_checked_from(config_path).unwrap_or_else(|e| {
            tracing::warn!("{e}; using defaults");
            Self::default()
        })
    }

    /// Load config from the standard location, reporting why a present file
    /// was rejected.
    pub fn load_checked() -> ClipforgeResult<Self> {
        Self::load_checked_from(&config_file_path())
    }

    /// Load config from an explicit path. A missing file yields defaults; an
    /// unreadable, unparseable, or invalid one is a [`ClipforgeError::Config`].
    pub fn load_checked_from(config_path: &std::path::Path) -> ClipforgeResult<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path).map_err(|e| {
            ClipforgeError::config(format!(
                "failed to read config at {}: {e}",
                config_path.display()
            ))
        })?;
        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            ClipforgeError::config(format!(
                "failed to parse config at {}: {e}",
                config_path.display()
            ))
        })?;
        config.validate().map_err(|e| {
            ClipforgeError::config(format!(
                "ignoring config at {}: {e}",
                config_path.display()
            ))
        })?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ClipforgeResult<()> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> ClipforgeResult<()> {
        let seg = &self.segmentation;
        if !seg.min_scene_duration_secs.is_finite() || seg.min_scene_duration_secs < 0.0 {
            return Err(ClipforgeError::config(format!(
                "segmentation.min_scene_duration_secs must be a finite value >= 0, got {}",
                seg.min_scene_duration_secs
            )));
        }
        if !seg.threshold.is_finite() {
            return Err(ClipforgeError::config("segmentation.threshold must be finite"));
        }
        if self.thumbnails.width == 0 || self.thumbnails.height == 0 {
            return Err(ClipforgeError::config(
                "thumbnails.width and thumbnails.height must be non-zero",
            ));
        }
        if self.pipeline.external_timeout_secs == Some(0) {
            return Err(ClipforgeError::config(
                "pipeline.external_timeout_secs must be positive (omit it to disable)",
            ));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipforge").join("config.json")
}
