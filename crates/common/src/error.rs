//! Error types shared across Clipforge crates.

/// Top-level error type for Clipforge operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipforgeError {
    /// Malformed overlay creation or patch. The caller must fix the input.
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Overlay not found: {id}")]
    OverlayNotFound { id: String },

    /// An overlay's content reference could not be resolved to a durable one.
    #[error("Content unresolved for overlay {overlay_id}: {reference:?}")]
    ContentUnresolved {
        overlay_id: String,
        reference: String,
    },

    /// Non-monotonic, non-finite, or empty sample stream.
    #[error("Segmentation input error: {message}")]
    SegmentationInput { message: String },

    /// The processing or enrichment capability failed or timed out.
    #[error("{capability} failed: {message}")]
    ExternalCapability { capability: String, message: String },

    /// Orchestration aborted by request. Not a failure.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ClipforgeError.
pub type ClipforgeResult<T> = Result<T, ClipforgeError>;

impl ClipforgeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn segmentation_input(msg: impl Into<String>) -> Self {
        Self::SegmentationInput {
            message: msg.into(),
        }
    }

    pub fn external(capability: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ExternalCapability {
            capability: capability.into(),
            message: msg.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error represents a requested cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
