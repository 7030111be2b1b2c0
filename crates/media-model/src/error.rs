//! Structural validation errors for model types.

/// A model value violates one of its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("overlay {overlay_id:?}: {field} {reason}")]
    InvalidOverlay {
        overlay_id: String,
        field: &'static str,
        reason: String,
    },

    #[error("invalid {setting}: {reason}")]
    InvalidSetting {
        setting: &'static str,
        reason: String,
    },
}

impl ModelError {
    pub(crate) fn overlay(overlay_id: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOverlay {
            overlay_id: overlay_id.to_string(),
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn setting(setting: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting,
            reason: reason.into(),
        }
    }
}
