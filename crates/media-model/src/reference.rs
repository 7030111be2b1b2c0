//! Media and content references.
//!
//! A durable reference survives the editing session: an `http(s)` URL or a
//! provider content id such as `overlays/logo_v2`. Transient references
//! (`blob:`, `data:`, `file:`) only mean something inside the process or
//! browser that minted them and must be uploaded before a backend can use them.

use serde::{Deserialize, Serialize};

/// Classification of a reference string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Remote URL or provider content id.
    Durable,
    /// Client-local handle that a backend cannot dereference.
    Transient,
    /// Blank or whitespace-only.
    Empty,
}

const TRANSIENT_SCHEMES: &[&str] = &["blob:", "data:", "file:", "filesystem:"];

impl ReferenceKind {
    pub fn classify(reference: &str) -> Self {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let lower = trimmed.to_ascii_lowercase();
        if TRANSIENT_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
            return Self::Transient;
        }
        Self::Durable
    }
}

/// Whether `reference` can be handed to a remote backend as-is.
pub fn is_durable(reference: &str) -> bool {
    ReferenceKind::classify(reference) == ReferenceKind::Durable
}

const REMOTE_SCHEMES: &[&str] = &["http://", "https://"];

/// Whether `reference` is an `http(s)` URL rather than a provider content id.
pub fn is_remote_url(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    REMOTE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Reference to the source media item a job operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output produced by the media-processing capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputRef(pub String);

impl OutputRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_durable(&self) -> bool {
        is_durable(&self.0)
    }
}

impl std::fmt::Display for OutputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
