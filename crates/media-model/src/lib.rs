//! # clipforge-media-model
//!
//! Data contracts shared by every Clipforge crate.
//!
//! - Change-metric samples consumed by segmentation
//! - Scenes and scene detection results
//! - Overlays, their content variants, and partial patches
//! - Compiled transform operations
//! - Thumbnail and smart-crop settings
//!
//! Geometry in compiled output uses normalized frame coordinates
//! where `(0,0)` is the top-left and `(1,1)` the bottom-right.

pub mod crop;
pub mod error;
pub mod geometry;
pub mod operation;
pub mod overlay;
pub mod reference;
pub mod samples;
pub mod scene;
pub mod thumbnail;

pub use error::ModelError;
pub use geometry::{NormalizedRect, Resolution};
pub use operation::{ActivationWindow, OperationPayload, TimeRange, TransformOperation};
pub use overlay::{Overlay, OverlayContent, OverlayKind, OverlayPatch};
pub use reference::{MediaRef, OutputRef, ReferenceKind};
pub use samples::ChangeSample;
pub use scene::{MediaMetadata, Scene, SceneDetectionOptions, SceneDetectionResult};
