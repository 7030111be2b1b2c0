//! Clipforge Processing Core
//!
//! The synchronous half of the pipeline:
//! - **Segmentation:** turn change-metric samples into scene intervals
//! - **Overlay model:** validated, observable overlay set for one media item
//! - **Compilation:** project overlays into ordered transform operations
//! - **Thumbnail planning:** choose thumbnail timestamps
//!
//! This crate is pure computation: no I/O and no suspension points.
//! All inputs are data; all outputs are data.

pub mod compiler;
pub mod overlay_model;
pub mod segment;
pub mod thumbnails;

pub use compiler::{CompiledBatch, DurableOnly, ReferenceResolver, TransformCompiler, UploadedRefs};
pub use overlay_model::OverlayModel;
pub use segment::{SegmentBuilder, SegmentConfig};
pub use thumbnails::plan_thumbnails;
