//! # clipforge-pipeline
//!
//! Drives the pure processing core against external capabilities:
//!
//! - [`orchestrator`]: one-shot state machine with progress and cancellation
//! - [`capability`]: media-processor and enricher contracts, owned processor handle
//! - [`progress`]: phase-weighted, monotonic progress reporting
//! - [`directive`]: URL-transformation directive encoding
//! - [`local`]: manifest-writing processor for offline runs

pub mod capability;
pub mod directive;
pub mod local;
pub mod orchestrator;
pub mod progress;

pub use capability::{MediaProcessor, ProcessorHandle, SceneEnricher};
pub use orchestrator::{
    OrchestratorConfig, PipelineJob, PipelineOrchestrator, PipelineOutcome, PipelineState,
};
