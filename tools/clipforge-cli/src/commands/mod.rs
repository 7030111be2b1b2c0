//! Subcommand implementations.

pub mod compile;
pub mod config;
pub mod crop;
pub mod detect;
pub mod render;
pub mod segment;
pub mod thumbnails;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use clipforge_common::config::AppConfig;
use clipforge_media_model::reference::MediaRef;
use clipforge_pipeline::local::ManifestProcessor;
use clipforge_pipeline::orchestrator::OrchestratorConfig;
use clipforge_pipeline::{PipelineJob, PipelineOrchestrator, PipelineOutcome, ProcessorHandle};
use clipforge_processing_core::compiler::UploadedRefs;

const DEFAULT_MANIFEST_DIR: &str = ".clipforge/manifests";

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))
}

/// Optional upload map; missing means nothing was uploaded.
pub fn read_uploads(path: Option<&Path>) -> anyhow::Result<UploadedRefs> {
    match path {
        Some(path) => read_json(path),
        None => Ok(UploadedRefs::new()),
    }
}

/// Pretty-print `value` to stdout, or to `output` when given.
pub fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Run one job through a fresh orchestrator backed by the manifest processor.
///
/// Ctrl-C cancels the run. The processor is shut down either way.
pub async fn run_job(
    config: &AppConfig,
    manifest_dir: Option<PathBuf>,
    media: String,
    job: PipelineJob,
) -> anyhow::Result<PipelineOutcome> {
    let dir = manifest_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_DIR));
    let processor = ProcessorHandle::shared(ManifestProcessor::new(&dir));

    let mut orchestrator = PipelineOrchestrator::new(Arc::clone(&processor))
        .with_config(OrchestratorConfig::from_defaults(&config.pipeline))
        .on_progress(|update| {
            tracing::info!(phase = ?update.phase, percent = update.percent, "Progress");
        });

    let cancel = orchestrator.cancel_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    let result = orchestrator.start(MediaRef::new(media), job).await;
    ctrl_c.abort();

    if let Err(e) = processor.shutdown().await {
        tracing::warn!(error = %e, "Processor shutdown failed");
    }

    if let Some(summary) = orchestrator.summary() {
        if let Some(elapsed) = summary.elapsed() {
            tracing::debug!(
                state = ?summary.state,
                elapsed_ms = elapsed.num_milliseconds(),
                "Run finished"
            );
        }
    }

    result.map_err(|e| anyhow::anyhow!("Pipeline failed: {e}"))
}
