//! Pipeline orchestration.
//!
//! A [`PipelineOrchestrator`] runs exactly one job through
//! `Idle -> Running -> {Completed, Failed, Cancelled}`. Terminal states are
//! final; build a new orchestrator per job. Cancellation is cooperative and
//! observed at the next suspension point or phase boundary. An in-flight
//! external call is dropped, which does not guarantee the remote side stops.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use clipforge_common::config::PipelineDefaults;
use clipforge_common::error::{ClipforgeError, ClipforgeResult};
use clipforge_media_model::crop::SmartCropSettings;
use clipforge_media_model::geometry::Resolution;
use clipforge_media_model::overlay::Overlay;
use clipforge_media_model::reference::{MediaRef, OutputRef};
use clipforge_media_model::samples::ChangeSample;
use clipforge_media_model::scene::{
    MediaMetadata, Scene, SceneDetectionOptions, SceneDetectionResult,
};
use clipforge_media_model::thumbnail::{ThumbnailOptions, ThumbnailRequest, ThumbnailResult};
use clipforge_processing_core::compiler::{CompiledBatch, TransformCompiler, UploadedRefs};
use clipforge_processing_core::overlay_model::OverlayModel;
use clipforge_processing_core::segment::{SegmentBuilder, SegmentConfig};
use clipforge_processing_core::thumbnails::{plan_thumbnails, thumbnail_requests};

use crate::capability::{EnrichmentRequest, ProcessorHandle, SceneEnricher};
use crate::progress::{Phase, ProgressCallback, ProgressReporter, ProgressSchedule, ProgressUpdate};

/// Lifecycle of one orchestrated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Completed | PipelineState::Failed | PipelineState::Cancelled
        )
    }
}

/// Work an orchestrator can run.
#[derive(Debug, Clone)]
pub enum PipelineJob {
    /// Segment a change-metric stream and optionally enrich the scenes.
    DetectScenes {
        samples: Vec<ChangeSample>,
        duration_secs: Option<f64>,
        metadata: MediaMetadata,
        options: SceneDetectionOptions,
    },
    /// Validate, compile, and apply an overlay list.
    ApplyOverlays {
        overlays: Vec<Overlay>,
        resolution: Resolution,
        uploads: UploadedRefs,
    },
    /// Grab thumbnails at planned timestamps.
    Thumbnails {
        duration_secs: f64,
        options: ThumbnailOptions,
        scenes: Vec<Scene>,
    },
    /// Content-aware fill crop.
    SmartCrop { settings: SmartCropSettings },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    DetectScenes,
    ApplyOverlays,
    Thumbnails,
    SmartCrop,
}

impl PipelineJob {
    pub fn kind(&self) -> JobKind {
        match self {
            PipelineJob::DetectScenes { .. } => JobKind::DetectScenes,
            PipelineJob::ApplyOverlays { .. } => JobKind::ApplyOverlays,
            PipelineJob::Thumbnails { .. } => JobKind::Thumbnails,
            PipelineJob::SmartCrop { .. } => JobKind::SmartCrop,
        }
    }
}

/// Result of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Scenes(SceneDetectionResult),
    Rendered {
        output: OutputRef,
        /// Operations sent plus overlays skipped as unresolved.
        batch: CompiledBatch,
    },
    Thumbnails { thumbnails: Vec<ThumbnailResult> },
    Cropped { output: OutputRef },
}

/// Record of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub job: JobKind,
    pub state: PipelineState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_progress: f64,
    pub error: Option<String>,
}

impl RunSummary {
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Limit for each external call. `None` waits indefinitely.
    pub external_timeout: Option<Duration>,
    pub schedule: ProgressSchedule,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            external_timeout: Some(Duration::from_secs(300)),
            schedule: ProgressSchedule::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_defaults(defaults: &PipelineDefaults) -> Self {
        Self {
            external_timeout: defaults.external_timeout_secs.map(Duration::from_secs),
            schedule: ProgressSchedule::default(),
        }
    }
}

/// Sequences the pure components against external capabilities.
pub struct PipelineOrchestrator {
    processor: Arc<ProcessorHandle>,
    enricher: Option<Arc<dyn SceneEnricher>>,
    config: OrchestratorConfig,
    state: watch::Sender<PipelineState>,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
    summary: Option<RunSummary>,
}

impl PipelineOrchestrator {
    pub fn new(processor: Arc<ProcessorHandle>) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            processor,
            enricher: None,
            config: OrchestratorConfig::default(),
            state,
            cancel: CancellationToken::new(),
            progress: None,
            summary: None,
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn SceneEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the progress callback. Invoked with non-decreasing values and
    /// never after the run reaches a terminal state.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Watch state transitions from another task.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Token that cancels this run when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Run `job` against `media`. Only valid from `Idle`.
    pub async fn start(
        &mut self,
        media: MediaRef,
        job: PipelineJob,
    ) -> ClipforgeResult<PipelineOutcome> {
        let current = self.state();
        if current != PipelineState::Idle {
            return Err(ClipforgeError::invalid_state(format!(
                "orchestrator is {current:?}; create a new one per job"
            )));
        }

        let kind = job.kind();
        self.state.send_replace(PipelineState::Running);
        self.summary = Some(RunSummary {
            job: kind,
            state: PipelineState::Running,
            started_at: Utc::now(),
            finished_at: None,
            last_progress: 0.0,
            error: None,
        });
        tracing::info!(job = ?kind, media = %media, "Pipeline started");

        let mut reporter = ProgressReporter::new(self.config.schedule, self.progress.take());
        reporter.report(Phase::Ingest, 0.0);

        let result = self.run(&media, job, &mut reporter).await;

        let terminal = match &result {
            Ok(_) => {
                reporter.finish();
                PipelineState::Completed
            }
            Err(ClipforgeError::Cancelled) => PipelineState::Cancelled,
            Err(_) => PipelineState::Failed,
        };
        reporter.close();

        if let Some(summary) = self.summary.as_mut() {
            summary.state = terminal;
            summary.finished_at = Some(Utc::now());
            summary.last_progress = reporter.last_percent();
            summary.error = result.as_ref().err().map(|e| e.to_string());
        }
        self.state.send_replace(terminal);

        match &result {
            Ok(_) => tracing::info!(job = ?kind, "Pipeline completed"),
            Err(ClipforgeError::Cancelled) => tracing::info!(job = ?kind, "Pipeline cancelled"),
            Err(e) => tracing::error!(job = ?kind, error = %e, "Pipeline failed"),
        }

        result
    }

    async fn run(
        &self,
        media: &MediaRef,
        job: PipelineJob,
        reporter: &mut ProgressReporter,
    ) -> ClipforgeResult<PipelineOutcome> {
        match job {
            PipelineJob::DetectScenes {
                samples,
                duration_secs,
                metadata,
                options,
            } => {
                self.detect_scenes(media, samples, duration_secs, metadata, options, reporter)
                    .await
            }
            PipelineJob::ApplyOverlays {
                overlays,
                resolution,
                uploads,
            } => {
                self.apply_overlays(media, overlays, resolution, uploads, reporter)
                    .await
            }
            PipelineJob::Thumbnails {
                duration_secs,
                options,
                scenes,
            } => {
                self.thumbnails(media, duration_secs, &options, &scenes, reporter)
                    .await
            }
            PipelineJob::SmartCrop { settings } => self.smart_crop(media, &settings, reporter).await,
        }
    }

    async fn detect_scenes(
        &self,
        media: &MediaRef,
        samples: Vec<ChangeSample>,
        duration_secs: Option<f64>,
        metadata: MediaMetadata,
        options: SceneDetectionOptions,
        reporter: &mut ProgressReporter,
    ) -> ClipforgeResult<PipelineOutcome> {
        let builder = SegmentBuilder::new(SegmentConfig::from_options(&options));
        builder.config().validate()?;
        self.phase_done(Phase::Ingest, reporter)?;

        let mut result = builder.detect(&samples, duration_secs, metadata)?;
        tracing::info!(scenes = result.total_scenes, "Segmentation finished");
        self.phase_done(Phase::Compile, reporter)?;

        if options.generate_thumbnails {
            let total = result.scenes.len();
            for (i, scene) in result.scenes.iter_mut().enumerate() {
                let request = ThumbnailRequest {
                    timestamp_secs: scene.start_secs,
                    width: options.thumbnail_width,
                    height: options.thumbnail_height,
                    quality: 80,
                    format: Default::default(),
                };
                match self.grab_thumbnail(media, &request).await {
                    Ok(output) => scene.thumbnail_ref = Some(output.0),
                    Err(ClipforgeError::Cancelled) => return Err(ClipforgeError::Cancelled),
                    Err(e) => {
                        tracing::warn!(scene = %scene.id, error = %e, "Scene thumbnail failed")
                    }
                }
                reporter.report(Phase::Process, (i + 1) as f64 / total as f64);
            }
        }
        self.phase_done(Phase::Process, reporter)?;

        match (&self.enricher, options.detect_content) {
            (Some(enricher), true) => {
                let request = EnrichmentRequest {
                    detect_content: true,
                    thumbnail_size: None,
                };
                let total = result.scenes.len();
                for (i, scene) in result.scenes.iter_mut().enumerate() {
                    let call = enricher.enrich(media, scene, &request);
                    match self.external(enricher.name(), call).await {
                        Ok(enrichment) => enrichment.apply_to(scene),
                        Err(ClipforgeError::Cancelled) => return Err(ClipforgeError::Cancelled),
                        Err(e) => {
                            tracing::warn!(scene = %scene.id, error = %e, "Scene enrichment failed")
                        }
                    }
                    reporter.report(Phase::Enrich, (i + 1) as f64 / total as f64);
                }
            }
            (None, true) => tracing::debug!("No enricher configured; scenes stay un-enriched"),
            _ => {}
        }

        Ok(PipelineOutcome::Scenes(result))
    }

    async fn apply_overlays(
        &self,
        media: &MediaRef,
        overlays: Vec<Overlay>,
        resolution: Resolution,
        uploads: UploadedRefs,
        reporter: &mut ProgressReporter,
    ) -> ClipforgeResult<PipelineOutcome> {
        let model = OverlayModel::from_overlays(overlays)?;
        self.phase_done(Phase::Ingest, reporter)?;

        let batch = TransformCompiler::new(uploads).compile(model.list(), resolution)?;
        if batch.operations.is_empty() {
            if let Some(issue) = batch.skipped.first() {
                return Err(issue.to_error());
            }
        }
        for issue in &batch.skipped {
            tracing::warn!(overlay = %issue.overlay_id, issue = ?issue.kind, "Overlay skipped");
        }
        tracing::info!(
            operations = batch.operations.len(),
            skipped = batch.skipped.len(),
            "Overlays compiled"
        );
        self.phase_done(Phase::Compile, reporter)?;

        let processor = self.processor.clone();
        let operations = &batch.operations;
        let output = self
            .external(self.processor.name(), async move {
                processor
                    .processor()
                    .await?
                    .apply_transforms(media, resolution, operations)
                    .await
            })
            .await?;
        let output = self.require_durable(output)?;
        self.phase_done(Phase::Process, reporter)?;

        Ok(PipelineOutcome::Rendered { output, batch })
    }

    async fn thumbnails(
        &self,
        media: &MediaRef,
        duration_secs: f64,
        options: &ThumbnailOptions,
        scenes: &[Scene],
        reporter: &mut ProgressReporter,
    ) -> ClipforgeResult<PipelineOutcome> {
        options
            .validate()
            .map_err(|e| ClipforgeError::validation(e.to_string()))?;
        self.phase_done(Phase::Ingest, reporter)?;

        let timestamps = plan_thumbnails(duration_secs, options, scenes)?;
        let requests = thumbnail_requests(&timestamps, options);
        self.phase_done(Phase::Compile, reporter)?;

        let mut thumbnails = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            let output = self.grab_thumbnail(media, request).await?;
            thumbnails.push(ThumbnailResult {
                url: output.0,
                timestamp: request.timestamp_secs,
            });
            reporter.report(Phase::Process, (i + 1) as f64 / requests.len() as f64);
        }
        self.phase_done(Phase::Process, reporter)?;

        Ok(PipelineOutcome::Thumbnails { thumbnails })
    }

    async fn smart_crop(
        &self,
        media: &MediaRef,
        settings: &SmartCropSettings,
        reporter: &mut ProgressReporter,
    ) -> ClipforgeResult<PipelineOutcome> {
        let request = settings
            .to_request()
            .map_err(|e| ClipforgeError::validation(e.to_string()))?;
        self.phase_done(Phase::Ingest, reporter)?;
        self.phase_done(Phase::Compile, reporter)?;

        let processor = self.processor.clone();
        let request = &request;
        let output = self
            .external(self.processor.name(), async move {
                processor.processor().await?.crop(media, request).await
            })
            .await?;
        let output = self.require_durable(output)?;
        self.phase_done(Phase::Process, reporter)?;

        Ok(PipelineOutcome::Cropped { output })
    }

    async fn grab_thumbnail(
        &self,
        media: &MediaRef,
        request: &ThumbnailRequest,
    ) -> ClipforgeResult<OutputRef> {
        let processor = self.processor.clone();
        let output = self
            .external(self.processor.name(), async move {
                processor.processor().await?.thumbnail(media, request).await
            })
            .await?;
        self.require_durable(output)
    }

    /// Await an external call, racing cancellation and the optional timeout.
    async fn external<T, F>(&self, capability: &str, call: F) -> ClipforgeResult<T>
    where
        F: Future<Output = ClipforgeResult<T>>,
    {
        let bounded = async {
            match self.config.external_timeout {
                Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                    ClipforgeError::external(capability, format!("timed out after {limit:?}"))
                })?,
                None => call.await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClipforgeError::Cancelled),
            result = bounded => result,
        };

        result.map_err(|e| match e {
            ClipforgeError::Cancelled | ClipforgeError::ExternalCapability { .. } => e,
            ClipforgeError::InvalidState { .. } => e,
            other => ClipforgeError::external(capability, other.to_string()),
        })
    }

    fn require_durable(&self, output: OutputRef) -> ClipforgeResult<OutputRef> {
        if output.is_durable() {
            Ok(output)
        } else {
            Err(ClipforgeError::external(
                self.processor.name(),
                format!("returned a non-durable output reference {:?}", output.as_str()),
            ))
        }
    }

    /// Close out `phase` and observe cancellation at the boundary.
    fn phase_done(&self, phase: Phase, reporter: &mut ProgressReporter) -> ClipforgeResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ClipforgeError::Cancelled);
        }
        reporter.report(phase, 1.0);
        Ok(())
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("processor", &self.processor)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}
