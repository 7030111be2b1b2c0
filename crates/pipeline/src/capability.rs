//! External capability contracts and the owned processor handle.
//!
//! The core never decodes media itself. A [`MediaProcessor`] applies compiled
//! operations, crops, and grabs thumbnails; a [`SceneEnricher`] adds tags,
//! descriptions, and thumbnails to detected scenes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock, RwLockReadGuard};

use clipforge_common::error::{ClipforgeError, ClipforgeResult};
use clipforge_media_model::crop::CropRequest;
use clipforge_media_model::geometry::Resolution;
use clipforge_media_model::operation::TransformOperation;
use clipforge_media_model::reference::{is_durable, MediaRef, OutputRef};
use clipforge_media_model::scene::Scene;
use clipforge_media_model::thumbnail::ThumbnailRequest;

/// Backend that executes work against media it can reach.
#[async_trait::async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// One-time setup (load a codec binding, open a client).
    async fn init(&mut self) -> ClipforgeResult<()>;

    /// Apply `operations` in order, bottom first, for an output of
    /// `resolution`. Returns a durable output.
    async fn apply_transforms(
        &self,
        media: &MediaRef,
        resolution: Resolution,
        operations: &[TransformOperation],
    ) -> ClipforgeResult<OutputRef>;

    async fn crop(&self, media: &MediaRef, request: &CropRequest) -> ClipforgeResult<OutputRef>;

    async fn thumbnail(
        &self,
        media: &MediaRef,
        request: &ThumbnailRequest,
    ) -> ClipforgeResult<OutputRef>;

    /// Release resources. Called at most once, after a successful `init`.
    async fn shutdown(&mut self) -> ClipforgeResult<()>;
}

/// What the enricher is asked to produce for a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRequest {
    pub detect_content: bool,
    /// `(width, height)` when a thumbnail is wanted.
    pub thumbnail_size: Option<(u32, u32)>,
}

/// Fields an enricher may fill in. Absent values leave the scene untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneEnrichment {
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub thumbnail_ref: Option<String>,
    pub confidence: Option<f64>,
}

impl SceneEnrichment {
    /// Merge into `scene`. Non-durable thumbnails and out-of-range
    /// confidences are dropped.
    pub fn apply_to(self, scene: &mut Scene) {
        if !self.tags.is_empty() {
            scene.tags = self.tags;
        }
        if self.description.is_some() {
            scene.description = self.description;
        }
        match self.thumbnail_ref {
            Some(thumbnail) if is_durable(&thumbnail) => scene.thumbnail_ref = Some(thumbnail),
            Some(thumbnail) => {
                tracing::warn!(scene = %scene.id, %thumbnail, "Ignoring non-durable thumbnail")
            }
            None => {}
        }
        if let Some(confidence) = self.confidence.filter(|c| (0.0..=1.0).contains(c)) {
            scene.confidence = Some(confidence);
        }
    }
}

/// Optional capability that describes scenes.
#[async_trait::async_trait]
pub trait SceneEnricher: Send + Sync {
    fn name(&self) -> &str;

    async fn enrich(
        &self,
        media: &MediaRef,
        scene: &Scene,
        request: &EnrichmentRequest,
    ) -> ClipforgeResult<SceneEnrichment>;
}

/// Explicitly owned processor with a lazy, once-only init and an explicit
/// teardown. Share it between orchestrators with [`Arc`].
pub struct ProcessorHandle {
    name: String,
    processor: RwLock<Box<dyn MediaProcessor>>,
    ready: OnceCell<()>,
    /// Set under the write lock once `init` succeeded and until teardown.
    live: AtomicBool,
    closed: AtomicBool,
}

impl ProcessorHandle {
    pub fn new(processor: impl MediaProcessor + 'static) -> Self {
        Self::from_boxed(Box::new(processor))
    }

    pub fn from_boxed(processor: Box<dyn MediaProcessor>) -> Self {
        Self {
            name: processor.name().to_string(),
            processor: RwLock::new(processor),
            ready: OnceCell::new(),
            live: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn shared(processor: impl MediaProcessor + 'static) -> Arc<Self> {
        Arc::new(Self::new(processor))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.initialized()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Initialize the processor if that has not happened yet.
    ///
    /// Concurrent callers wait for the same init. A failed init is retried by
    /// the next caller.
    pub async fn ready(&self) -> ClipforgeResult<()> {
        if self.is_closed() {
            return Err(ClipforgeError::invalid_state(format!(
                "{} processor has been shut down",
                self.name
            )));
        }

        self.ready
            .get_or_try_init(|| async {
                let mut processor = self.processor.write().await;
                if self.is_closed() {
                    return Err(ClipforgeError::invalid_state(format!(
                        "{} processor has been shut down",
                        self.name
                    )));
                }
                tracing::info!(processor = %self.name, "Initializing media processor");
                processor.init().await?;
                self.live.store(true, Ordering::SeqCst);
                Ok::<(), ClipforgeError>(())
            })
            .await?;
        Ok(())
    }

    /// Borrow the initialized processor.
    pub async fn processor(&self) -> ClipforgeResult<RwLockReadGuard<'_, Box<dyn MediaProcessor>>> {
        self.ready().await?;
        Ok(self.processor.read().await)
    }

    /// Tear the processor down. Idempotent; later `ready` calls fail.
    pub async fn shutdown(&self) -> ClipforgeResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // An init in flight holds the write lock; wait for it to settle.
        let mut processor = self.processor.write().await;
        if !self.live.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::info!(processor = %self.name, "Shutting down media processor");
        processor.shutdown().await
    }
}

impl std::fmt::Debug for ProcessorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorHandle")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .field("closed", &self.is_closed())
            .finish()
    }
}
