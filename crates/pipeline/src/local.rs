//! Local manifest processor.
//!
//! Writes each job as a content-addressed JSON manifest instead of calling a
//! remote provider. The returned `manifest:<hash>` reference is durable: the
//! same job always lands in the same file.

use std::path::{Path, PathBuf};

use serde::Serialize;

use clipforge_common::error::{ClipforgeError, ClipforgeResult};
use clipforge_media_model::crop::CropRequest;
use clipforge_media_model::geometry::Resolution;
use clipforge_media_model::operation::TransformOperation;
use clipforge_media_model::reference::{MediaRef, OutputRef};
use clipforge_media_model::thumbnail::ThumbnailRequest;
use clipforge_processing_core::compiler::fnv1a_64;

use crate::capability::MediaProcessor;
use crate::directive::encode_directives;

const SCHEME: &str = "manifest:";

/// A job as written to disk.
#[derive(Debug, Serialize)]
#[serde(tag = "job", rename_all = "snake_case")]
enum Manifest<'a> {
    Transform {
        media: &'a MediaRef,
        resolution: Resolution,
        directives: String,
        operations: &'a [TransformOperation],
    },
    Crop {
        media: &'a MediaRef,
        request: &'a CropRequest,
    },
    Thumbnail {
        media: &'a MediaRef,
        request: &'a ThumbnailRequest,
    },
}

/// [`MediaProcessor`] that records jobs as JSON files under `output_dir`.
#[derive(Debug, Clone)]
pub struct ManifestProcessor {
    output_dir: PathBuf,
}

impl ManifestProcessor {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File a `manifest:` reference points to.
    pub fn manifest_path(&self, output: &OutputRef) -> Option<PathBuf> {
        let hash = output.as_str().strip_prefix(SCHEME)?;
        if hash.len() != 16 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(self.output_dir.join(format!("{hash}.json")))
    }

    async fn write(&self, manifest: &Manifest<'_>) -> ClipforgeResult<OutputRef> {
        let json = serde_json::to_string_pretty(manifest)?;
        let hash = format!("{:016x}", fnv1a_64(json.as_bytes()));
        let path = self.output_dir.join(format!("{hash}.json"));

        tokio::fs::write(&path, json).await.map_err(|e| {
            ClipforgeError::external(
                "manifest",
                format!("failed to write {}: {e}", path.display()),
            )
        })?;

        tracing::debug!(path = %path.display(), "Wrote job manifest");
        Ok(OutputRef::new(format!("{SCHEME}{hash}")))
    }
}

#[async_trait::async_trait]
impl MediaProcessor for ManifestProcessor {
    fn name(&self) -> &str {
        "manifest"
    }

    async fn init(&mut self) -> ClipforgeResult<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                ClipforgeError::external(
                    "manifest",
                    format!("cannot create {}: {e}", self.output_dir.display()),
                )
            })
    }

    async fn apply_transforms(
        &self,
        media: &MediaRef,
        resolution: Resolution,
        operations: &[TransformOperation],
    ) -> ClipforgeResult<OutputRef> {
        self.write(&Manifest::Transform {
            media,
            resolution,
            directives: encode_directives(operations, resolution),
            operations,
        })
        .await
    }

    async fn crop(&self, media: &MediaRef, request: &CropRequest) -> ClipforgeResult<OutputRef> {
        self.write(&Manifest::Crop { media, request }).await
    }

    async fn thumbnail(
        &self,
        media: &MediaRef,
        request: &ThumbnailRequest,
    ) -> ClipforgeResult<OutputRef> {
        self.write(&Manifest::Thumbnail { media, request }).await
    }

    async fn shutdown(&mut self) -> ClipforgeResult<()> {
        Ok(())
    }
}
