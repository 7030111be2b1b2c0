//! Authoritative overlay set for one media item.
//!
//! The model is single-owner: callers serialize access. Every successful
//! mutation notifies the registered observer with the full overlay list, in
//! mutation order. Failed mutations leave the model untouched.

use clipforge_common::error::{ClipforgeError, ClipforgeResult};
use clipforge_media_model::overlay::{Overlay, OverlayPatch};

/// Called with the full overlay list after each successful mutation.
pub type OverlayObserver = Box<dyn FnMut(&[Overlay]) + Send>;

/// Ordered, validated overlay collection. List order is z-order.
#[derive(Default)]
pub struct OverlayModel {
    overlays: Vec<Overlay>,
    observer: Option<OverlayObserver>,
}

impl std::fmt::Debug for OverlayModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayModel")
            .field("overlays", &self.overlays)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl OverlayModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from an existing list, validating every entry.
    pub fn from_overlays(overlays: Vec<Overlay>) -> ClipforgeResult<Self> {
        let mut model = Self::new();
        for overlay in overlays {
            model.add(overlay)?;
        }
        Ok(model)
    }

    /// Register the observer, replacing any previous one.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&[Overlay]) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Append a new overlay on top of the stack.
    pub fn add(&mut self, overlay: Overlay) -> ClipforgeResult<()> {
        overlay
            .validate()
            .map_err(|e| ClipforgeError::validation(e.to_string()))?;

        if self.position(&overlay.id).is_some() {
            return Err(ClipforgeError::validation(format!(
                "overlay {:?} already exists",
                overlay.id
            )));
        }

        tracing::debug!(id = %overlay.id, kind = ?overlay.kind, "Overlay added");
        self.overlays.push(overlay);
        self.notify();
        Ok(())
    }

    /// Apply `patch` to overlay `id`. The merged overlay is validated before
    /// it replaces the current one.
    pub fn update(&mut self, id: &str, patch: &OverlayPatch) -> ClipforgeResult<&Overlay> {
        let index = self
            .position(id)
            .ok_or_else(|| ClipforgeError::OverlayNotFound { id: id.to_string() })?;

        let merged = patch.merged_with(&self.overlays[index]);
        merged
            .validate()
            .map_err(|e| ClipforgeError::validation(e.to_string()))?;

        tracing::debug!(id, "Overlay updated");
        self.overlays[index] = merged;
        self.notify();
        Ok(&self.overlays[index])
    }

    /// Remove overlay `id`. Removing an absent id does nothing.
    pub fn remove(&mut self, id: &str) -> Option<Overlay> {
        let index = self.position(id)?;
        let removed = self.overlays.remove(index);
        tracing::debug!(id, "Overlay removed");
        self.notify();
        Some(removed)
    }

    /// Overlays in insertion order.
    pub fn list(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn get(&self, id: &str) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.overlays.iter().position(|o| o.id == id)
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.overlays);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use clipforge_media_model::overlay::{
        OverlayContent, OverlayKind, OverlayPosition, PositionPatch, ShapeContent, ShapeKind,
        StylePatch, TextAlignment, TextContent,
    };

    use super::*;

    fn shape(id: &str) -> Overlay {
        Overlay::new(
            id,
            OverlayPosition::new(0.0, 0.0, 200.0, 100.0),
            OverlayContent::Shape(ShapeContent {
                shape: ShapeKind::Rectangle,
                color: "#000000".to_string(),
                stroke_color: None,
                stroke_width: None,
            }),
        )
    }

    fn text(id: &str) -> Overlay {
        Overlay::new(
            id,
            OverlayPosition::new(10.0, 10.0, 300.0, 60.0),
            OverlayContent::Text(TextContent {
                text: "Caption".to_string(),
                font: "Inter".to_string(),
                size: 24.0,
                color: "#ffffff".to_string(),
                alignment: TextAlignment::Left,
                bold: true,
                italic: false,
            }),
        )
    }

    fn recording_model() -> (OverlayModel, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut model = OverlayModel::new();
        model.set_observer(move |overlays| {
            let ids = overlays.iter().map(|o| o.id.clone()).collect();
            sink.lock().unwrap().push(ids);
        });
        (model, seen)
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut model = OverlayModel::new();
        model.add(shape("a")).unwrap();
        model.add(text("b")).unwrap();
        model.add(shape("c")).unwrap();
        let ids: Vec<_> = model.list().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_rejects_type_mismatch() {
        let mut model = OverlayModel::new();
        let mut bad = text("t");
        bad.kind = OverlayKind::Shape;
        let err = model.add(bad).unwrap_err();
        assert!(matches!(err, ClipforgeError::Validation { .. }));
        assert!(model.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut model = OverlayModel::new();
        model.add(shape("a")).unwrap();
        assert!(model.add(text("a")).is_err());
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_failed_update_leaves_overlay_unchanged() {
        let (mut model, seen) = recording_model();
        model.add(text("t")).unwrap();
        let before = model.get("t").cloned();

        let patch = OverlayPatch {
            position: Some(PositionPatch {
                width: Some(-10.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = model.update("t", &patch).unwrap_err();
        assert!(matches!(err, ClipforgeError::Validation { .. }));
        assert_eq!(model.get("t").cloned(), before);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_update_commits_valid_patch() {
        let mut model = OverlayModel::new();
        model.add(text("t")).unwrap();
        let patch = OverlayPatch {
            style: Some(StylePatch {
                opacity: Some(0.25),
                blend_mode: None,
            }),
            ..Default::default()
        };
        let updated = model.update("t", &patch).unwrap();
        assert!((updated.style.opacity - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let mut model = OverlayModel::new();
        let err = model.update("ghost", &OverlayPatch::default()).unwrap_err();
        assert!(matches!(err, ClipforgeError::OverlayNotFound { .. }));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut model, seen) = recording_model();
        model.add(shape("a")).unwrap();
        assert!(model.remove("a").is_some());
        assert!(model.remove("a").is_none());
        assert!(model.get("a").is_none());
        // add + first remove only
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_observer_sees_mutations_in_order() {
        let (mut model, seen) = recording_model();
        model.add(shape("a")).unwrap();
        model.add(text("b")).unwrap();
        model.remove("a");

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                vec!["a".to_string()],
                vec!["a".to_string(), "b".to_string()],
                vec!["b".to_string()],
            ]
        );
    }
}
