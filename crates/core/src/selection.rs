//! Active tool and selected element set

use crate::store::DocumentStore;
use doc_model::{AnnotationKind, ElementId, ShapeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Editing tool; exactly one is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Select,
    Text,
    Image,
    Shape(ShapeKind),
    Pen,
    Highlighter,
    Annotation(AnnotationKind),
}

impl Tool {
    /// Tools that accumulate a point polyline instead of a bounding box
    pub fn is_freehand(&self) -> bool {
        matches!(self, Tool::Pen | Tool::Highlighter | Tool::Annotation(AnnotationKind::Freehand))
    }

    /// Tools that create an element from a pointer drag
    pub fn draws(&self) -> bool {
        matches!(self, Tool::Shape(_) | Tool::Pen | Tool::Highlighter | Tool::Annotation(_))
    }
}

/// Unordered set of selected element ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// With `additive` false, replace the selection with `id`; otherwise
    /// toggle `id`'s membership.
    pub fn select(&mut self, id: ElementId, additive: bool) {
        if !additive {
            self.ids.clear();
            self.ids.insert(id);
            return;
        }
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn deselect(&mut self, id: &ElementId) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in no particular order
    pub fn ids(&self) -> Vec<ElementId> {
        self.ids.iter().cloned().collect()
    }

    /// Drop ids whose elements no longer exist, e.g. after undo.
    pub fn retain_existing(&mut self, store: &DocumentStore) {
        self.ids.retain(|id| store.contains(id));
    }
}
