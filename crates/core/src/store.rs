//! Authoritative document state
//!
//! The [`DocumentStore`] owns the active [`Document`] and routes every element
//! mutation through the history engine. Each successful mutation commits
//! exactly one snapshot of the post-mutation element list; mutations that
//! find nothing to change commit nothing.

use crate::history::{History, HistoryConfig};
use doc_model::{
    CommentThreads, Document, Element, ElementId, ElementPatch, LayerSet, ModelError, ModelResult,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Immutable copy of the element list at one point in history
pub type Snapshot = Arc<Vec<Element>>;

/// Owns the document and its undo/redo timeline
#[derive(Debug, Clone)]
pub struct DocumentStore {
    document: Document,
    history: History<Snapshot>,

    /// Snapshot that was current at the last save
    clean_snapshot: Snapshot,

    /// Layer and comment edits; these are outside history
    annotations_dirty: bool,
}

impl DocumentStore {
    /// Create a store for `document` with unlimited history
    pub fn new(document: Document) -> Self {
        Self::with_config(document, HistoryConfig::default())
    }

    /// Create a store with explicit history configuration
    pub fn with_config(document: Document, config: HistoryConfig) -> Self {
        let initial: Snapshot = Arc::new(document.elements.clone());
        Self {
            document,
            history: History::with_config(initial.clone(), config),
            clean_snapshot: initial,
            annotations_dirty: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Owned copy of the document for readers that outlive the borrow,
    /// such as an export running while editing continues.
    pub fn snapshot(&self) -> Document {
        self.document.clone()
    }

    /// Swap in a new document. History restarts from its element list and
    /// the store is considered clean.
    pub fn replace_document(&mut self, document: Document) {
        log::info!(
            "replacing document with {} ({} page(s), {} element(s))",
            document.file_name,
            document.page_count(),
            document.elements.len()
        );
        let initial: Snapshot = Arc::new(document.elements.clone());
        self.document = document;
        self.history.reset(initial.clone());
        self.clean_snapshot = initial;
        self.annotations_dirty = false;
    }


    pub fn elements(&self) -> &[Element] {
        &self.document.elements
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.document.element(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.element(id).is_some()
    }

    /// Elements on `page`, in insertion order
    pub fn elements_on_page(&self, page: u32) -> Vec<&Element> {
        self.document.elements.iter().filter(|element| element.page == page).collect()
    }

    /// Elements whose id is in `ids`, in insertion order. Unknown ids are
    /// ignored.
    pub fn elements_by_ids(&self, ids: &[ElementId]) -> Vec<&Element> {
        let wanted: HashSet<&ElementId> = ids.iter().collect();
        self.document.elements.iter().filter(|element| wanted.contains(&element.id)).collect()
    }

    /// Elements on `page` bottom to top, with layer order applied and
    /// hidden layers left out.
    pub fn stacking_order(&self, page: u32) -> Vec<&Element> {
        let on_page: Vec<&Element> = self
            .elements_on_page(page)
            .into_iter()
            .filter(|element| self.document.layers.is_element_visible(&element.id))
            .collect();
        self.document.layers.stacking_order(&on_page)
    }

    /// Whether the element sits on a locked layer
    pub fn is_locked(&self, id: &ElementId) -> bool {
        self.document.layers.is_element_locked(id)
    }


    /// Add an element to the document.
    ///
    /// Fails when the element's page does not exist or its id is already in
    /// use. New elements join the default layer.
    pub fn add_element(&mut self, element: Element) -> ModelResult<ElementId> {
        self.validate_new(&element, &HashSet::new())?;
        let id = element.id.clone();
        self.insert(element);
        self.commit("add");
        Ok(id)
    }

    /// Add several elements with a single history entry.
    ///
    /// Validation happens up front, so either all elements are added or none.
    pub fn add_elements(&mut self, elements: Vec<Element>) -> ModelResult<Vec<ElementId>> {
        if elements.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch: HashSet<ElementId> = HashSet::new();
        for element in &elements {
            self.validate_new(element, &batch)?;
            batch.insert(element.id.clone());
        }

        let ids: Vec<ElementId> = elements.iter().map(|element| element.id.clone()).collect();
        for element in elements {
            self.insert(element);
        }
        self.commit("add batch");
        Ok(ids)
    }

    /// Apply a partial update to one element.
    ///
    /// Returns false without touching history when the id is unknown, the
    /// patch is empty, or the patch moves the element to a missing page.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        if !self.apply_patch(id, patch) {
            return false;
        }
        self.commit("update");
        true
    }

    /// Apply several updates with a single history entry. Returns how many
    /// elements were changed.
    pub fn update_elements(&mut self, updates: &[(ElementId, ElementPatch)]) -> usize {
        let mut changed = 0;
        for (id, patch) in updates {
            if self.apply_patch(id, patch) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.commit("update batch");
        }
        changed
    }

    /// Remove one element, detaching it from its layer and dropping comment
    /// threads anchored to it. Unknown ids are a silent no-op.
    pub fn remove_element(&mut self, id: &ElementId) -> Option<Element> {
        let removed = self.detach(id)?;
        self.commit("remove");
        Some(removed)
    }

    /// Remove several elements with a single history entry
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> Vec<Element> {
        let removed: Vec<Element> = ids.iter().filter_map(|id| self.detach(id)).collect();
        if !removed.is_empty() {
            self.commit("remove batch");
        }
        removed
    }


    /// Restore the previous snapshot. Returns false when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Restore the next snapshot. Returns false when already at the newest.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History<Snapshot> {
        &self.history
    }


    /// True when the elements differ from the last saved snapshot or layers
    /// or comments were edited since.
    pub fn is_dirty(&self) -> bool {
        self.annotations_dirty || !Arc::ptr_eq(self.history.current(), &self.clean_snapshot)
    }

    pub fn mark_clean(&mut self) {
        self.clean_snapshot = self.history.current().clone();
        self.annotations_dirty = false;
    }


    pub fn layers(&self) -> &LayerSet {
        &self.document.layers
    }

    /// Edit layers in place. Layer edits are not recorded in history.
    pub fn with_layers<R>(&mut self, edit: impl FnOnce(&mut LayerSet) -> R) -> R {
        self.annotations_dirty = true;
        edit(&mut self.document.layers)
    }

    pub fn comments(&self) -> &CommentThreads {
        &self.document.comments
    }

    /// Edit comment threads in place. Comment edits are not recorded in
    /// history.
    pub fn with_comments<R>(&mut self, edit: impl FnOnce(&mut CommentThreads) -> R) -> R {
        self.annotations_dirty = true;
        edit(&mut self.document.comments)
    }


    fn validate_new(&self, element: &Element, batch: &HashSet<ElementId>) -> ModelResult<()> {
        self.document.ensure_page(element.page)?;
        if self.contains(&element.id) || batch.contains(&element.id) {
            return Err(ModelError::DuplicateElement(element.id.clone()));
        }
        Ok(())
    }

    fn insert(&mut self, element: Element) {
        self.document.layers.assign_default(element.id.clone());
        self.document.elements.push(element);
    }

    fn apply_patch(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        if let Some(page) = patch.page {
            if self.document.page(page).is_none() {
                log::warn!("ignoring update of {id}: page {page} does not exist");
                return false;
            }
        }
        match self.document.elements.iter_mut().find(|element| &element.id == id) {
            Some(element) => {
                element.apply(patch);
                true
            }
            None => {
                log::debug!("ignoring update of unknown element {id}");
                false
            }
        }
    }

    fn detach(&mut self, id: &ElementId) -> Option<Element> {
        let Some(index) = self.document.elements.iter().position(|element| &element.id == id)
        else {
            log::debug!("ignoring removal of unknown element {id}");
            return None;
        };
        let removed = self.document.elements.remove(index);
        self.document.layers.unassign(id);
        let purged = self.document.comments.purge_element(id);
        if purged > 0 {
            self.annotations_dirty = true;
        }
        Some(removed)
    }

    fn commit(&mut self, reason: &str) {
        self.history.commit(Arc::new(self.document.elements.clone()));
        log::debug!(
            "committed {reason}: {} element(s), history cursor {}",
            self.document.elements.len(),
            self.history.cursor()
        );
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        self.document.elements = snapshot.as_ref().clone();
        let live = self.document.element_ids();
        self.document.layers.reconcile(&live);
    }
}
