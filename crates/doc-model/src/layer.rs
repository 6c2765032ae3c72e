//! Layers and stacking order
//!
//! Layers are stored bottom to top; membership order inside a layer is the
//! painter's order within it. A [`LayerSet`] always holds at least one layer,
//! one of which is the default layer that receives new and orphaned elements.

use crate::element::{Element, ElementId};
use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    members: Vec<ElementId>,
}

impl Layer {
    fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), visible: true, locked: false, members: Vec::new() }
    }

    pub fn members(&self) -> &[ElementId] {
        &self.members
    }

    pub fn contains(&self, element: &ElementId) -> bool {
        self.members.contains(element)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSet {
    layers: Vec<Layer>,
    default_layer: LayerId,
    next_id: u64,
}

impl Default for LayerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerSet {
    pub fn new() -> Self {
        let default_layer = LayerId(1);
        Self { layers: vec![Layer::new(default_layer, "Layer 1")], default_layer, next_id: 1 }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn default_layer(&self) -> LayerId {
        self.default_layer
    }

    /// Add a new layer on top of the stack.
    pub fn add(&mut self, name: impl Into<String>) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.push(Layer::new(id, name));
        id
    }

    /// Remove a layer; its members move to the default layer. If the removed
    /// layer was the default, the bottom-most remaining layer becomes default.
    pub fn remove(&mut self, id: LayerId) -> ModelResult<()> {
        let index = self.index_of(id)?;
        if self.layers.len() == 1 {
            return Err(ModelError::LastLayer);
        }

        let removed = self.layers.remove(index);
        if removed.id == self.default_layer {
            self.default_layer = self.layers[0].id;
        }

        let default_index = self.index_of(self.default_layer)?;
        self.layers[default_index].members.extend(removed.members);
        Ok(())
    }

    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) -> ModelResult<()> {
        self.layer_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> ModelResult<()> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> ModelResult<()> {
        self.layer_mut(id)?.locked = locked;
        Ok(())
    }

    pub fn set_default(&mut self, id: LayerId) -> ModelResult<()> {
        self.index_of(id)?;
        self.default_layer = id;
        Ok(())
    }

    /// Move a layer one step toward the top. Returns false when already on top.
    pub fn raise(&mut self, id: LayerId) -> ModelResult<bool> {
        let index = self.index_of(id)?;
        if index + 1 >= self.layers.len() {
            return Ok(false);
        }
        self.layers.swap(index, index + 1);
        Ok(true)
    }

    /// Move a layer one step toward the bottom. Returns false when already at
    /// the bottom.
    pub fn lower(&mut self, id: LayerId) -> ModelResult<bool> {
        let index = self.index_of(id)?;
        if index == 0 {
            return Ok(false);
        }
        self.layers.swap(index, index - 1);
        Ok(true)
    }

    /// Put an element on top of `layer`, detaching it from any other layer.
    pub fn assign(&mut self, element: ElementId, layer: LayerId) -> ModelResult<()> {
        let index = self.index_of(layer)?;
        if self.layers[index].locked {
            return Err(ModelError::LayerLocked(layer));
        }
        self.unassign(&element);
        self.layers[index].members.push(element);
        Ok(())
    }

    pub fn assign_default(&mut self, element: ElementId) {
        self.unassign(&element);
        if let Some(layer) = self.layers.iter_mut().find(|layer| layer.id == self.default_layer) {
            layer.members.push(element);
        }
    }

    pub fn unassign(&mut self, element: &ElementId) -> Option<LayerId> {
        for layer in &mut self.layers {
            if let Some(position) = layer.members.iter().position(|id| id == element) {
                layer.members.remove(position);
                return Some(layer.id);
            }
        }
        None
    }

    pub fn layer_of(&self, element: &ElementId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.contains(element))
    }

    /// Unassigned elements count as visible.
    pub fn is_element_visible(&self, element: &ElementId) -> bool {
        self.layer_of(element).map(|layer| layer.visible).unwrap_or(true)
    }

    pub fn is_element_locked(&self, element: &ElementId) -> bool {
        self.layer_of(element).map(|layer| layer.locked).unwrap_or(false)
    }

    /// Move an element to the top of its own layer.
    pub fn bring_to_front(&mut self, element: &ElementId) -> bool {
        for layer in &mut self.layers {
            if let Some(position) = layer.members.iter().position(|id| id == element) {
                let id = layer.members.remove(position);
                layer.members.push(id);
                return true;
            }
        }
        false
    }

    /// Move an element to the bottom of its own layer.
    pub fn send_to_back(&mut self, element: &ElementId) -> bool {
        for layer in &mut self.layers {
            if let Some(position) = layer.members.iter().position(|id| id == element) {
                let id = layer.members.remove(position);
                layer.members.insert(0, id);
                return true;
            }
        }
        false
    }

    /// Sort elements bottom to top: by layer, then by membership order.
    /// Unassigned elements are painted last, in their given order.
    pub fn stacking_order<'a>(&self, elements: &[&'a Element]) -> Vec<&'a Element> {
        let mut rank: HashMap<&ElementId, (usize, usize)> = HashMap::new();
        for (layer_index, layer) in self.layers.iter().enumerate() {
            for (member_index, id) in layer.members.iter().enumerate() {
                rank.insert(id, (layer_index, member_index));
            }
        }

        let mut ordered: Vec<(usize, &'a Element)> = elements.iter().copied().enumerate().collect();
        ordered.sort_by_key(|(original, element)| {
            rank.get(&element.id).copied().unwrap_or((self.layers.len(), *original))
        });
        ordered.into_iter().map(|(_, element)| element).collect()
    }

    /// Drop members that no longer exist and give unassigned elements to the
    /// default layer, preserving the order of `live`.
    pub fn reconcile(&mut self, live: &[ElementId]) {
        let live_set: HashSet<&ElementId> = live.iter().collect();
        for layer in &mut self.layers {
            layer.members.retain(|id| live_set.contains(id));
        }

        let assigned: HashSet<ElementId> =
            self.layers.iter().flat_map(|layer| layer.members.iter().cloned()).collect();
        let orphans: Vec<ElementId> =
            live.iter().filter(|id| !assigned.contains(*id)).cloned().collect();
        for id in orphans {
            self.assign_default(id);
        }
    }

    fn index_of(&self, id: LayerId) -> ModelResult<usize> {
        self.layers.iter().position(|layer| layer.id == id).ok_or(ModelError::LayerNotFound(id))
    }

    fn layer_mut(&mut self, id: LayerId) -> ModelResult<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id).ok_or(ModelError::LayerNotFound(id))
    }
}
