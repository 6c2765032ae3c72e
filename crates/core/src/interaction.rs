//! Pointer gesture state machine
//!
//! The [`InteractionController`] owns the active tool and the selection and
//! turns pointer events into document changes. Drags are buffered: while a
//! gesture is in progress only preview geometry changes, and the store sees a
//! single commit on pointer-up. Escape drops the buffer without committing.
//!
//! Pointer positions are screen-space offsets from the page's top-left
//! corner. Dividing by the zoom ratio converts them to page coordinates.

use crate::factory::ElementFactory;
use crate::manipulation::{
    angle_around, generate_handles, hit_body, normalize_degrees, HandleType,
};
use crate::selection::{Selection, Tool};
use crate::store::DocumentStore;
use doc_model::{Element, ElementId, ElementPatch, Point, Rect};
use std::collections::HashMap;

/// Pointer event in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Page under the pointer (1-based)
    pub page: u32,
    /// Offset from the page's top-left corner, in screen pixels
    pub position: Point,
    /// Shift/Cmd held: toggle selection instead of replacing it
    pub additive: bool,
}

impl PointerEvent {
    pub fn new(page: u32, x: f32, y: f32) -> Self {
        Self { page, position: Point::new(x, y), additive: false }
    }

    pub fn additive(mut self) -> Self {
        self.additive = true;
        self
    }
}

/// Observable gesture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    DraggingMove,
    DraggingResize,
    DraggingRotate,
    DraggingShape,
}

/// What a finished gesture did to the document
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Nothing happened (no gesture, or the pointer never moved)
    None,
    /// Geometry of this many elements was committed
    Updated(usize),
    /// A drawing gesture produced a new element
    Created(ElementId),
    /// A drawing gesture was too small and was dropped
    Discarded,
}

#[derive(Debug, Clone)]
enum Gesture {
    Idle,
    Move {
        start: Point,
        originals: Vec<(ElementId, Rect)>,
    },
    Resize {
        start: Point,
        element: ElementId,
        handle: HandleType,
        original: Rect,
    },
    Rotate {
        element: ElementId,
        center: Point,
        start_angle: f32,
        original_rotation: f32,
    },
    Draw {
        tool: Tool,
        page: u32,
        start: Point,
        current: Point,
        points: Vec<Point>,
    },
}

/// Tool, selection, and in-flight gesture for one editor session
#[derive(Debug, Clone)]
pub struct InteractionController {
    tool: Tool,
    selection: Selection,
    gesture: Gesture,
    /// Buffered geometry for the elements being dragged
    preview: HashMap<ElementId, ElementPatch>,
    factory: ElementFactory,
    /// Zoom as a ratio (1.0 = 100%)
    zoom: f32,
}

impl InteractionController {
    pub fn new(factory: ElementFactory) -> Self {
        Self {
            tool: Tool::Select,
            selection: Selection::new(),
            gesture: Gesture::Idle,
            preview: HashMap::new(),
            factory,
            zoom: 1.0,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. Leaving the select tool clears the selection, and any
    /// gesture in progress is cancelled.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        self.cancel();
        if self.tool == Tool::Select {
            self.selection.clear();
        }
        log::debug!("tool {:?} -> {:?}", self.tool, tool);
        self.tool = tool;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the zoom ratio used to convert pointer deltas
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    pub fn factory(&self) -> &ElementFactory {
        &self.factory
    }

    pub fn state(&self) -> GestureState {
        match self.gesture {
            Gesture::Idle => GestureState::Idle,
            Gesture::Move { .. } => GestureState::DraggingMove,
            Gesture::Resize { .. } => GestureState::DraggingResize,
            Gesture::Rotate { .. } => GestureState::DraggingRotate,
            Gesture::Draw { .. } => GestureState::DraggingShape,
        }
    }

    /// Buffered geometry for an element being dragged
    pub fn preview(&self, id: &ElementId) -> Option<&ElementPatch> {
        self.preview.get(id)
    }

    /// The element as it should be displayed, preview applied
    pub fn displayed(&self, element: &Element) -> Element {
        let mut shown = element.clone();
        if let Some(patch) = self.preview.get(&element.id) {
            shown.apply(patch);
        }
        shown
    }

    /// Page-space bounds of a drawing gesture in progress
    pub fn draft_bounds(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::Draw { tool, start, current, points, .. } => {
                if tool.is_freehand() {
                    Rect::bounding(points)
                } else {
                    Some(Rect::from_corners(*start, *current))
                }
            }
            _ => None,
        }
    }

    pub fn pointer_down(&mut self, store: &mut DocumentStore, event: PointerEvent) -> GestureOutcome {
        self.cancel();
        let point = self.to_page(event.position);

        match self.tool {
            Tool::Select => {
                self.begin_select_gesture(store, event, point);
                GestureOutcome::None
            }
            Tool::Text => {
                let element = self.factory.text(event.page, point, "Text");
                match store.add_element(element) {
                    Ok(id) => GestureOutcome::Created(id),
                    Err(err) => {
                        log::warn!("could not place text: {err}");
                        GestureOutcome::None
                    }
                }
            }
            Tool::Image => GestureOutcome::None,
            tool => {
                self.gesture = Gesture::Draw {
                    tool,
                    page: event.page,
                    start: point,
                    current: point,
                    points: vec![point],
                };
                GestureOutcome::None
            }
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent) {
        let point = self.to_page(event.position);
        let zoom = self.zoom;

        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Move { start, originals } => {
                let (dx, dy) = screen_delta(*start, event.position, zoom);
                self.preview = originals
                    .iter()
                    .map(|(id, rect)| (id.clone(), ElementPatch::position(rect.x + dx, rect.y + dy)))
                    .collect();
            }
            Gesture::Resize { start, element, handle, original } => {
                let (dx, dy) = screen_delta(*start, event.position, zoom);
                let bounds = handle.resize(*original, dx, dy);
                self.preview.clear();
                self.preview.insert(element.clone(), ElementPatch::bounds(bounds));
            }
            Gesture::Rotate { element, center, start_angle, original_rotation } => {
                let angle = angle_around(*center, point);
                let rotation = normalize_degrees(*original_rotation + angle - *start_angle);
                self.preview.clear();
                self.preview.insert(element.clone(), ElementPatch::rotation(rotation));
            }
            Gesture::Draw { tool, current, points, .. } => {
                *current = point;
                if tool.is_freehand() {
                    points.push(point);
                }
            }
        }
    }

    /// Finish the gesture, committing its result to the store once.
    pub fn pointer_up(&mut self, store: &mut DocumentStore, event: PointerEvent) -> GestureOutcome {
        self.pointer_move(event);
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        let preview = std::mem::take(&mut self.preview);

        match gesture {
            Gesture::Idle => GestureOutcome::None,
            Gesture::Move { .. } | Gesture::Resize { .. } | Gesture::Rotate { .. } => {
                let updates: Vec<(ElementId, ElementPatch)> = preview
                    .into_iter()
                    .filter(|(id, patch)| !self.is_unchanged(store, id, patch))
                    .collect();
                if updates.is_empty() {
                    return GestureOutcome::None;
                }
                GestureOutcome::Updated(store.update_elements(&updates))
            }
            Gesture::Draw { tool, page, start, current, points } => {
                self.finish_drawing(store, tool, page, start, current, points)
            }
        }
    }

    /// Escape: abandon the gesture without touching the store. Returns true
    /// when a gesture was in progress.
    pub fn cancel(&mut self) -> bool {
        let active = !matches!(self.gesture, Gesture::Idle);
        self.gesture = Gesture::Idle;
        self.preview.clear();
        active
    }

    /// Remove every selected element with one history entry
    pub fn delete_selection(&mut self, store: &mut DocumentStore) -> usize {
        let ids: Vec<ElementId> =
            self.selection.ids().into_iter().filter(|id| !store.is_locked(id)).collect();
        let removed = store.remove_elements(&ids);
        self.selection.retain_existing(store);
        removed.len()
    }

    /// Select every unlocked element on `page`
    pub fn select_all_on_page(&mut self, store: &DocumentStore, page: u32) {
        let ids = store
            .stacking_order(page)
            .into_iter()
            .filter(|element| !store.is_locked(&element.id))
            .map(|element| element.id.clone());
        self.selection.select_all(ids);
    }

    fn begin_select_gesture(&mut self, store: &DocumentStore, event: PointerEvent, point: Point) {
        let tolerance = self.factory.config().handle_size / self.zoom;

        if let [selected] = self.selection.ids().as_slice() {
            if let Some(element) = store.element(selected).filter(|e| e.page == event.page) {
                let handle = generate_handles(element, self.factory.config().handle_size)
                    .into_iter()
                    .find(|handle| handle.hit_test(&point, tolerance));
                if let Some(handle) = handle {
                    if !store.is_locked(&element.id) {
                        self.gesture = if handle.handle_type == HandleType::Rotate {
                            let center = element.bounds().center();
                            Gesture::Rotate {
                                element: element.id.clone(),
                                center,
                                start_angle: angle_around(center, point),
                                original_rotation: element.rotation,
                            }
                        } else {
                            Gesture::Resize {
                                start: event.position,
                                element: element.id.clone(),
                                handle: handle.handle_type,
                                original: element.bounds(),
                            }
                        };
                        return;
                    }
                }
            }
        }

        let hit = store
            .stacking_order(event.page)
            .into_iter()
            .rev()
            .find(|element| !store.is_locked(&element.id) && hit_body(element, &point, 0.0));

        let Some(hit) = hit else {
            if !event.additive {
                self.selection.clear();
            }
            return;
        };

        if !self.selection.contains(&hit.id) || event.additive {
            self.selection.select(hit.id.clone(), event.additive);
        }
        if !self.selection.contains(&hit.id) {
            return;
        }

        let originals = store
            .elements_by_ids(&self.selection.ids())
            .into_iter()
            .filter(|element| !store.is_locked(&element.id))
            .map(|element| (element.id.clone(), element.bounds()))
            .collect();
        self.gesture = Gesture::Move { start: event.position, originals };
    }

    fn finish_drawing(
        &mut self,
        store: &mut DocumentStore,
        tool: Tool,
        page: u32,
        start: Point,
        current: Point,
        points: Vec<Point>,
    ) -> GestureOutcome {
        let min = self.factory.config().min_draw_size;
        let bounds = if tool.is_freehand() {
            Rect::bounding(&points)
        } else {
            Some(Rect::from_corners(start, current))
        };
        let Some(bounds) = bounds else {
            return GestureOutcome::Discarded;
        };
        if bounds.width < min && bounds.height < min {
            log::debug!("discarding {:.1}x{:.1} gesture as a click", bounds.width, bounds.height);
            return GestureOutcome::Discarded;
        }

        let element = if tool.is_freehand() {
            self.factory.from_stroke(tool, page, points)
        } else {
            self.factory.from_drag(tool, page, start, current)
        };
        let Some(element) = element else {
            return GestureOutcome::Discarded;
        };

        match store.add_element(element) {
            Ok(id) => GestureOutcome::Created(id),
            Err(err) => {
                log::warn!("could not add drawn element: {err}");
                GestureOutcome::Discarded
            }
        }
    }

    fn is_unchanged(&self, store: &DocumentStore, id: &ElementId, patch: &ElementPatch) -> bool {
        let Some(element) = store.element(id) else {
            return true;
        };
        let mut patched = element.clone();
        patched.apply(patch);
        patched.bounds() == element.bounds() && patched.rotation == element.rotation
    }

    fn to_page(&self, position: Point) -> Point {
        Point::new(position.x / self.zoom, position.y / self.zoom)
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(ElementFactory::default())
    }
}

/// Screen-space pointer travel converted to a page-space delta
fn screen_delta(start: Point, current: Point, zoom: f32) -> (f32, f32) {
    ((current.x - start.x) / zoom, (current.y - start.y) / zoom)
}
