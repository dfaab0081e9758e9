//! Interaction engine: pointer gestures, editing commands, and history.
//!
//! `EditorCore` holds every piece of state that does not touch the browser and
//! is what the tests drive. `Engine` wraps it together with the two canvas
//! surfaces (scene and overlay) and only adds viewport and paint plumbing.
//!
//! Every handler returns a list of [`Action`]s describing what changed so the
//! host can update panels, persist, or open a text editor. Document changes
//! made by a gesture are applied live and recorded as a single history entry
//! when the gesture ends; a cancelled gesture restores its snapshots and
//! records nothing.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::config::EditorConfig;
use crate::consts::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};
use crate::doc::{DocError, Document, Layer, LayerId, LayerProps, Location, ObjectId, SceneObject};
use crate::freehand::{fit_segments, push_sample, stroke_extent};
use crate::geom::{Bounds, Point, Transform, local_to_world, merge_bounds};
use crate::hit::{Hit, HitOptions, ResizeAnchor, hit_handle, hit_test, objects_in_rect};
use crate::history::{History, HistoryEntry, Operation};
use crate::input::{InputState, Key, Modifiers, Tool, UiState};
use crate::recording::RecordingSurface;
use crate::render::{render_scene, render_selection_overlay};
use crate::resize::{resized_bounds, scale_object};
use crate::shape::{Shape, TextAlign};
use crate::surface::Surface;
use crate::web::CanvasSurface;

/// Placeholder content for text placed with the text tool.
const NEW_TEXT: &str = "Text";

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A new top-level object was added.
    ObjectCreated(ObjectId),
    /// Existing top-level objects changed geometry, style, or order.
    ObjectsUpdated(Vec<ObjectId>),
    /// Top-level objects were removed.
    ObjectsDeleted(Vec<ObjectId>),
    /// The selection changed; carries the new selection.
    SelectionChanged(Vec<ObjectId>),
    /// Layers were added, removed, or changed properties.
    LayersChanged,
    /// The document was replaced or moved through history.
    DocumentChanged,
    /// The history cursor moved or the log changed.
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// The host should open a text editor for this object.
    EditTextRequested { id: ObjectId, text: String },
}

/// Which surfaces need repainting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    pub scene: bool,
    pub overlay: bool,
}

/// Z-order commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Restack {
    Forward,
    Backward,
    Front,
    Back,
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EditorCore {
    pub doc: Document,
    pub ui: UiState,
    pub input: InputState,
    history: History,
    config: EditorConfig,
    /// Off-screen surface used for path hit queries.
    probe: RecordingSurface,
    dirty: Dirty,
}

impl Default for EditorCore {
    fn default() -> Self {
        Self::with_config(EditorConfig::default())
    }
}

impl EditorCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            doc: Document::new(),
            ui: UiState::default(),
            input: InputState::default(),
            history: History::new(config.history_capacity),
            config,
            probe: RecordingSurface::new(),
            dirty: Dirty { scene: true, overlay: true },
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Topmost interactable object under `point`.
    pub fn hit_test(&mut self, point: Point) -> Option<Hit> {
        let opts = HitOptions {
            line_tolerance: self.config.line_hit_tolerance,
            min_stroke_width: self.config.min_stroke_hit_width,
        };
        hit_test(&mut self.probe, point, self.doc.layers(), &opts)
    }

    /// Return and reset the repaint flags.
    pub fn take_dirty(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }

    // --- Persistence ---

    /// Replace the document with a serialized one. History is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the JSON does not describe a document; the
    /// current document is left untouched.
    pub fn load_json(&mut self, json: &str) -> Result<Vec<Action>, DocError> {
        let doc = Document::from_json(json)?;
        self.input = InputState::Idle;
        self.clear_transient();
        self.doc = doc;
        self.history.clear();
        self.dirty.scene = true;
        debug!("history cleared after load");
        Ok(vec![
            Action::DocumentChanged,
            Action::SelectionChanged(self.doc.selection().to_vec()),
            self.history_action(),
        ])
    }

    /// Serialize the document.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] if serialization fails.
    pub fn save_json(&self) -> Result<String, DocError> {
        self.doc.to_json()
    }

    // --- Rendering ---

    /// Paint the document onto `surface`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any surface call fails.
    pub fn render_scene<S: Surface>(&self, surface: &mut S, width: f64, height: f64) -> Result<(), S::Error> {
        render_scene(surface, self.doc.layers(), width, height)
    }

    /// Paint selection chrome, marquee, and preview onto `surface`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any surface call fails.
    pub fn render_overlay<S: Surface>(&self, surface: &mut S, width: f64, height: f64) -> Result<(), S::Error> {
        render_selection_overlay(surface, &self.doc, &self.ui, self.config.handle_radius, width, height)
    }

    // --- Tool ---

    /// Switch tools. Any gesture in progress is cancelled.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let actions = self.cancel_gesture();
        if self.ui.tool != tool {
            debug!(tool = tool.name(), "tool changed");
            self.ui.tool = tool;
        }
        actions
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, point: Point, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        if !matches!(self.input, InputState::Idle) {
            actions.extend(self.cancel_gesture());
        }
        match self.ui.tool {
            Tool::Select => self.begin_select(point, modifiers),
            Tool::Freehand => {
                self.input = InputState::Drawing { points: vec![point] };
            }
            tool => {
                self.input = InputState::Creating { tool, start: point, current: point };
            }
        }
        actions
    }

    pub fn on_pointer_move(&mut self, point: Point, _modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        self.input = match std::mem::take(&mut self.input) {
            InputState::Idle => InputState::Idle,
            InputState::Pending { start, hit, modifiers } => {
                if start.distance(point) <= self.config.drag_threshold {
                    InputState::Pending { start, hit, modifiers }
                } else {
                    self.begin_drag(start, hit, modifiers, point, &mut actions)
                }
            }
            InputState::Moving { start, snapshots, prior_selection } => {
                self.apply_move(&snapshots, point.sub(start));
                InputState::Moving { start, snapshots, prior_selection }
            }
            InputState::Resizing { anchor, start, start_bounds, snapshots } => {
                self.apply_resize(anchor, &start_bounds, &snapshots, point.sub(start));
                InputState::Resizing { anchor, start, start_bounds, snapshots }
            }
            InputState::Marquee { start, additive, prior_selection, .. } => {
                self.ui.marquee = Some(Bounds::from_corners(start, point));
                self.dirty.overlay = true;
                InputState::Marquee { start, current: point, additive, prior_selection }
            }
            InputState::Creating { tool, start, .. } => {
                self.ui.preview = self.build_shape(tool, start, point);
                self.dirty.overlay = true;
                InputState::Creating { tool, start, current: point }
            }
            InputState::Drawing { mut points } => {
                if push_sample(&mut points, point, self.config.freehand_min_spacing) {
                    self.ui.preview = self.freehand_object(&points);
                    self.dirty.overlay = true;
                }
                InputState::Drawing { points }
            }
        };
        actions
    }

    pub fn on_pointer_up(&mut self, point: Point, _modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        let state = std::mem::take(&mut self.input);
        self.clear_transient();
        match state {
            InputState::Idle => {}
            InputState::Pending { hit, modifiers, .. } => self.click_select(hit, modifiers, &mut actions),
            InputState::Moving { start, snapshots, .. } => {
                self.apply_move(&snapshots, point.sub(start));
                self.commit_modified("move", &snapshots, &mut actions);
            }
            InputState::Resizing { anchor, start, start_bounds, snapshots } => {
                self.apply_resize(anchor, &start_bounds, &snapshots, point.sub(start));
                self.commit_modified("resize", &snapshots, &mut actions);
            }
            InputState::Marquee { start, additive, prior_selection, .. } => {
                self.finish_marquee(Bounds::from_corners(start, point), additive, prior_selection, &mut actions);
            }
            InputState::Creating { tool, start, .. } => {
                if tool.is_shape() && start.distance(point) < self.config.min_create_distance {
                    debug!(tool = tool.name(), "creation below minimum size; discarded");
                } else if let Some(object) = self.build_shape(tool, start, point)
                    && let Some(id) = self.commit_new_object(object, tool.name(), &mut actions)
                    && tool == Tool::Text
                {
                    actions.push(Action::EditTextRequested { id, text: NEW_TEXT.to_owned() });
                }
            }
            InputState::Drawing { mut points } => {
                push_sample(&mut points, point, self.config.freehand_min_spacing);
                if stroke_extent(&points) < self.config.min_create_distance {
                    debug!(samples = points.len(), "freehand stroke too short; discarded");
                } else if let Some(object) = self.freehand_object(&points) {
                    self.commit_new_object(object, Tool::Freehand.name(), &mut actions);
                }
            }
        }
        actions
    }

    /// Escape cancels the active gesture; Delete and Backspace remove the selection.
    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "Escape" => self.cancel_gesture(),
            "Delete" | "Backspace" if matches!(self.input, InputState::Idle) => self.delete_selection(),
            _ => Vec::new(),
        }
    }

    /// Abort the active gesture, restoring the document to its state at pointer-down.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        let state = std::mem::take(&mut self.input);
        if matches!(state, InputState::Idle) {
            return actions;
        }
        self.clear_transient();
        debug!(gesture = state.name(), "gesture cancelled");
        match state {
            InputState::Moving { snapshots, prior_selection, .. } => {
                self.restore_snapshots(&snapshots, &mut actions);
                self.restore_selection(prior_selection, &mut actions);
            }
            InputState::Resizing { snapshots, .. } => self.restore_snapshots(&snapshots, &mut actions),
            InputState::Marquee { prior_selection, .. } => self.restore_selection(prior_selection, &mut actions),
            _ => {}
        }
        actions
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        let mut actions = self.cancel_gesture();
        let before = self.doc.selection().to_vec();
        if let Some(label) = self.history.undo(&mut self.doc) {
            info!(%label, "undo");
            self.after_history_move(&before, &mut actions);
        }
        actions
    }

    pub fn redo(&mut self) -> Vec<Action> {
        let mut actions = self.cancel_gesture();
        let before = self.doc.selection().to_vec();
        if let Some(label) = self.history.redo(&mut self.doc) {
            info!(%label, "redo");
            self.after_history_move(&before, &mut actions);
        }
        actions
    }

    /// Record operations the host already applied to `doc` as one entry.
    pub fn push_history(&mut self, label: &str, ops: Vec<Operation>) -> Vec<Action> {
        let mut actions = Vec::new();
        self.record(label, ops, &mut actions);
        actions
    }

    // --- Selection ---

    pub fn select_object(&mut self, id: &ObjectId, additive: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        let before = self.doc.selection().to_vec();
        self.doc.select_object(id, additive);
        self.selection_actions(&before, &mut actions);
        actions
    }

    pub fn set_selection(&mut self, ids: Vec<ObjectId>) -> Vec<Action> {
        let mut actions = Vec::new();
        self.restore_selection(ids, &mut actions);
        actions
    }

    pub fn deselect_all(&mut self) -> Vec<Action> {
        self.set_selection(Vec::new())
    }

    /// Select every visible, unlocked object on every visible, unlocked layer.
    pub fn select_all(&mut self) -> Vec<Action> {
        let ids = self
            .doc
            .layers()
            .iter()
            .filter(|l| l.is_interactable())
            .flat_map(|l| l.objects.iter().filter(|o| o.is_interactable()).map(|o| o.id))
            .collect();
        self.set_selection(ids)
    }

    // --- Object commands ---

    /// Add `object` on top of `layer_id` as one history entry.
    pub fn add_object(&mut self, layer_id: &LayerId, object: SceneObject) -> Vec<Action> {
        let mut actions = Vec::new();
        let id = object.id;
        let Some(index) = self.doc.add_object(layer_id, None, object.clone()) else {
            warn!(%id, %layer_id, "add_object: unknown layer or duplicate id");
            return actions;
        };
        actions.push(Action::ObjectCreated(id));
        self.record("add", vec![Operation::AddObject { layer_id: *layer_id, index, object }], &mut actions);
        actions
    }

    /// Mutate one top-level object through `f` as one history entry.
    /// Nothing is recorded when `f` leaves the object unchanged.
    pub fn update_object(&mut self, id: &ObjectId, label: &str, f: impl FnOnce(&mut SceneObject)) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(before) = self.doc.object(id).cloned() else {
            return actions;
        };
        self.doc.update_object(id, f);
        let Some(after) = self.doc.object(id).cloned() else {
            return actions;
        };
        if after == before {
            return actions;
        }
        actions.push(Action::ObjectsUpdated(vec![*id]));
        self.record(label, vec![Operation::ModifyObject { id: *id, before, after }], &mut actions);
        actions
    }

    /// Commit text from the host editor into a text object.
    pub fn set_text(&mut self, id: &ObjectId, text: String) -> Vec<Action> {
        self.update_object(id, "edit text", |obj| {
            if let Shape::Text { text: current, .. } = &mut obj.shape {
                *current = text;
            }
        })
    }

    /// Remove every editable selected object as one history entry.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        let before = self.doc.selection().to_vec();
        let mut ops = Vec::new();
        let mut removed = Vec::new();
        for id in self.selection_by_depth().iter().rev() {
            if !self.doc.is_editable(id) {
                continue;
            }
            if let Some((loc, object)) = self.doc.remove_object(id) {
                removed.push(object.id);
                ops.push(Operation::RemoveObject { layer_id: loc.layer_id, index: loc.index, object });
            }
        }
        if removed.is_empty() {
            return actions;
        }
        info!(count = removed.len(), "deleted selection");
        actions.push(Action::ObjectsDeleted(removed));
        self.selection_actions(&before, &mut actions);
        self.record("delete", ops, &mut actions);
        actions
    }

    /// Wrap the selected objects into one group placed at the slot of the topmost member.
    ///
    /// Children keep their world placement: the group sits at the origin of
    /// the members' combined box and each child is offset relative to it.
    pub fn group_selection(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        let members = self.selection_by_depth();
        if members.len() < 2 {
            return actions;
        }
        let Some(top) = members.last().and_then(|id| self.doc.locate(id)) else {
            return actions;
        };
        let objects: Vec<SceneObject> = members.iter().filter_map(|id| self.doc.object(id).cloned()).collect();
        let Some(bounds) = objects.iter().map(SceneObject::world_bounds).reduce(|a, b| merge_bounds(&a, &b)) else {
            return actions;
        };
        let origin = bounds.origin();
        let children = objects
            .iter()
            .map(|o| {
                let mut child = o.clone();
                child.transform.x -= origin.x;
                child.transform.y -= origin.y;
                child
            })
            .collect();
        let group = SceneObject::new(Shape::Group { children }).with_transform(Transform::at(origin.x, origin.y));
        let group_id = group.id;

        let mut ops = Vec::new();
        let mut removed = Vec::new();
        let mut below_top = 0;
        for id in members.iter().rev() {
            if let Some((loc, object)) = self.doc.remove_object(id) {
                if loc.layer_id == top.layer_id && loc.index < top.index {
                    below_top += 1;
                }
                removed.push(object.id);
                ops.push(Operation::RemoveObject { layer_id: loc.layer_id, index: loc.index, object });
            }
        }
        let slot = top.index - below_top;
        let Some(index) = self.doc.add_object(&top.layer_id, Some(slot), group.clone()) else {
            warn!(%group_id, "group insert failed; restoring members");
            for op in ops.iter().rev() {
                op.revert(&mut self.doc);
            }
            return actions;
        };
        ops.push(Operation::AddObject { layer_id: top.layer_id, index, object: group });
        self.doc.select_object(&group_id, false);
        info!(%group_id, members = removed.len(), "grouped selection");

        actions.push(Action::ObjectsDeleted(removed));
        actions.push(Action::ObjectCreated(group_id));
        actions.push(Action::SelectionChanged(self.doc.selection().to_vec()));
        self.dirty.overlay = true;
        self.record("group", ops, &mut actions);
        actions
    }

    /// Replace each selected group by its children, composed into world placement.
    pub fn ungroup_selection(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        let groups: Vec<ObjectId> = self
            .selection_by_depth()
            .into_iter()
            .filter(|id| matches!(self.doc.object(id).map(|o| &o.shape), Some(Shape::Group { .. })))
            .collect();
        if groups.is_empty() {
            return actions;
        }
        let before = self.doc.selection().to_vec();
        let mut ops = Vec::new();
        let mut removed = Vec::new();
        let mut released = Vec::new();
        for id in groups.iter().rev() {
            let Some((loc, group)) = self.doc.remove_object(id) else {
                continue;
            };
            removed.push(group.id);
            ops.push(Operation::RemoveObject { layer_id: loc.layer_id, index: loc.index, object: group.clone() });
            let Shape::Group { children } = group.shape else {
                continue;
            };
            for (offset, child) in children.into_iter().enumerate() {
                let child = reparent(child, &group.transform);
                let child_id = child.id;
                if let Some(index) = self.doc.add_object(&loc.layer_id, Some(loc.index + offset), child.clone()) {
                    ops.push(Operation::AddObject { layer_id: loc.layer_id, index, object: child });
                    released.push(child_id);
                }
            }
        }
        self.doc.set_selection(released.iter().copied());
        info!(groups = removed.len(), children = released.len(), "ungrouped selection");

        actions.push(Action::ObjectsDeleted(removed));
        actions.extend(released.iter().map(|id| Action::ObjectCreated(*id)));
        self.selection_actions(&before, &mut actions);
        self.record("ungroup", ops, &mut actions);
        actions
    }

    pub fn bring_forward(&mut self) -> Vec<Action> {
        self.restack("bring forward", Restack::Forward)
    }

    pub fn send_backward(&mut self) -> Vec<Action> {
        self.restack("send backward", Restack::Backward)
    }

    pub fn bring_to_front(&mut self) -> Vec<Action> {
        self.restack("bring to front", Restack::Front)
    }

    pub fn send_to_back(&mut self) -> Vec<Action> {
        self.restack("send to back", Restack::Back)
    }

    // --- Layer commands ---

    /// Add a layer on top and make it active.
    pub fn add_layer(&mut self, name: &str) -> (LayerId, Vec<Action>) {
        let mut actions = Vec::new();
        let layer = Layer::new(name);
        let id = layer.id;
        let prev_active = self.doc.active_layer();
        let Some(index) = self.doc.add_layer(None, layer.clone()) else {
            return (id, actions);
        };
        self.doc.set_active_layer(&id);
        info!(%id, layer_name = name, "layer added");
        actions.push(Action::LayersChanged);
        self.record("add layer", vec![Operation::AddLayer { index, layer, prev_active }], &mut actions);
        (id, actions)
    }

    /// Remove a layer and all of its objects.
    pub fn remove_layer(&mut self, id: &LayerId) -> Vec<Action> {
        let mut actions = Vec::new();
        let before = self.doc.selection().to_vec();
        let was_active = self.doc.active_layer() == Some(*id);
        let Some((index, layer)) = self.doc.remove_layer(id) else {
            return actions;
        };
        info!(%id, objects = layer.objects.len(), "layer removed");
        actions.push(Action::LayersChanged);
        if !layer.objects.is_empty() {
            actions.push(Action::ObjectsDeleted(layer.objects.iter().map(|o| o.id).collect()));
        }
        self.selection_actions(&before, &mut actions);
        self.record("remove layer", vec![Operation::RemoveLayer { index, layer, was_active }], &mut actions);
        actions
    }

    /// Change a layer's name, visibility, lock, or opacity.
    ///
    /// Hiding or locking a layer drops its objects from the selection.
    pub fn set_layer_props(&mut self, id: &LayerId, props: LayerProps) -> Vec<Action> {
        let mut actions = Vec::new();
        let selected = self.doc.selection().to_vec();
        let Some(before) = self.doc.set_layer_props(id, &props) else {
            return actions;
        };
        if before == props {
            return actions;
        }
        actions.push(Action::LayersChanged);
        if !props.visible || props.locked {
            let kept: Vec<ObjectId> = selected
                .iter()
                .copied()
                .filter(|s| self.doc.locate(s).is_some_and(|loc| loc.layer_id != *id))
                .collect();
            self.doc.set_selection(kept);
            self.selection_actions(&selected, &mut actions);
        }
        self.record("layer properties", vec![Operation::ModifyLayer { id: *id, before, after: props }], &mut actions);
        actions
    }

    /// Point new objects at `id`. Not recorded in history.
    pub fn set_active_layer(&mut self, id: &LayerId) -> Vec<Action> {
        if self.doc.active_layer() == Some(*id) || !self.doc.set_active_layer(id) {
            return Vec::new();
        }
        vec![Action::LayersChanged]
    }

    // --- Gesture internals ---

    fn begin_select(&mut self, point: Point, modifiers: Modifiers) {
        if let Some(bounds) = self.doc.selection_bounds()
            && let Some(anchor) = hit_handle(point, &bounds, self.config.handle_radius)
        {
            let snapshots = self.selected_snapshots();
            if !snapshots.is_empty() {
                debug!(?anchor, "resize started");
                self.input = InputState::Resizing { anchor, start: point, start_bounds: bounds, snapshots };
                return;
            }
        }
        let hit = self.hit_test(point);
        self.input = InputState::Pending { start: point, hit, modifiers };
    }

    fn begin_drag(
        &mut self,
        start: Point,
        hit: Option<Hit>,
        modifiers: Modifiers,
        point: Point,
        actions: &mut Vec<Action>,
    ) -> InputState {
        let prior_selection = self.doc.selection().to_vec();
        if let Some(hit) = hit {
            if !self.doc.is_selected(&hit.object_id) {
                self.doc.select_object(&hit.object_id, modifiers.additive());
            }
            self.selection_actions(&prior_selection, actions);
            let snapshots = self.selected_snapshots();
            debug!(objects = snapshots.len(), "move started");
            self.apply_move(&snapshots, point.sub(start));
            return InputState::Moving { start, snapshots, prior_selection };
        }
        let additive = modifiers.additive();
        if !additive {
            self.doc.deselect_all();
        }
        self.selection_actions(&prior_selection, actions);
        self.ui.marquee = Some(Bounds::from_corners(start, point));
        self.dirty.overlay = true;
        InputState::Marquee { start, current: point, additive, prior_selection }
    }

    fn click_select(&mut self, hit: Option<Hit>, modifiers: Modifiers, actions: &mut Vec<Action>) {
        let before = self.doc.selection().to_vec();
        match (hit, modifiers.additive()) {
            (Some(hit), true) => self.doc.toggle_selected(&hit.object_id),
            (Some(hit), false) => {
                self.doc.select_object(&hit.object_id, false);
            }
            (None, true) => {}
            (None, false) => self.doc.deselect_all(),
        }
        self.selection_actions(&before, actions);
    }

    fn finish_marquee(&mut self, rect: Bounds, additive: bool, prior: Vec<ObjectId>, actions: &mut Vec<Action>) {
        let before = self.doc.selection().to_vec();
        let hits = objects_in_rect(self.doc.layers(), &rect);
        debug!(hits = hits.len(), additive, "marquee released");
        if additive {
            self.doc.set_selection(prior.into_iter().chain(hits));
        } else {
            self.doc.set_selection(hits);
        }
        self.selection_actions(&before, actions);
    }

    fn apply_move(&mut self, snapshots: &[SceneObject], delta: Point) {
        for snapshot in snapshots {
            let x = snapshot.transform.x + delta.x;
            let y = snapshot.transform.y + delta.y;
            self.doc.update_object(&snapshot.id, |obj| {
                obj.transform.x = x;
                obj.transform.y = y;
            });
        }
        self.dirty.scene = true;
        self.dirty.overlay = true;
    }

    fn apply_resize(&mut self, anchor: ResizeAnchor, start: &Bounds, snapshots: &[SceneObject], delta: Point) {
        let bounds = resized_bounds(start, anchor, delta, self.config.min_resize);
        for snapshot in snapshots {
            self.doc.replace_object(&snapshot.id, scale_object(snapshot, start, &bounds));
        }
        self.dirty.scene = true;
        self.dirty.overlay = true;
    }

    /// Record one modify operation per snapshot whose object changed.
    fn commit_modified(&mut self, label: &str, snapshots: &[SceneObject], actions: &mut Vec<Action>) {
        let ops: Vec<Operation> = snapshots
            .iter()
            .filter_map(|before| {
                let after = self.doc.object(&before.id)?;
                (after != before).then(|| Operation::ModifyObject {
                    id: before.id,
                    before: before.clone(),
                    after: after.clone(),
                })
            })
            .collect();
        if ops.is_empty() {
            debug!(gesture = label, "gesture changed nothing");
            return;
        }
        actions.push(Action::ObjectsUpdated(snapshots.iter().map(|s| s.id).collect()));
        self.record(label, ops, actions);
    }

    fn restore_snapshots(&mut self, snapshots: &[SceneObject], actions: &mut Vec<Action>) {
        for snapshot in snapshots {
            self.doc.replace_object(&snapshot.id, snapshot.clone());
        }
        if !snapshots.is_empty() {
            actions.push(Action::ObjectsUpdated(snapshots.iter().map(|s| s.id).collect()));
            self.dirty.scene = true;
        }
    }

    fn restore_selection(&mut self, ids: Vec<ObjectId>, actions: &mut Vec<Action>) {
        let before = self.doc.selection().to_vec();
        self.doc.set_selection(ids);
        self.selection_actions(&before, actions);
    }

    /// Object a creation tool produces for a drag from `start` to `current`.
    /// Text is anchored at `start` whatever the drag.
    fn build_shape(&self, tool: Tool, start: Point, current: Point) -> Option<SceneObject> {
        let object = match tool {
            Tool::Rect => {
                let b = Bounds::from_corners(start, current);
                SceneObject::new(Shape::Rect { width: b.width, height: b.height }).with_transform(Transform::at(b.x, b.y))
            }
            Tool::Ellipse => {
                let b = Bounds::from_corners(start, current);
                let c = b.center();
                SceneObject::new(Shape::Ellipse { rx: b.width / 2.0, ry: b.height / 2.0 })
                    .with_transform(Transform::at(c.x, c.y))
            }
            Tool::Line => {
                SceneObject::new(Shape::Line { end: current.sub(start) }).with_transform(Transform::at(start.x, start.y))
            }
            Tool::Polygon => SceneObject::new(Shape::Polygon {
                sides: self.config.polygon_sides,
                radius: start.distance(current),
            })
            .with_transform(Transform::at(start.x, start.y)),
            Tool::Text => SceneObject::new(Shape::Text {
                text: NEW_TEXT.to_owned(),
                font_size: DEFAULT_FONT_SIZE,
                font_family: DEFAULT_FONT_FAMILY.to_owned(),
                align: TextAlign::Left,
            })
            .with_transform(Transform::at(start.x, start.y)),
            Tool::Select | Tool::Freehand => return None,
        };
        Some(object)
    }

    /// Unfilled path through `points`, positioned at the first sample.
    fn freehand_object(&self, points: &[Point]) -> Option<SceneObject> {
        let first = *points.first()?;
        let local: Vec<Point> = points.iter().map(|p| p.sub(first)).collect();
        let segments = fit_segments(&local, self.config.freehand_tension);
        if segments.is_empty() {
            return None;
        }
        let mut object = SceneObject::new(Shape::Path { segments }).with_transform(Transform::at(first.x, first.y));
        object.fill = None;
        Some(object)
    }

    /// Append `object` to the active layer, select it, and record the insert.
    fn commit_new_object(&mut self, object: SceneObject, label: &str, actions: &mut Vec<Action>) -> Option<ObjectId> {
        let Some(layer_id) = self.doc.active_layer() else {
            warn!(kind = object.shape.kind_name(), "no active layer; creation discarded");
            return None;
        };
        let id = object.id;
        let before = self.doc.selection().to_vec();
        let index = self.doc.add_object(&layer_id, None, object.clone())?;
        self.doc.select_object(&id, false);
        info!(%id, kind = object.shape.kind_name(), "object created");
        actions.push(Action::ObjectCreated(id));
        self.selection_actions(&before, actions);
        self.record(label, vec![Operation::AddObject { layer_id, index, object }], actions);
        Some(id)
    }

    fn restack(&mut self, label: &str, direction: Restack) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut ids = self.selection_by_depth();
        if matches!(direction, Restack::Forward | Restack::Back) {
            ids.reverse();
        }
        let mut ops = Vec::new();
        let mut moved = Vec::new();
        for id in ids {
            let Some(loc) = self.doc.locate(&id) else {
                continue;
            };
            let Some(target) = self.restack_target(&loc, direction) else {
                continue;
            };
            if target == loc.index {
                continue;
            }
            if self.doc.reorder_object(&id, target).is_some() {
                ops.push(Operation::ReorderObject { id, layer_id: loc.layer_id, from: loc.index, to: target });
                moved.push(id);
            }
        }
        if moved.is_empty() {
            return actions;
        }
        actions.push(Action::ObjectsUpdated(moved));
        self.record(label, ops, &mut actions);
        actions
    }

    /// Destination index for one object; stepping never jumps over another selected object.
    fn restack_target(&self, loc: &Location, direction: Restack) -> Option<usize> {
        let objects = &self.doc.layers().get(loc.layer_index)?.objects;
        let last = objects.len().checked_sub(1)?;
        let free = |i: usize| objects.get(i).is_some_and(|o| !self.doc.is_selected(&o.id));
        match direction {
            Restack::Front => Some(last),
            Restack::Back => Some(0),
            Restack::Forward => (loc.index < last && free(loc.index + 1)).then_some(loc.index + 1),
            Restack::Backward => (loc.index > 0 && free(loc.index - 1)).then_some(loc.index - 1),
        }
    }

    // --- Bookkeeping ---

    /// Selected ids ordered bottom to top: by layer, then by stacking index.
    fn selection_by_depth(&self) -> Vec<ObjectId> {
        let mut located: Vec<Location> = self.doc.selection().iter().filter_map(|id| self.doc.locate(id)).collect();
        located.sort_by_key(|l| (l.layer_index, l.index));
        located
            .iter()
            .filter_map(|l| self.doc.layers().get(l.layer_index)?.objects.get(l.index).map(|o| o.id))
            .collect()
    }

    /// Clones of the selected objects that may be transformed.
    fn selected_snapshots(&self) -> Vec<SceneObject> {
        self.selection_by_depth()
            .iter()
            .filter(|id| self.doc.is_editable(id))
            .filter_map(|id| self.doc.object(id))
            .cloned()
            .collect()
    }

    fn clear_transient(&mut self) {
        self.ui.marquee = None;
        self.ui.preview = None;
        self.dirty.overlay = true;
    }

    fn selection_actions(&mut self, before: &[ObjectId], actions: &mut Vec<Action>) {
        if self.doc.selection() != before {
            actions.push(Action::SelectionChanged(self.doc.selection().to_vec()));
            self.dirty.overlay = true;
        }
    }

    /// Push one entry for `ops`; several operations are wrapped in a batch.
    fn record(&mut self, label: &str, mut ops: Vec<Operation>, actions: &mut Vec<Action>) {
        let op = match ops.len() {
            0 => return,
            1 => ops.remove(0),
            _ => Operation::Batch(ops),
        };
        if self.history.push(HistoryEntry::new(label, vec![op])) {
            actions.push(self.history_action());
        }
        self.dirty.scene = true;
        self.dirty.overlay = true;
    }

    fn after_history_move(&mut self, before: &[ObjectId], actions: &mut Vec<Action>) {
        self.dirty.scene = true;
        self.dirty.overlay = true;
        actions.push(Action::DocumentChanged);
        self.selection_actions(before, actions);
        actions.push(self.history_action());
    }

    fn history_action(&self) -> Action {
        Action::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() }
    }
}

/// Lift a group child out of `parent` space into the parent's own space.
///
/// Exact for translation and rotation; a non-uniform parent scale combined
/// with child rotation is approximated by multiplying the scale factors.
fn reparent(mut child: SceneObject, parent: &Transform) -> SceneObject {
    let position = local_to_world(child.transform.position(), parent);
    child.transform = Transform {
        x: position.x,
        y: position.y,
        rotation: parent.rotation + child.transform.rotation,
        sx: parent.sx * child.transform.sx,
        sy: parent.sy * child.transform.sy,
    };
    child
}

/// The full editor. Wraps `EditorCore` and owns the scene and overlay canvases.
pub struct Engine {
    scene_canvas: HtmlCanvasElement,
    overlay_canvas: HtmlCanvasElement,
    scene: CanvasSurface,
    overlay: CanvasSurface,
    width: f64,
    height: f64,
    pub core: EditorCore,
}

impl Engine {
    /// Create an engine bound to a scene canvas and an overlay canvas stacked above it.
    ///
    /// # Errors
    ///
    /// Returns `Err` if either canvas cannot provide a 2D context.
    pub fn new(scene_canvas: HtmlCanvasElement, overlay_canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        Self::with_core(scene_canvas, overlay_canvas, EditorCore::new())
    }

    /// Like [`Engine::new`] with an explicit core, e.g. one built from [`EditorConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if either canvas cannot provide a 2D context.
    pub fn with_core(
        scene_canvas: HtmlCanvasElement,
        overlay_canvas: HtmlCanvasElement,
        core: EditorCore,
    ) -> Result<Self, JsValue> {
        let scene = CanvasSurface::new(context_2d(&scene_canvas)?, 1.0);
        let overlay = CanvasSurface::new(context_2d(&overlay_canvas)?, 1.0);
        let width = f64::from(scene_canvas.width());
        let height = f64::from(scene_canvas.height());
        Ok(Self { scene_canvas, overlay_canvas, scene, overlay, width, height, core })
    }

    // --- Viewport ---

    /// Resize both canvases to `width_css` x `height_css` CSS pixels at `dpr`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.width = width_css.max(0.0);
        self.height = height_css.max(0.0);
        let device_w = (self.width * dpr).round() as u32;
        let device_h = (self.height * dpr).round() as u32;
        for canvas in [&self.scene_canvas, &self.overlay_canvas] {
            canvas.set_width(device_w);
            canvas.set_height(device_h);
        }
        self.scene.set_dpr(dpr);
        self.overlay.set_dpr(dpr);
        self.core.dirty = Dirty { scene: true, overlay: true };
        debug!(width = self.width, height = self.height, dpr, "viewport changed");
    }

    // --- Render ---

    /// Repaint whichever canvases are dirty.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a canvas call throws.
    pub fn render(&mut self) -> Result<(), JsValue> {
        let dirty = self.core.take_dirty();
        if dirty.scene {
            self.core.render_scene(&mut self.scene, self.width, self.height)?;
        }
        if dirty.overlay {
            self.core.render_overlay(&mut self.overlay, self.width, self.height)?;
        }
        Ok(())
    }

    // --- Delegated input events ---

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.core.set_tool(tool)
    }

    pub fn on_pointer_down(&mut self, point: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(point, modifiers)
    }

    pub fn on_pointer_move(&mut self, point: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(point, modifiers)
    }

    pub fn on_pointer_up(&mut self, point: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(point, modifiers)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    // --- Delegated commands ---

    pub fn undo(&mut self) -> Vec<Action> {
        self.core.undo()
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.core.redo()
    }

    pub fn set_text(&mut self, id: &ObjectId, text: String) -> Vec<Action> {
        self.core.set_text(id, text)
    }

    /// # Errors
    ///
    /// Returns [`DocError`] when the JSON does not describe a document.
    pub fn load_json(&mut self, json: &str) -> Result<Vec<Action>, DocError> {
        self.core.load_json(json)
    }

    /// # Errors
    ///
    /// Returns [`DocError`] if serialization fails.
    pub fn save_json(&self) -> Result<String, DocError> {
        self.core.save_json()
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}
