//! Document model: scene objects, layers, and the document that owns them.
//!
//! A [`Document`] is an ordered list of [`Layer`]s, an active-layer pointer,
//! and the current selection. Layers hold top-level [`SceneObject`]s in draw
//! order; groups own their children exclusively. Every primitive here treats a
//! stale id as a no-op and keeps the selection free of dangling ids.
//!
//! Persistence is the layer list plus the active-layer id. Selection is
//! dropped on save and load.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::consts::MAX_POLYGON_SIDES;
use crate::geom::{Bounds, Transform, transform_bounds};
use crate::shape::{PathSegment, Shape, local_bounds};
use crate::style::{Fill, Stroke, default_fill, default_stroke};

/// Unique identifier for a scene object.
pub type ObjectId = Uuid;

/// Unique identifier for a layer.
pub type LayerId = Uuid;

/// Errors raised while loading or saving a document.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    /// Malformed JSON, an unknown variant tag, or a missing field.
    #[error("document parse failed: {0}")]
    Parse(#[source] serde_json::Error),
    /// The document could not be serialized.
    #[error("document serialize failed: {0}")]
    Serialize(#[source] serde_json::Error),
    /// Two objects or layers share an id.
    #[error("duplicate id {0}")]
    DuplicateId(Uuid),
    /// The active-layer pointer names no layer in the document.
    #[error("active layer {0} does not exist")]
    UnknownActiveLayer(LayerId),
    /// An opacity outside `[0, 1]`.
    #[error("opacity {value} out of range on {id}")]
    OpacityOutOfRange { id: Uuid, value: f64 },
    /// NaN or infinite geometry.
    #[error("non-finite geometry on {id}")]
    NonFinite { id: Uuid },
    /// Geometry outside the supported range, such as too many polygon sides.
    #[error("invalid geometry on {id}")]
    InvalidGeometry { id: Uuid },
}

/// A persistent, selectable drawable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub transform: Transform,
    #[serde(deserialize_with = "Option::deserialize")]
    pub fill: Option<Fill>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub stroke: Option<Stroke>,
    /// Opacity in `[0, 1]`, multiplied down the tree.
    pub opacity: f64,
    pub visible: bool,
    pub locked: bool,
    pub shape: Shape,
}

impl SceneObject {
    /// New opaque, visible, unlocked object at the origin with default fill and stroke.
    ///
    /// Lines start without a fill.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        let fill = match shape {
            Shape::Line { .. } | Shape::Group { .. } => None,
            _ => Some(default_fill()),
        };
        let stroke = match shape {
            Shape::Group { .. } => None,
            _ => Some(default_stroke()),
        };
        Self {
            id: Uuid::new_v4(),
            name: shape.kind_name().to_owned(),
            transform: Transform::default(),
            fill,
            stroke,
            opacity: 1.0,
            visible: true,
            locked: false,
            shape,
        }
    }

    /// Builder-style placement.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Axis-aligned world box of this object when it sits at the top level.
    #[must_use]
    pub fn world_bounds(&self) -> Bounds {
        transform_bounds(&local_bounds(&self.shape), &self.transform)
    }

    /// Whether the hit-tester and marquee may pick this object.
    #[must_use]
    pub fn is_interactable(&self) -> bool {
        self.visible && !self.locked
    }

    /// Depth-first search for `id` in this object and its descendants.
    #[must_use]
    pub fn find(&self, id: &ObjectId) -> Option<&SceneObject> {
        if self.id == *id {
            return Some(self);
        }
        match &self.shape {
            Shape::Group { children } => children.iter().find_map(|c| c.find(id)),
            _ => None,
        }
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a SceneObject)) {
        f(self);
        if let Shape::Group { children } = &self.shape {
            for child in children {
                child.visit(f);
            }
        }
    }

    fn is_finite(&self) -> bool {
        let points_finite = |segments: &[PathSegment]| segments.iter().all(|s| s.points().iter().all(|p| p.is_finite()));
        let shape_finite = match &self.shape {
            Shape::Rect { width, height } => width.is_finite() && height.is_finite(),
            Shape::Ellipse { rx, ry } => rx.is_finite() && ry.is_finite(),
            Shape::Path { segments } => points_finite(segments),
            Shape::Line { end } => end.is_finite(),
            Shape::Polygon { radius, .. } => radius.is_finite(),
            Shape::Text { font_size, .. } => font_size.is_finite(),
            Shape::Group { .. } => true,
        };
        shape_finite && self.transform.is_finite() && self.opacity.is_finite()
    }
}

/// Mutable display properties of a layer, recorded by modify-layer operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProps {
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub opacity: f64,
}

/// Ordered, named container of top-level objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub opacity: f64,
    /// Top-level objects in draw order (first is bottom-most).
    pub objects: Vec<SceneObject>,
}

impl Layer {
    /// Empty, visible, unlocked, opaque layer.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
            objects: Vec::new(),
        }
    }

    #[must_use]
    pub fn props(&self) -> LayerProps {
        LayerProps {
            name: self.name.clone(),
            visible: self.visible,
            locked: self.locked,
            opacity: self.opacity,
        }
    }

    pub fn set_props(&mut self, props: &LayerProps) {
        self.name.clone_from(&props.name);
        self.visible = props.visible;
        self.locked = props.locked;
        self.opacity = props.opacity.clamp(0.0, 1.0);
    }

    /// Whether objects on this layer can be hit or marquee-selected.
    #[must_use]
    pub fn is_interactable(&self) -> bool {
        self.visible && !self.locked
    }
}

/// Where a top-level object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub layer_id: LayerId,
    pub layer_index: usize,
    pub index: usize,
}

/// Serialized form: layers plus the active-layer id, nothing else.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedDocument {
    layers: Vec<Layer>,
    #[serde(deserialize_with = "Option::deserialize")]
    active_layer: Option<LayerId>,
}

/// The document: layers, the active-layer pointer, and the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    layers: Vec<Layer>,
    active_layer: Option<LayerId>,
    /// Selected top-level object ids, in selection order.
    selection: Vec<ObjectId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Document with a single empty active layer.
    #[must_use]
    pub fn new() -> Self {
        let layer = Layer::new("Layer 1");
        let active = layer.id;
        Self { layers: vec![layer], active_layer: Some(active), selection: Vec::new() }
    }

    /// Document with no layers at all.
    #[must_use]
    pub fn empty() -> Self {
        Self { layers: Vec::new(), active_layer: None, selection: Vec::new() }
    }

    // --- Queries ---

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == *id)
    }

    #[must_use]
    pub fn active_layer(&self) -> Option<LayerId> {
        self.active_layer
    }

    /// Top-level object by id.
    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&SceneObject> {
        let loc = self.locate(id)?;
        self.layers.get(loc.layer_index)?.objects.get(loc.index)
    }

    /// Object by id at any depth.
    #[must_use]
    pub fn find(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.layers.iter().flat_map(|l| l.objects.iter()).find_map(|o| o.find(id))
    }

    /// Locate a top-level object.
    #[must_use]
    pub fn locate(&self, id: &ObjectId) -> Option<Location> {
        self.layers.iter().enumerate().find_map(|(layer_index, layer)| {
            layer.objects.iter().position(|o| o.id == *id).map(|index| Location {
                layer_id: layer.id,
                layer_index,
                index,
            })
        })
    }

    /// Whether a top-level object may be moved, resized, or deleted.
    /// Both the object and its layer must be visible and unlocked.
    #[must_use]
    pub fn is_editable(&self, id: &ObjectId) -> bool {
        let Some(loc) = self.locate(id) else {
            return false;
        };
        let Some(layer) = self.layers.get(loc.layer_index) else {
            return false;
        };
        layer.is_interactable() && layer.objects.get(loc.index).is_some_and(SceneObject::is_interactable)
    }

    /// Total number of top-level objects across all layers.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.layers.iter().map(|l| l.objects.len()).sum()
    }

    // --- Object primitives ---

    /// Insert `object` into `layer_id` at `index` (clamped), or append when `None`.
    /// Returns the index used, or `None` when the layer does not exist or the id is taken.
    pub fn add_object(&mut self, layer_id: &LayerId, index: Option<usize>, object: SceneObject) -> Option<usize> {
        if self.find(&object.id).is_some() {
            return None;
        }
        let layer = self.layers.iter_mut().find(|l| l.id == *layer_id)?;
        let index = index.map_or(layer.objects.len(), |i| i.min(layer.objects.len()));
        layer.objects.insert(index, object);
        Some(index)
    }

    /// Remove a top-level object (and its subtree), pruning it from the selection.
    pub fn remove_object(&mut self, id: &ObjectId) -> Option<(Location, SceneObject)> {
        let loc = self.locate(id)?;
        let object = self.layers.get_mut(loc.layer_index)?.objects.remove(loc.index);
        self.selection.retain(|s| s != id);
        Some((loc, object))
    }

    /// Replace a top-level object wholesale. The replacement keeps the original id.
    pub fn replace_object(&mut self, id: &ObjectId, mut object: SceneObject) -> bool {
        let Some(slot) = self.object_mut(id) else {
            return false;
        };
        object.id = *id;
        *slot = object;
        true
    }

    /// Mutate a top-level object in place. Returns false for a stale id.
    pub fn update_object(&mut self, id: &ObjectId, f: impl FnOnce(&mut SceneObject)) -> bool {
        let Some(obj) = self.object_mut(id) else {
            return false;
        };
        let original = obj.id;
        f(obj);
        obj.id = original;
        true
    }

    /// Move a top-level object to `to` (clamped) within its layer. Returns the old index.
    pub fn reorder_object(&mut self, id: &ObjectId, to: usize) -> Option<usize> {
        let loc = self.locate(id)?;
        let layer = self.layers.get_mut(loc.layer_index)?;
        let object = layer.objects.remove(loc.index);
        let to = to.min(layer.objects.len());
        layer.objects.insert(to, object);
        Some(loc.index)
    }

    fn object_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        let loc = self.locate(id)?;
        self.layers.get_mut(loc.layer_index)?.objects.get_mut(loc.index)
    }

    // --- Layer primitives ---

    /// Insert a layer at `index` (clamped), or on top when `None`. The first
    /// layer added to a layerless document becomes active.
    pub fn add_layer(&mut self, index: Option<usize>, layer: Layer) -> Option<usize> {
        if self.layers.iter().any(|l| l.id == layer.id) {
            return None;
        }
        let index = index.map_or(self.layers.len(), |i| i.min(self.layers.len()));
        if self.active_layer.is_none() {
            self.active_layer = Some(layer.id);
        }
        self.layers.insert(index, layer);
        Some(index)
    }

    /// Remove a layer with all its objects. If it was active, the nearest
    /// remaining layer becomes active.
    pub fn remove_layer(&mut self, id: &LayerId) -> Option<(usize, Layer)> {
        let index = self.layers.iter().position(|l| l.id == *id)?;
        let layer = self.layers.remove(index);
        self.selection.retain(|s| !layer.objects.iter().any(|o| o.id == *s));
        if self.active_layer == Some(*id) {
            self.active_layer = self
                .layers
                .get(index.saturating_sub(1))
                .or_else(|| self.layers.first())
                .map(|l| l.id);
        }
        Some((index, layer))
    }

    /// Overwrite a layer's display properties. Returns the previous properties.
    pub fn set_layer_props(&mut self, id: &LayerId, props: &LayerProps) -> Option<LayerProps> {
        let layer = self.layers.iter_mut().find(|l| l.id == *id)?;
        let before = layer.props();
        layer.set_props(props);
        Some(before)
    }

    /// Point new objects at `id`. Returns false for an unknown layer.
    pub fn set_active_layer(&mut self, id: &LayerId) -> bool {
        if self.layer(id).is_none() {
            return false;
        }
        self.active_layer = Some(*id);
        true
    }

    // --- Selection ---

    #[must_use]
    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: &ObjectId) -> bool {
        self.selection.contains(id)
    }

    /// Replace the selection. Unknown ids and duplicates are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        let mut next: Vec<ObjectId> = Vec::new();
        for id in ids {
            if !next.contains(&id) && self.locate(&id).is_some() {
                next.push(id);
            }
        }
        self.selection = next;
    }

    /// Select one object, either replacing the selection or adding to it.
    pub fn select_object(&mut self, id: &ObjectId, additive: bool) -> bool {
        if self.locate(id).is_none() {
            return false;
        }
        if !additive {
            self.selection.clear();
        }
        if !self.selection.contains(id) {
            self.selection.push(*id);
        }
        true
    }

    /// Flip one object's membership in the selection.
    pub fn toggle_selected(&mut self, id: &ObjectId) {
        if let Some(pos) = self.selection.iter().position(|s| s == id) {
            self.selection.remove(pos);
        } else if self.locate(id).is_some() {
            self.selection.push(*id);
        }
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// World box enclosing every selected object, or `None` for an empty selection.
    #[must_use]
    pub fn selection_bounds(&self) -> Option<Bounds> {
        self.selection
            .iter()
            .filter_map(|id| self.object(id))
            .map(SceneObject::world_bounds)
            .reduce(|a, b| crate::geom::merge_bounds(&a, &b))
    }

    // --- Persistence ---

    /// Serialize layers and the active-layer id.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DocError> {
        let persisted = PersistedDocument { layers: self.layers.clone(), active_layer: self.active_layer };
        serde_json::to_string(&persisted).map_err(DocError::Serialize)
    }

    /// Parse and validate a serialized document. The result has an empty selection.
    ///
    /// # Errors
    ///
    /// Rejects malformed JSON, unknown tags, missing fields, duplicate ids, a
    /// dangling active-layer id, out-of-range opacity, and non-finite geometry.
    pub fn from_json(json: &str) -> Result<Self, DocError> {
        let persisted: PersistedDocument = serde_json::from_str(json).map_err(DocError::Parse)?;
        let doc = Self { layers: persisted.layers, active_layer: persisted.active_layer, selection: Vec::new() };
        if let Err(e) = doc.validate() {
            warn!(error = %e, "document rejected");
            return Err(e);
        }
        info!(layers = doc.layers.len(), objects = doc.object_count(), "document loaded");
        Ok(doc)
    }

    fn validate(&self) -> Result<(), DocError> {
        let mut seen = std::collections::HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id) {
                return Err(DocError::DuplicateId(layer.id));
            }
            if !(0.0..=1.0).contains(&layer.opacity) {
                return Err(DocError::OpacityOutOfRange { id: layer.id, value: layer.opacity });
            }
            let mut result = Ok(());
            for top in &layer.objects {
                top.visit(&mut |obj| {
                    if result.is_err() {
                        return;
                    }
                    if !seen.insert(obj.id) {
                        result = Err(DocError::DuplicateId(obj.id));
                    } else if !obj.is_finite() {
                        result = Err(DocError::NonFinite { id: obj.id });
                    } else if matches!(obj.shape, Shape::Polygon { sides, .. } if sides > MAX_POLYGON_SIDES) {
                        result = Err(DocError::InvalidGeometry { id: obj.id });
                    } else if !(0.0..=1.0).contains(&obj.opacity) {
                        result = Err(DocError::OpacityOutOfRange { id: obj.id, value: obj.opacity });
                    }
                });
            }
            result?;
        }
        if let Some(active) = self.active_layer {
            if self.layer(&active).is_none() {
                return Err(DocError::UnknownActiveLayer(active));
            }
        }
        Ok(())
    }
}
