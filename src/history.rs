//! Operation-based undo/redo log.
//!
//! Every document mutation made by the interaction engine is recorded as an
//! [`Operation`] carrying enough state to run it in either direction. One user
//! gesture produces one [`HistoryEntry`]. The log is a single linear list with
//! a cursor: entries before the cursor are applied, entries at or after it are
//! redoable. Pushing truncates the redo tail and evicts the oldest entry once
//! the capacity is exceeded.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use tracing::debug;

use crate::doc::{Document, Layer, LayerId, LayerProps, ObjectId, SceneObject};

/// One atomic, reversible document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// A top-level object was inserted at `index` of `layer_id`.
    AddObject { layer_id: LayerId, index: usize, object: SceneObject },
    /// A top-level object was removed from `index` of `layer_id`.
    RemoveObject { layer_id: LayerId, index: usize, object: SceneObject },
    /// A top-level object changed from `before` to `after`.
    ModifyObject { id: ObjectId, before: SceneObject, after: SceneObject },
    /// A top-level object moved from `from` to `to` within its layer.
    ReorderObject { id: ObjectId, layer_id: LayerId, from: usize, to: usize },
    /// A layer was inserted at `index` and made active; `prev_active` is restored on undo.
    AddLayer { index: usize, layer: Layer, prev_active: Option<LayerId> },
    /// A layer was removed from `index`; `was_active` restores the active pointer on undo.
    RemoveLayer { index: usize, layer: Layer, was_active: bool },
    /// A layer's display properties changed.
    ModifyLayer { id: LayerId, before: LayerProps, after: LayerProps },
    /// Members applied in order, reverted in reverse order.
    Batch(Vec<Operation>),
}

impl Operation {
    /// Run the operation forward.
    pub fn apply(&self, doc: &mut Document) {
        match self {
            Self::AddObject { layer_id, index, object } => {
                doc.add_object(layer_id, Some(*index), object.clone());
            }
            Self::RemoveObject { object, .. } => {
                doc.remove_object(&object.id);
            }
            Self::ModifyObject { id, after, .. } => {
                doc.replace_object(id, after.clone());
            }
            Self::ReorderObject { id, to, .. } => {
                doc.reorder_object(id, *to);
            }
            Self::AddLayer { index, layer, .. } => {
                doc.add_layer(Some(*index), layer.clone());
                doc.set_active_layer(&layer.id);
            }
            Self::RemoveLayer { layer, .. } => {
                doc.remove_layer(&layer.id);
            }
            Self::ModifyLayer { id, after, .. } => {
                doc.set_layer_props(id, after);
            }
            Self::Batch(ops) => {
                for op in ops {
                    op.apply(doc);
                }
            }
        }
    }

    /// Run the operation backward.
    pub fn revert(&self, doc: &mut Document) {
        match self {
            Self::AddObject { object, .. } => {
                doc.remove_object(&object.id);
            }
            Self::RemoveObject { layer_id, index, object } => {
                doc.add_object(layer_id, Some(*index), object.clone());
            }
            Self::ModifyObject { id, before, .. } => {
                doc.replace_object(id, before.clone());
            }
            Self::ReorderObject { id, from, .. } => {
                doc.reorder_object(id, *from);
            }
            Self::AddLayer { layer, prev_active, .. } => {
                doc.remove_layer(&layer.id);
                if let Some(prev) = prev_active {
                    doc.set_active_layer(prev);
                }
            }
            Self::RemoveLayer { index, layer, was_active } => {
                doc.add_layer(Some(*index), layer.clone());
                if *was_active {
                    doc.set_active_layer(&layer.id);
                }
            }
            Self::ModifyLayer { id, before, .. } => {
                doc.set_layer_props(id, before);
            }
            Self::Batch(ops) => {
                for op in ops.iter().rev() {
                    op.revert(doc);
                }
            }
        }
    }
}

/// One gesture's worth of operations.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub label: String,
    /// Milliseconds since the Unix epoch when the entry was recorded.
    pub timestamp_ms: f64,
    pub ops: Vec<Operation>,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(label: impl Into<String>, ops: Vec<Operation>) -> Self {
        Self { label: label.into(), timestamp_ms: now_ms(), ops }
    }
}

/// Linear undo log with a cursor and a fixed capacity.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    /// Number of applied entries; the next undo target is `cursor - 1`.
    cursor: usize,
    capacity: usize,
}

impl History {
    /// Empty log holding at most `capacity` entries (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::new(), cursor: 0, capacity: capacity.max(1) }
    }

    /// Record an entry whose operations have already been applied.
    ///
    /// Entries with no operations are ignored. Returns whether the entry was kept.
    pub fn push(&mut self, entry: HistoryEntry) -> bool {
        if entry.ops.is_empty() {
            return false;
        }
        self.entries.truncate(self.cursor);
        debug!(label = %entry.label, ops = entry.ops.len(), "history push");
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(label = %evicted.label, "history evict");
            }
        }
        self.cursor = self.entries.len();
        true
    }

    /// Revert the most recently applied entry. Returns its label, or `None` at the start of the log.
    pub fn undo(&mut self, doc: &mut Document) -> Option<String> {
        let index = self.cursor.checked_sub(1)?;
        let entry = self.entries.get(index)?;
        for op in entry.ops.iter().rev() {
            op.revert(doc);
        }
        self.cursor = index;
        debug!(label = %entry.label, cursor = self.cursor, "undo");
        Some(entry.label.clone())
    }

    /// Re-apply the next unapplied entry. Returns its label, or `None` at the end of the log.
    pub fn redo(&mut self, doc: &mut Document) -> Option<String> {
        let entry = self.entries.get(self.cursor)?;
        for op in &entry.ops {
            op.apply(doc);
        }
        self.cursor += 1;
        debug!(label = %entry.label, cursor = self.cursor, "redo");
        Some(entry.label.clone())
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Drop every entry, establishing a fresh baseline.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64() * 1000.0,
        Err(_) => 0.0,
    }
}
