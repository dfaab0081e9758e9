//! Input model: tools, modifier keys, and the gesture state machine.
//!
//! This module defines the types consumed by the interaction engine. `Tool`
//! and `Modifiers` capture the user's intent at the time of a pointer event.
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up, carrying the snapshots needed to compute net deltas, cancel
//! cleanly, and emit one history entry on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::{ObjectId, SceneObject};
use crate::geom::{Bounds, Point};
use crate::hit::{Hit, ResizeAnchor};

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    /// Drag out a rectangle.
    Rect,
    /// Drag out an ellipse inscribed in the drag box.
    Ellipse,
    /// Drag a straight line segment.
    Line,
    /// Drag a regular polygon from its center.
    Polygon,
    /// Click to place point text.
    Text,
    /// Draw a smoothed freehand path.
    Freehand,
}

impl Tool {
    /// Whether this tool creates an object from a two-point drag, so a tiny drag is discarded.
    #[must_use]
    pub fn is_shape(self) -> bool {
        matches!(self, Self::Rect | Self::Ellipse | Self::Line | Self::Polygon)
    }

    /// Lowercase name used in history labels and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Rect => "rect",
            Self::Ellipse => "ellipse",
            Self::Line => "line",
            Self::Polygon => "polygon",
            Self::Text => "text",
            Self::Freehand => "freehand",
        }
    }
}

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether selection gestures should add to the selection instead of replacing it.
    #[must_use]
    pub fn additive(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Transient UI state visible to the overlay renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// Marquee rectangle in document coordinates while a marquee drag is live.
    pub marquee: Option<Bounds>,
    /// In-progress object from a creation or freehand gesture.
    pub preview: Option<SceneObject>,
}

/// Internal state for the gesture state machine.
///
/// Each active variant carries the context needed to compute the next frame
/// from the gesture origin and to restore the document on cancel.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Select tool pressed but the pointer has not yet travelled past the drag threshold.
    Pending {
        /// Pointer-down position.
        start: Point,
        /// Top-level object under the pointer at pointer-down, if any.
        hit: Option<Hit>,
        /// Modifiers held at pointer-down.
        modifiers: Modifiers,
    },
    /// The selection is being translated.
    Moving {
        /// Pointer-down position; every frame offsets from here.
        start: Point,
        /// Every selected object as it was when the move began.
        snapshots: Vec<SceneObject>,
        /// Selection before the press picked up an unselected object, restored on cancel.
        prior_selection: Vec<ObjectId>,
    },
    /// The selection is being scaled through one of its eight handles.
    Resizing {
        /// Which handle is dragged.
        anchor: ResizeAnchor,
        /// Pointer-down position; the handle edge follows the net pointer delta.
        start: Point,
        /// Combined box of the selection at drag start.
        start_bounds: Bounds,
        /// Every selected object as it was when the resize began.
        snapshots: Vec<SceneObject>,
    },
    /// A marquee rectangle is being dragged.
    Marquee {
        /// Drag origin.
        start: Point,
        /// Current pointer position.
        current: Point,
        /// Whether hits union into the prior selection.
        additive: bool,
        /// Selection at drag start, restored on cancel.
        prior_selection: Vec<ObjectId>,
    },
    /// A shape or text tool press is in progress; the object is added on release.
    Creating {
        /// The creation tool in use.
        tool: Tool,
        /// Drag origin.
        start: Point,
        /// Current pointer position.
        current: Point,
    },
    /// A freehand stroke is being sampled.
    Drawing {
        /// Retained samples after spacing filtering.
        points: Vec<Point>,
    },
}

impl InputState {
    /// Short name of the gesture, for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending { .. } => "pending",
            Self::Moving { .. } => "moving",
            Self::Resizing { .. } => "resizing",
            Self::Marquee { .. } => "marquee",
            Self::Creating { .. } => "creating",
            Self::Drawing { .. } => "drawing",
        }
    }
}
