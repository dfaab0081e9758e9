//! Selection resizing through the eight combined-box handles.
//!
//! The combined box at drag start is the reference frame. Each handle moves a
//! fixed set of edges by the net pointer delta; moved edges are clamped so the
//! box never shrinks below the minimum size or flips. The ratio of new to old
//! dimensions is then applied to every selected object, both to its position
//! relative to the box origin and to its kind-specific size fields.

#[cfg(test)]
#[path = "resize_test.rs"]
mod resize_test;

use crate::doc::SceneObject;
use crate::geom::{Bounds, EPSILON, Point};
use crate::hit::ResizeAnchor;
use crate::shape::Shape;

/// Which edges a handle drags, as `(left, top, right, bottom)`.
#[must_use]
pub fn moving_edges(anchor: ResizeAnchor) -> (bool, bool, bool, bool) {
    match anchor {
        ResizeAnchor::N => (false, true, false, false),
        ResizeAnchor::Ne => (false, true, true, false),
        ResizeAnchor::E => (false, false, true, false),
        ResizeAnchor::Se => (false, false, true, true),
        ResizeAnchor::S => (false, false, false, true),
        ResizeAnchor::Sw => (true, false, false, true),
        ResizeAnchor::W => (true, false, false, false),
        ResizeAnchor::Nw => (true, true, false, false),
    }
}

/// New combined box after dragging `anchor` by `delta` from `start`.
#[must_use]
pub fn resized_bounds(start: &Bounds, anchor: ResizeAnchor, delta: Point, min_size: f64) -> Bounds {
    let (moves_left, moves_top, moves_right, moves_bottom) = moving_edges(anchor);
    let (mut left, mut top, mut right, mut bottom) = (start.x, start.y, start.right(), start.bottom());
    if moves_left {
        left = (left + delta.x).min(right - min_size);
    }
    if moves_right {
        right = (right + delta.x).max(left + min_size);
    }
    if moves_top {
        top = (top + delta.y).min(bottom - min_size);
    }
    if moves_bottom {
        bottom = (bottom + delta.y).max(top + min_size);
    }
    Bounds::new(left, top, right - left, bottom - top)
}

/// Per-axis scale between two boxes. A degenerate source axis scales by 1.
#[must_use]
pub fn scale_factors(old: &Bounds, new: &Bounds) -> (f64, f64) {
    let sx = if old.width > EPSILON { new.width / old.width } else { 1.0 };
    let sy = if old.height > EPSILON { new.height / old.height } else { 1.0 };
    (sx, sy)
}

/// `snapshot` rescaled from the `old` combined box into the `new` one.
#[must_use]
pub fn scale_object(snapshot: &SceneObject, old: &Bounds, new: &Bounds) -> SceneObject {
    let (sx, sy) = scale_factors(old, new);
    let mut obj = snapshot.clone();
    obj.transform.x = new.x + (snapshot.transform.x - old.x) * sx;
    obj.transform.y = new.y + (snapshot.transform.y - old.y) * sy;
    match &mut obj.shape {
        Shape::Rect { width, height } => {
            *width *= sx;
            *height *= sy;
        }
        Shape::Ellipse { rx, ry } => {
            *rx *= sx;
            *ry *= sy;
        }
        Shape::Line { end } => {
            *end = Point::new(end.x * sx, end.y * sy);
        }
        Shape::Polygon { radius, .. } => {
            *radius *= sx.max(sy);
        }
        Shape::Path { segments } => {
            for seg in segments.iter_mut() {
                *seg = seg.map_points(|p| Point::new(p.x * sx, p.y * sy));
            }
        }
        Shape::Text { .. } | Shape::Group { .. } => {
            obj.transform.sx *= sx;
            obj.transform.sy *= sy;
        }
    }
    obj
}
