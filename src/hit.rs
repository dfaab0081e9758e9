//! Hit-testing: which object, handle, or set of objects lies under a point or box.
//!
//! Queries are stateless and safe to run on every pointer event. Point hits
//! walk layers and objects top-to-bottom and return the first match. Paths are
//! tested through the surface's own fill and stroke containment so curves match
//! what the renderer draws; every other kind is tested in closed form.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use tracing::debug;

use crate::doc::{Layer, LayerId, ObjectId, SceneObject};
use crate::geom::{Affine, Bounds, EPSILON, Point, bounds_intersect, local_to_world, point_segment_distance, world_to_local};
use crate::render::trace_segments;
use crate::shape::{PathSegment, Shape, polygon_vertices, text_bounds};
use crate::surface::{LineStyle, Surface};

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    /// Every anchor, clockwise from the top edge.
    pub const ALL: [ResizeAnchor; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];
}

/// Result of a point hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Top-level object that owns the hit; the unit of selection.
    pub object_id: ObjectId,
    /// Deepest object actually under the point (equals `object_id` outside groups).
    pub target_id: ObjectId,
    /// Layer holding `object_id`.
    pub layer_id: LayerId,
}

/// Tolerances for thin geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOptions {
    /// Maximum distance from a line object, independent of its stroke width.
    pub line_tolerance: f64,
    /// Smallest stroke width used when probing paths.
    pub min_stroke_width: f64,
}

/// Top-most visible, unlocked object under `point` (document coordinates).
///
/// `probe` supplies fill and stroke containment for paths; its transform and
/// style are restored before returning.
#[must_use]
pub fn hit_test<S: Surface>(probe: &mut S, point: Point, layers: &[Layer], opts: &HitOptions) -> Option<Hit> {
    for layer in layers.iter().rev().filter(|l| l.is_interactable()) {
        for obj in layer.objects.iter().rev().filter(|o| o.is_interactable()) {
            if let Some(target_id) = hit_object(probe, obj, point, opts) {
                return Some(Hit { object_id: obj.id, target_id, layer_id: layer.id });
            }
        }
    }
    None
}

/// Test one object against a point given in its parent's space; returns the deepest hit id.
fn hit_object<S: Surface>(probe: &mut S, obj: &SceneObject, point: Point, opts: &HitOptions) -> Option<ObjectId> {
    let local = world_to_local(point, &obj.transform);
    let inside = match &obj.shape {
        Shape::Rect { width, height } => {
            let b = Bounds::from_corners(Point::default(), Point::new(*width, *height));
            !b.is_empty() && b.contains(local)
        }
        Shape::Ellipse { rx, ry } => in_ellipse(local, *rx, *ry),
        Shape::Polygon { sides, radius } => {
            radius.abs() > EPSILON && in_polygon(local, &polygon_vertices(*sides, *radius))
        }
        Shape::Line { end } => {
            let a = local_to_world(Point::default(), &obj.transform);
            let b = local_to_world(*end, &obj.transform);
            point_segment_distance(point, a, b) <= opts.line_tolerance
        }
        Shape::Text { text, font_size, align, .. } => {
            let b = text_bounds(text, *font_size, *align);
            !b.is_empty() && b.contains(local)
        }
        Shape::Path { segments } => probe_path(probe, obj, segments, local, opts),
        Shape::Group { children } => {
            return children
                .iter()
                .rev()
                .filter(|c| c.is_interactable())
                .find_map(|c| hit_object(probe, c, local, opts));
        }
    };
    inside.then_some(obj.id)
}

fn in_ellipse(p: Point, rx: f64, ry: f64) -> bool {
    if rx.abs() < EPSILON || ry.abs() < EPSILON {
        return false;
    }
    let nx = p.x / rx;
    let ny = p.y / ry;
    nx * nx + ny * ny <= 1.0
}

/// Even-odd containment in a closed polygon.
fn in_polygon(p: Point, vertices: &[Point]) -> bool {
    let mut inside = false;
    let n = vertices.len();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + n - 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn probe_path<S: Surface>(
    probe: &mut S,
    obj: &SceneObject,
    segments: &[PathSegment],
    local: Point,
    opts: &HitOptions,
) -> bool {
    probe.save();
    let result = probe_path_in_frame(probe, obj, segments, local, opts);
    probe.restore();
    match result {
        Ok(hit) => hit,
        Err(_) => {
            debug!(id = %obj.id, "path probe failed; treating as miss");
            false
        }
    }
}

fn probe_path_in_frame<S: Surface>(
    probe: &mut S,
    obj: &SceneObject,
    segments: &[PathSegment],
    local: Point,
    opts: &HitOptions,
) -> Result<bool, S::Error> {
    probe.set_transform(&Affine::IDENTITY)?;
    probe.begin_path();
    trace_segments(probe, segments);
    if obj.fill.is_some() && probe.is_point_in_fill(local) {
        return Ok(true);
    }
    // The probe works in local units, so the minimum width is scaled down to stay constant on screen.
    let scale = Affine::from(&obj.transform).mean_scale();
    let min_local = if scale > EPSILON { opts.min_stroke_width / scale } else { opts.min_stroke_width };
    let actual = obj.stroke.as_ref().map_or(0.0, |s| s.width);
    probe.set_line_style(&LineStyle::solid(actual.max(min_local)))?;
    Ok(probe.is_point_in_stroke(local))
}

// =============================================================
// Handles
// =============================================================

/// Handle centers on the corners and edge midpoints of `bounds`.
#[must_use]
pub fn handle_positions(bounds: &Bounds) -> [(ResizeAnchor, Point); 8] {
    let (l, t, r, b) = (bounds.x, bounds.y, bounds.right(), bounds.bottom());
    let c = bounds.center();
    ResizeAnchor::ALL.map(|anchor| {
        let pos = match anchor {
            ResizeAnchor::N => Point::new(c.x, t),
            ResizeAnchor::Ne => Point::new(r, t),
            ResizeAnchor::E => Point::new(r, c.y),
            ResizeAnchor::Se => Point::new(r, b),
            ResizeAnchor::S => Point::new(c.x, b),
            ResizeAnchor::Sw => Point::new(l, b),
            ResizeAnchor::W => Point::new(l, c.y),
            ResizeAnchor::Nw => Point::new(l, t),
        };
        (anchor, pos)
    })
}

/// Handle whose square of half-size `radius` contains `point`, nearest first.
/// Corners win ties with edge handles.
#[must_use]
pub fn hit_handle(point: Point, bounds: &Bounds, radius: f64) -> Option<ResizeAnchor> {
    let handles = handle_positions(bounds);
    let is_corner = |a: &ResizeAnchor| matches!(a, ResizeAnchor::Ne | ResizeAnchor::Se | ResizeAnchor::Sw | ResizeAnchor::Nw);
    handles
        .iter()
        .filter(|(a, _)| is_corner(a))
        .chain(handles.iter().filter(|(a, _)| !is_corner(a)))
        .filter(|(_, pos)| (point.x - pos.x).abs() <= radius && (point.y - pos.y).abs() <= radius)
        .min_by(|(_, a), (_, b)| point.distance(*a).total_cmp(&point.distance(*b)))
        .map(|(a, _)| *a)
}

// =============================================================
// Marquee
// =============================================================

/// Every visible, unlocked top-level object whose world box intersects `rect`,
/// in render order across layers.
#[must_use]
pub fn objects_in_rect(layers: &[Layer], rect: &Bounds) -> Vec<ObjectId> {
    layers
        .iter()
        .filter(|l| l.is_interactable())
        .flat_map(|l| l.objects.iter())
        .filter(|o| o.is_interactable() && bounds_intersect(&o.world_bounds(), rect))
        .map(|o| o.id)
        .collect()
}
