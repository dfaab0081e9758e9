//! Geometry kernel: points, object transforms, affine matrices, and bounding boxes.
//!
//! Everything here is pure and stateless. Rotation is clockwise-positive in a
//! y-down frame, matching the 2D canvas convention, and the local-to-world
//! order of a [`Transform`] is scale, then rotate, then translate.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// Magnitudes below this are treated as zero when inverting.
pub const EPSILON: f64 = 1e-9;

/// A point in either local or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    #[must_use]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    #[must_use]
    pub fn scale(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Per-object transform: position, clockwise rotation in degrees, and independent axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World x of the local origin.
    pub x: f64,
    /// World y of the local origin.
    pub y: f64,
    /// Clockwise rotation in degrees around the local origin.
    pub rotation: f64,
    /// Horizontal scale applied before rotation.
    pub sx: f64,
    /// Vertical scale applied before rotation.
    pub sy: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, rotation: 0.0, sx: 1.0, sy: 1.0 }
    }
}

impl Transform {
    /// Identity transform translated to `(x, y)`.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, ..Self::default() }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.rotation, self.sx, self.sy]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Map a local-space point to world space through `t`.
#[must_use]
pub fn local_to_world(p: Point, t: &Transform) -> Point {
    let (sin, cos) = t.rotation.to_radians().sin_cos();
    let x = p.x * t.sx;
    let y = p.y * t.sy;
    Point {
        x: x * cos - y * sin + t.x,
        y: x * sin + y * cos + t.y,
    }
}

/// Map a world-space point into the local space of `t`.
///
/// An axis whose scale is zero is not invertible; that axis is pinned to the
/// local origin so the result stays finite.
#[must_use]
pub fn world_to_local(p: Point, t: &Transform) -> Point {
    let (sin, cos) = t.rotation.to_radians().sin_cos();
    let dx = p.x - t.x;
    let dy = p.y - t.y;
    let rx = dx * cos + dy * sin;
    let ry = -dx * sin + dy * cos;
    Point {
        x: if t.sx.abs() < EPSILON { 0.0 } else { rx / t.sx },
        y: if t.sy.abs() < EPSILON { 0.0 } else { ry / t.sy },
    }
}

/// General 2x3 affine matrix in canvas order `[a, b, c, d, e, f]`.
///
/// A point maps to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    #[must_use]
    pub fn translate(x: f64, y: f64) -> Self {
        Self { e: x, f: y, ..Self::IDENTITY }
    }

    /// `self` applied after `inner`: the result maps `p` to `self(inner(p))`.
    #[must_use]
    pub fn then(&self, inner: &Affine) -> Affine {
        Affine {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse matrix, or `None` when the matrix is singular.
    #[must_use]
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() < EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Geometric mean of the axis scale factors; used to size strokes in device space.
    #[must_use]
    pub fn mean_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }
}

impl From<&Transform> for Affine {
    fn from(t: &Transform) -> Self {
        let (sin, cos) = t.rotation.to_radians().sin_cos();
        Affine {
            a: cos * t.sx,
            b: sin * t.sx,
            c: -sin * t.sy,
            d: cos * t.sy,
            e: t.x,
            f: t.y,
        }
    }
}

/// Axis-aligned box. `width` and `height` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized box spanning two corners given in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self { x, y, width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self { x: min_x, y: min_y, width: max_x - min_x, height: max_y - min_y })
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    /// Closed containment test (edges count as inside).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Minimal axis-aligned box enclosing the four corners of `local` mapped through `t`.
#[must_use]
pub fn transform_bounds(local: &Bounds, t: &Transform) -> Bounds {
    transform_bounds_affine(local, &Affine::from(t))
}

/// [`transform_bounds`] for an arbitrary affine matrix.
#[must_use]
pub fn transform_bounds_affine(local: &Bounds, m: &Affine) -> Bounds {
    let [a, b, c, d] = local.corners().map(|p| m.apply(p));
    Bounds::enclosing([a, b, c, d]).unwrap_or_default()
}

/// Union of two boxes.
#[must_use]
pub fn merge_bounds(a: &Bounds, b: &Bounds) -> Bounds {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    let right = a.right().max(b.right());
    let bottom = a.bottom().max(b.bottom());
    Bounds { x, y, width: right - x, height: bottom - y }
}

/// Closed-interval overlap test; boxes that only touch count as intersecting.
#[must_use]
pub fn bounds_intersect(a: &Bounds, b: &Bounds) -> bool {
    a.x <= b.right() && b.x <= a.right() && a.y <= b.bottom() && b.y <= a.bottom()
}

/// Shortest distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b.sub(a);
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq < EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a.add(ab.scale(t)))
}
