//! Per-kind geometry of scene objects.
//!
//! [`Shape`] is the closed set of drawable kinds. Its fields are local-space
//! geometry only; where an object sits in the world is the job of its
//! [`Transform`](crate::geom::Transform). Algorithms that differ per kind are
//! free functions matching on the tag, shared by the renderer, hit-tester, and
//! interaction engine.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_POLYGON_SIDES;
use crate::doc::SceneObject;
use crate::geom::{Bounds, Point, merge_bounds, transform_bounds};

/// Horizontal alignment of point text relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// One path command. Coordinates are absolute in the object's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PathSegment {
    MoveTo { to: Point },
    LineTo { to: Point },
    CubicTo { c1: Point, c2: Point, to: Point },
    QuadTo { c: Point, to: Point },
    Close,
}

impl PathSegment {
    /// Every coordinate carried by the segment, end point last.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        match *self {
            Self::MoveTo { to } | Self::LineTo { to } => vec![to],
            Self::CubicTo { c1, c2, to } => vec![c1, c2, to],
            Self::QuadTo { c, to } => vec![c, to],
            Self::Close => Vec::new(),
        }
    }

    /// Apply `f` to every coordinate carried by the segment.
    #[must_use]
    pub fn map_points(self, f: impl Fn(Point) -> Point) -> Self {
        match self {
            Self::MoveTo { to } => Self::MoveTo { to: f(to) },
            Self::LineTo { to } => Self::LineTo { to: f(to) },
            Self::CubicTo { c1, c2, to } => Self::CubicTo { c1: f(c1), c2: f(c2), to: f(to) },
            Self::QuadTo { c, to } => Self::QuadTo { c: f(c), to: f(to) },
            Self::Close => Self::Close,
        }
    }
}

/// Kind-specific geometry of a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    /// Rectangle spanning `(0, 0)` to `(width, height)`.
    Rect { width: f64, height: f64 },
    /// Ellipse centered on the local origin.
    Ellipse { rx: f64, ry: f64 },
    /// Free-form path.
    Path { segments: Vec<PathSegment> },
    /// Segment from the local origin to `end`.
    Line { end: Point },
    /// Regular polygon centered on the local origin, first vertex pointing up.
    Polygon { sides: u32, radius: f64 },
    /// Single-line point text anchored at the local origin.
    Text { text: String, font_size: f64, font_family: String, align: TextAlign },
    /// Structural container; children are in the group's local space.
    Group { children: Vec<SceneObject> },
}

impl Shape {
    /// Lowercase tag used in logs and default names.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Rect { .. } => "rect",
            Self::Ellipse { .. } => "ellipse",
            Self::Path { .. } => "path",
            Self::Line { .. } => "line",
            Self::Polygon { .. } => "polygon",
            Self::Text { .. } => "text",
            Self::Group { .. } => "group",
        }
    }
}

/// Approximate advance of one glyph as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;
/// Line box height as a fraction of the font size.
const LINE_HEIGHT: f64 = 1.2;

/// Local-space bounding box of an object's geometry (stroke excluded).
#[must_use]
pub fn local_bounds(shape: &Shape) -> Bounds {
    match shape {
        Shape::Rect { width, height } => Bounds::from_corners(Point::default(), Point::new(*width, *height)),
        Shape::Ellipse { rx, ry } => {
            let (rx, ry) = (rx.abs(), ry.abs());
            Bounds::new(-rx, -ry, rx * 2.0, ry * 2.0)
        }
        Shape::Path { segments } => path_bounds(segments),
        Shape::Line { end } => Bounds::from_corners(Point::default(), *end),
        Shape::Polygon { sides, radius } => Bounds::enclosing(polygon_vertices(*sides, *radius)).unwrap_or_default(),
        Shape::Text { text, font_size, align, .. } => text_bounds(text, *font_size, *align),
        Shape::Group { children } => children
            .iter()
            .map(|c| transform_bounds(&local_bounds(&c.shape), &c.transform))
            .reduce(|a, b| merge_bounds(&a, &b))
            .unwrap_or_default(),
    }
}

/// Vertices of a regular polygon. The side count is clamped to `[3, MAX_POLYGON_SIDES]`.
#[must_use]
pub fn polygon_vertices(sides: u32, radius: f64) -> Vec<Point> {
    let n = sides.clamp(3, MAX_POLYGON_SIDES);
    let step = std::f64::consts::TAU / f64::from(n);
    (0..n)
        .map(|i| {
            let angle = step.mul_add(f64::from(i), -std::f64::consts::FRAC_PI_2);
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Estimated box of single-line text at the anchor, vertically centered.
#[must_use]
pub fn text_bounds(text: &str, font_size: f64, align: TextAlign) -> Bounds {
    #[allow(clippy::cast_precision_loss)]
    let width = text.chars().count() as f64 * font_size * GLYPH_ADVANCE;
    let height = font_size * LINE_HEIGHT;
    let x = match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -width * 0.5,
        TextAlign::Right => -width,
    };
    Bounds::new(x, -height * 0.5, width, height)
}

/// Tight box of a path, including curve extrema.
#[must_use]
pub fn path_bounds(segments: &[PathSegment]) -> Bounds {
    let mut points = Vec::new();
    let mut current = Point::default();
    let mut subpath_start = Point::default();
    for seg in segments {
        match *seg {
            PathSegment::MoveTo { to } => {
                points.push(to);
                current = to;
                subpath_start = to;
            }
            PathSegment::LineTo { to } => {
                points.push(current);
                points.push(to);
                current = to;
            }
            PathSegment::QuadTo { c, to } => {
                points.push(current);
                points.push(to);
                for t in quad_extrema(current, c, to) {
                    points.push(quad_point(current, c, to, t));
                }
                current = to;
            }
            PathSegment::CubicTo { c1, c2, to } => {
                points.push(current);
                points.push(to);
                for t in cubic_extrema(current, c1, c2, to) {
                    points.push(cubic_point(current, c1, c2, to, t));
                }
                current = to;
            }
            PathSegment::Close => current = subpath_start,
        }
    }
    Bounds::enclosing(points).unwrap_or_default()
}

/// Point on a quadratic bezier at parameter `t`.
#[must_use]
pub fn quad_point(p0: Point, c: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    p0.scale(mt * mt).add(c.scale(2.0 * mt * t)).add(p1.scale(t * t))
}

/// Point on a cubic bezier at parameter `t`.
#[must_use]
pub fn cubic_point(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    p0.scale(mt * mt * mt)
        .add(c1.scale(3.0 * mt * mt * t))
        .add(c2.scale(3.0 * mt * t * t))
        .add(p1.scale(t * t * t))
}

fn quad_extrema(p0: Point, c: Point, p1: Point) -> Vec<f64> {
    let mut out = Vec::new();
    for (a, b, d) in [(p0.x, c.x, p1.x), (p0.y, c.y, p1.y)] {
        let denom = a - 2.0 * b + d;
        if denom.abs() > f64::EPSILON {
            let t = (a - b) / denom;
            if t > 0.0 && t < 1.0 {
                out.push(t);
            }
        }
    }
    out
}

fn cubic_extrema(p0: Point, c1: Point, c2: Point, p1: Point) -> Vec<f64> {
    let mut out = Vec::new();
    for (a, b, c, d) in [(p0.x, c1.x, c2.x, p1.x), (p0.y, c1.y, c2.y, p1.y)] {
        // Derivative coefficients of the cubic in power form.
        let qa = -a + 3.0 * b - 3.0 * c + d;
        let qb = 2.0 * (a - 2.0 * b + c);
        let qc = b - a;
        if qa.abs() < f64::EPSILON {
            if qb.abs() > f64::EPSILON {
                out.push(-qc / qb);
            }
            continue;
        }
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            continue;
        }
        let sq = disc.sqrt();
        out.push((-qb + sq) / (2.0 * qa));
        out.push((-qb - sq) / (2.0 * qa));
    }
    out.retain(|t| *t > 0.0 && *t < 1.0);
    out
}
