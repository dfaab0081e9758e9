//! Freehand stroke capture and smoothing.
//!
//! Samples closer than the minimum spacing to the last retained sample are
//! dropped as they arrive. On commit, each pair of consecutive samples becomes
//! one cubic bezier whose control points follow a cardinal-spline tangent: the
//! chord from the previous to the next sample, scaled by the tension. This gives
//! a smooth curve through every retained sample without a global fit.

#[cfg(test)]
#[path = "freehand_test.rs"]
mod freehand_test;

use crate::geom::Point;
use crate::shape::PathSegment;

/// Append `p` if it is at least `min_spacing` from the last retained sample.
/// Returns whether the sample was kept.
pub fn push_sample(points: &mut Vec<Point>, p: Point, min_spacing: f64) -> bool {
    match points.last() {
        Some(last) if last.distance(p) < min_spacing => false,
        _ => {
            points.push(p);
            true
        }
    }
}

/// Smooth cubic segments through `points`, starting with a move-to.
///
/// Returns an empty list for fewer than two points.
#[must_use]
pub fn fit_segments(points: &[Point], tension: f64) -> Vec<PathSegment> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    if points.len() < 2 {
        return Vec::new();
    }
    let k = tension / 3.0;
    let last = points.len() - 1;
    let mut segments = Vec::with_capacity(points.len());
    segments.push(PathSegment::MoveTo { to: *first });
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        segments.push(PathSegment::CubicTo {
            c1: p1.add(p2.sub(p0).scale(k)),
            c2: p2.sub(p3.sub(p1).scale(k)),
            to: p2,
        });
    }
    segments
}

/// Largest distance from the first sample to any other sample.
#[must_use]
pub fn stroke_extent(points: &[Point]) -> f64 {
    let Some(first) = points.first() else {
        return 0.0;
    };
    points.iter().map(|p| first.distance(*p)).fold(0.0, f64::max)
}
