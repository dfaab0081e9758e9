//! Raster-surface abstraction consumed by the renderer and hit-tester.
//!
//! The host supplies a surface; the core never touches a concrete canvas API.
//! The method set mirrors the 2D canvas model: a current path built with
//! move/line/curve commands, a current transform composed with
//! [`Surface::transform`], and a save/restore stack covering transform and
//! style state.
//!
//! Containment queries take points in the surface's untransformed space and
//! test them against the current path as it was laid down, matching canvas
//! `isPointInPath` semantics. The hit-tester resets the transform to identity
//! before building a probe path so that local coordinates can be passed
//! straight through.

use crate::geom::{Affine, Point};
use crate::shape::TextAlign;
use crate::style::{LineCap, LineJoin, Paint};

/// Stroke parameters set on a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub dash: Vec<f64>,
}

impl LineStyle {
    /// Solid butt/miter line of the given width.
    #[must_use]
    pub fn solid(width: f64) -> Self {
        Self { width, cap: LineCap::Butt, join: LineJoin::Miter, dash: Vec::new() }
    }
}

/// Font parameters for point text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub font_family: String,
    pub align: TextAlign,
}

/// Host raster surface.
pub trait Surface {
    /// Substrate error type; [`std::convert::Infallible`] for surfaces that cannot fail.
    type Error;

    /// Reset the transform to identity and clear `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Propagates substrate failures.
    fn clear(&mut self, width: f64, height: f64) -> Result<(), Self::Error>;

    /// Push transform and style state.
    fn save(&mut self);

    /// Pop transform and style state.
    fn restore(&mut self);

    /// Replace the current transform.
    ///
    /// # Errors
    ///
    /// Propagates substrate failures.
    fn set_transform(&mut self, m: &Affine) -> Result<(), Self::Error>;

    /// Compose `m` after the current transform (`current = current * m`).
    ///
    /// # Errors
    ///
    /// Propagates substrate failures.
    fn transform(&mut self, m: &Affine) -> Result<(), Self::Error>;

    fn set_global_alpha(&mut self, alpha: f64);

    // --- Path construction ---

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn cubic_to(&mut self, c1: Point, c2: Point, p: Point);
    fn quad_to(&mut self, c: Point, p: Point);
    fn close_path(&mut self);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Closed elliptical subpath centered on `center`.
    ///
    /// # Errors
    ///
    /// Propagates substrate failures (e.g. negative radii on canvas).
    fn ellipse(&mut self, center: Point, rx: f64, ry: f64) -> Result<(), Self::Error>;

    // --- Style ---

    /// # Errors
    ///
    /// Propagates substrate failures while building gradients.
    fn set_fill_paint(&mut self, paint: &Paint) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Propagates substrate failures while building gradients.
    fn set_stroke_paint(&mut self, paint: &Paint) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Propagates substrate failures while setting the dash pattern.
    fn set_line_style(&mut self, style: &LineStyle) -> Result<(), Self::Error>;

    // --- Painting ---

    fn fill(&mut self);
    fn stroke(&mut self);

    /// Paint single-line text with the current fill paint, anchored at `at`.
    ///
    /// # Errors
    ///
    /// Propagates substrate failures.
    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle) -> Result<(), Self::Error>;

    // --- Queries ---

    /// Whether `p` lies inside the current path's fill (nonzero winding).
    fn is_point_in_fill(&mut self, p: Point) -> bool;

    /// Whether `p` lies within the current path's stroke at the current line width.
    fn is_point_in_stroke(&mut self, p: Point) -> bool;
}
