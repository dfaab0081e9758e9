//! Headless surface that records draw calls and answers containment queries.
//!
//! Curves are flattened into line segments in device space as the path is
//! built, the same way a canvas bakes the current transform into path
//! coordinates. Fill containment uses the nonzero winding rule over every
//! subpath (implicitly closed); stroke containment measures the distance to
//! each flattened segment against half the transformed line width.
//!
//! The editor core uses this surface as its hit-testing probe, and tests use
//! it to observe exactly what the renderer painted.

#[cfg(test)]
#[path = "recording_test.rs"]
mod recording_test;

use std::convert::Infallible;

use crate::geom::{Affine, Bounds, Point, point_segment_distance};
use crate::shape::{TextAlign, cubic_point, quad_point};
use crate::style::{Color, Paint};
use crate::surface::{LineStyle, Surface, TextStyle};

/// Line segments per flattened curve.
const CURVE_STEPS: u32 = 16;
/// Line segments per flattened ellipse.
const ELLIPSE_STEPS: u32 = 64;

/// One recorded paint operation, in device space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    Fill { paint: Paint, alpha: f64, bounds: Bounds },
    Stroke { paint: Paint, alpha: f64, width: f64, dash: Vec<f64>, bounds: Bounds },
    Text { text: String, at: Point, align: TextAlign, font_size: f64, alpha: f64 },
}

#[derive(Debug, Clone)]
struct State {
    transform: Affine,
    alpha: f64,
    fill: Paint,
    stroke: Paint,
    line: LineStyle,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            fill: Paint::Solid(Color::rgb(0, 0, 0)),
            stroke: Paint::Solid(Color::rgb(0, 0, 0)),
            line: LineStyle::solid(1.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Subpath {
    points: Vec<Point>,
    closed: bool,
}

/// Recording, query-capable [`Surface`].
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    state: State,
    stack: Vec<State>,
    subpaths: Vec<Subpath>,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything painted since creation or the last [`take_commands`](Self::take_commands).
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Current save/restore depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn device(&self, p: Point) -> Point {
        self.state.transform.apply(p)
    }

    fn last_point(&self) -> Option<Point> {
        self.subpaths.last().and_then(|s| s.points.last().copied())
    }

    /// Subpath to extend, opening a new one at the previous end point if the
    /// last subpath was closed.
    fn open_subpath(&mut self) -> Option<&mut Subpath> {
        let reopen = match self.subpaths.last() {
            Some(last) if last.closed => last.points.first().copied(),
            _ => None,
        };
        if let Some(start) = reopen {
            self.subpaths.push(Subpath { points: vec![start], closed: false });
        }
        self.subpaths.last_mut()
    }

    fn push_device(&mut self, p: Point) {
        if let Some(sub) = self.open_subpath() {
            sub.points.push(p);
        } else {
            self.subpaths.push(Subpath { points: vec![p], closed: false });
        }
    }

    fn path_bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.subpaths.iter().flat_map(|s| s.points.iter().copied()))
    }

    fn winding(&self, p: Point) -> i32 {
        let mut winding = 0;
        for sub in &self.subpaths {
            let n = sub.points.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let a = sub.points[i];
                let b = sub.points[(i + 1) % n];
                let cross = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
                if a.y <= p.y {
                    if b.y > p.y && cross > 0.0 {
                        winding += 1;
                    }
                } else if b.y <= p.y && cross < 0.0 {
                    winding -= 1;
                }
            }
        }
        winding
    }
}

impl Surface for RecordingSurface {
    type Error = Infallible;

    fn clear(&mut self, width: f64, height: f64) -> Result<(), Infallible> {
        self.state.transform = Affine::IDENTITY;
        self.commands.push(DrawCommand::Clear { width, height });
        Ok(())
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_transform(&mut self, m: &Affine) -> Result<(), Infallible> {
        self.state.transform = *m;
        Ok(())
    }

    fn transform(&mut self, m: &Affine) -> Result<(), Infallible> {
        self.state.transform = self.state.transform.then(m);
        Ok(())
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    fn move_to(&mut self, p: Point) {
        let p = self.device(p);
        self.subpaths.push(Subpath { points: vec![p], closed: false });
    }

    fn line_to(&mut self, p: Point) {
        let p = self.device(p);
        self.push_device(p);
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, p: Point) {
        let (c1, c2, end) = (self.device(c1), self.device(c2), self.device(p));
        let start = self.last_point().unwrap_or(c1);
        for i in 1..=CURVE_STEPS {
            let t = f64::from(i) / f64::from(CURVE_STEPS);
            self.push_device(cubic_point(start, c1, c2, end, t));
        }
    }

    fn quad_to(&mut self, c: Point, p: Point) {
        let (c, end) = (self.device(c), self.device(p));
        let start = self.last_point().unwrap_or(c);
        for i in 1..=CURVE_STEPS {
            let t = f64::from(i) / f64::from(CURVE_STEPS);
            self.push_device(quad_point(start, c, end, t));
        }
    }

    fn close_path(&mut self) {
        if let Some(sub) = self.subpaths.last_mut() {
            sub.closed = true;
        }
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(Point::new(x, y));
        self.line_to(Point::new(x + width, y));
        self.line_to(Point::new(x + width, y + height));
        self.line_to(Point::new(x, y + height));
        self.close_path();
    }

    fn ellipse(&mut self, center: Point, rx: f64, ry: f64) -> Result<(), Infallible> {
        let (rx, ry) = (rx.abs(), ry.abs());
        let points: Vec<Point> = (0..ELLIPSE_STEPS)
            .map(|i| {
                let angle = std::f64::consts::TAU * f64::from(i) / f64::from(ELLIPSE_STEPS);
                self.device(Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin()))
            })
            .collect();
        self.subpaths.push(Subpath { points, closed: true });
        Ok(())
    }

    fn set_fill_paint(&mut self, paint: &Paint) -> Result<(), Infallible> {
        self.state.fill = paint.clone();
        Ok(())
    }

    fn set_stroke_paint(&mut self, paint: &Paint) -> Result<(), Infallible> {
        self.state.stroke = paint.clone();
        Ok(())
    }

    fn set_line_style(&mut self, style: &LineStyle) -> Result<(), Infallible> {
        self.state.line = style.clone();
        Ok(())
    }

    fn fill(&mut self) {
        if let Some(bounds) = self.path_bounds() {
            self.commands.push(DrawCommand::Fill {
                paint: self.state.fill.clone(),
                alpha: self.state.alpha,
                bounds,
            });
        }
    }

    fn stroke(&mut self) {
        if let Some(bounds) = self.path_bounds() {
            self.commands.push(DrawCommand::Stroke {
                paint: self.state.stroke.clone(),
                alpha: self.state.alpha,
                width: self.state.line.width * self.state.transform.mean_scale(),
                dash: self.state.line.dash.clone(),
                bounds,
            });
        }
    }

    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle) -> Result<(), Infallible> {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            at: self.device(at),
            align: style.align,
            font_size: style.font_size,
            alpha: self.state.alpha,
        });
        Ok(())
    }

    fn is_point_in_fill(&mut self, p: Point) -> bool {
        self.winding(p) != 0
    }

    fn is_point_in_stroke(&mut self, p: Point) -> bool {
        let half = self.state.line.width * self.state.transform.mean_scale() * 0.5;
        self.subpaths.iter().any(|sub| {
            let n = sub.points.len();
            if n < 2 {
                return false;
            }
            let open_hit = sub
                .points
                .windows(2)
                .any(|w| point_segment_distance(p, w[0], w[1]) <= half);
            let seam_hit = sub.closed && point_segment_distance(p, sub.points[n - 1], sub.points[0]) <= half;
            open_hit || seam_hit
        })
    }
}
