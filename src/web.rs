//! Browser surface: [`Surface`] over a `CanvasRenderingContext2d`.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! Coordinates handed to the core are CSS pixels; the surface folds the device
//! pixel ratio into every transform it sets and into every containment query
//! so that callers never see backing-store pixels.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::{CanvasGradient, CanvasRenderingContext2d};

use crate::geom::{Affine, Point};
use crate::style::Paint;
use crate::surface::{LineStyle, Surface, TextStyle};

/// A 2D canvas context plus the device pixel ratio of its backing store.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    dpr: f64,
}

impl CanvasSurface {
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d, dpr: f64) -> Self {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        Self { ctx, dpr }
    }

    #[must_use]
    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    pub fn set_dpr(&mut self, dpr: f64) {
        if dpr.is_finite() && dpr > 0.0 {
            self.dpr = dpr;
        }
    }

    fn device(&self, m: &Affine) -> Affine {
        Affine { a: self.dpr, d: self.dpr, ..Affine::IDENTITY }.then(m)
    }

    fn gradient(&self, paint: &Paint) -> Result<Option<CanvasGradient>, JsValue> {
        let (gradient, stops) = match paint {
            Paint::Solid(_) => return Ok(None),
            Paint::Linear { start, end, stops } => {
                (self.ctx.create_linear_gradient(start.x, start.y, end.x, end.y), stops)
            }
            Paint::Radial { center, radius, stops } => {
                (self.ctx.create_radial_gradient(center.x, center.y, 0.0, center.x, center.y, *radius)?, stops)
            }
        };
        for (offset, color) in stops {
            #[allow(clippy::cast_possible_truncation)]
            gradient.add_color_stop(*offset as f32, &color.to_css())?;
        }
        Ok(Some(gradient))
    }
}

fn dash_array(dash: &[f64]) -> js_sys::Array {
    let array = js_sys::Array::new();
    for d in dash {
        array.push(&(*d).into());
    }
    array
}

impl Surface for CanvasSurface {
    type Error = JsValue;

    fn clear(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        self.ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0)?;
        self.ctx.clear_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn set_transform(&mut self, m: &Affine) -> Result<(), JsValue> {
        let d = self.device(m);
        self.ctx.set_transform(d.a, d.b, d.c, d.d, d.e, d.f)
    }

    fn transform(&mut self, m: &Affine) -> Result<(), JsValue> {
        self.ctx.transform(m.a, m.b, m.c, m.d, m.e, m.f)
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0));
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, p: Point) {
        self.ctx.move_to(p.x, p.y);
    }

    fn line_to(&mut self, p: Point) {
        self.ctx.line_to(p.x, p.y);
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y);
    }

    fn quad_to(&mut self, c: Point, p: Point) {
        self.ctx.quadratic_curve_to(c.x, c.y, p.x, p.y);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.rect(x, y, width, height);
    }

    fn ellipse(&mut self, center: Point, rx: f64, ry: f64) -> Result<(), JsValue> {
        self.ctx.ellipse(center.x, center.y, rx.abs(), ry.abs(), 0.0, 0.0, TAU)
    }

    fn set_fill_paint(&mut self, paint: &Paint) -> Result<(), JsValue> {
        if let Paint::Solid(color) = paint {
            self.ctx.set_fill_style_str(&color.to_css());
        } else if let Some(gradient) = self.gradient(paint)? {
            self.ctx.set_fill_style_canvas_gradient(&gradient);
        }
        Ok(())
    }

    fn set_stroke_paint(&mut self, paint: &Paint) -> Result<(), JsValue> {
        if let Paint::Solid(color) = paint {
            self.ctx.set_stroke_style_str(&color.to_css());
        } else if let Some(gradient) = self.gradient(paint)? {
            self.ctx.set_stroke_style_canvas_gradient(&gradient);
        }
        Ok(())
    }

    fn set_line_style(&mut self, style: &LineStyle) -> Result<(), JsValue> {
        self.ctx.set_line_width(style.width);
        self.ctx.set_line_cap(style.cap.as_css());
        self.ctx.set_line_join(style.join.as_css());
        self.ctx.set_line_dash(&dash_array(&style.dash))
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle) -> Result<(), JsValue> {
        self.ctx.set_font(&format!("{}px {}", style.font_size, style.font_family));
        self.ctx.set_text_align(style.align.as_css());
        self.ctx.set_text_baseline("middle");
        self.ctx.fill_text(text, at.x, at.y)
    }

    fn is_point_in_fill(&mut self, p: Point) -> bool {
        self.ctx.is_point_in_path_with_f64(p.x * self.dpr, p.y * self.dpr)
    }

    fn is_point_in_stroke(&mut self, p: Point) -> bool {
        self.ctx.is_point_in_stroke_with_x_and_y(p.x * self.dpr, p.y * self.dpr)
    }
}
