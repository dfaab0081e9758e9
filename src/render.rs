//! Rendering: paints the scene and the selection overlay to a [`Surface`].
//!
//! The renderer receives read-only views of document and UI state and
//! produces pixels. It never mutates application state. Scene and overlay are
//! painted to separate surfaces so the overlay can repaint on every pointer
//! move without touching the committed scene.
//!
//! Substrate errors propagate as `Result<(), S::Error>`. Every `save` is paired
//! with a `restore` on both the success and the error path.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::consts::{SELECTION_COLOR, SELECTION_DASH};
use crate::doc::{Document, Layer, SceneObject};
use crate::geom::{Affine, Bounds, Point, local_to_world};
use crate::hit::handle_positions;
use crate::input::UiState;
use crate::shape::{PathSegment, Shape, local_bounds, polygon_vertices};
use crate::style::{Color, Paint};
use crate::surface::{LineStyle, Surface, TextStyle};

/// Translucent fill of the marquee rectangle.
const MARQUEE_FILL: Color = Color { r: 30, g: 144, b: 255, a: 0.12 };
/// Handle body color.
const HANDLE_FILL: Color = Color::rgb(0xFF, 0xFF, 0xFF);

/// Paint every visible layer bottom-to-top after clearing `width` x `height`.
///
/// Layer opacity multiplies into object opacity; hidden layers and hidden
/// objects are skipped along with their subtrees.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn render_scene<S: Surface>(surface: &mut S, layers: &[Layer], width: f64, height: f64) -> Result<(), S::Error> {
    surface.clear(width, height)?;
    for layer in layers.iter().filter(|l| l.visible) {
        for obj in &layer.objects {
            draw_object(surface, obj, layer.opacity)?;
        }
    }
    Ok(())
}

/// Paint selection outlines, the combined-box handles, the marquee, and any
/// creation preview after clearing `width` x `height`.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn render_selection_overlay<S: Surface>(
    surface: &mut S,
    doc: &Document,
    ui: &UiState,
    handle_radius: f64,
    width: f64,
    height: f64,
) -> Result<(), S::Error> {
    surface.clear(width, height)?;

    if let Some(preview) = &ui.preview {
        draw_object(surface, preview, 1.0)?;
    }

    let accent = Paint::Solid(accent_color());
    let selected: Vec<&SceneObject> = doc.selection().iter().filter_map(|id| doc.object(id)).collect();
    for obj in &selected {
        draw_outline(surface, obj, &accent)?;
    }

    if let Some(bounds) = doc.selection_bounds() {
        if selected.len() > 1 {
            surface.begin_path();
            surface.rect(bounds.x, bounds.y, bounds.width, bounds.height);
            surface.set_stroke_paint(&accent)?;
            surface.set_line_style(&LineStyle::solid(1.0))?;
            surface.stroke();
        }
        draw_handles(surface, &bounds, handle_radius, &accent)?;
    }

    if let Some(marquee) = ui.marquee {
        draw_marquee(surface, &marquee, &accent)?;
    }

    Ok(())
}

// =============================================================
// Object dispatch
// =============================================================

fn draw_object<S: Surface>(surface: &mut S, obj: &SceneObject, parent_opacity: f64) -> Result<(), S::Error> {
    if !obj.visible {
        return Ok(());
    }
    let opacity = parent_opacity * obj.opacity;
    surface.save();
    let result = draw_object_in_frame(surface, obj, opacity);
    surface.restore();
    result
}

fn draw_object_in_frame<S: Surface>(surface: &mut S, obj: &SceneObject, opacity: f64) -> Result<(), S::Error> {
    surface.transform(&Affine::from(&obj.transform))?;
    surface.set_global_alpha(opacity);

    match &obj.shape {
        Shape::Group { children } => {
            for child in children {
                draw_object(surface, child, opacity)?;
            }
            Ok(())
        }
        Shape::Text { text, font_size, font_family, align } => {
            let Some(fill) = &obj.fill else {
                return Ok(());
            };
            surface.set_fill_paint(&Paint::from(fill))?;
            let style = TextStyle { font_size: *font_size, font_family: font_family.clone(), align: *align };
            surface.fill_text(text, Point::default(), &style)
        }
        shape => {
            trace_shape(surface, shape)?;
            paint_current_path(surface, obj)
        }
    }
}

fn paint_current_path<S: Surface>(surface: &mut S, obj: &SceneObject) -> Result<(), S::Error> {
    let fillable = !matches!(obj.shape, Shape::Line { .. });
    if let Some(fill) = obj.fill.as_ref().filter(|_| fillable) {
        surface.set_fill_paint(&Paint::from(fill))?;
        surface.fill();
    }
    if let Some(stroke) = &obj.stroke {
        if stroke.width > 0.0 {
            surface.set_stroke_paint(&Paint::Solid(stroke.color))?;
            surface.set_line_style(&LineStyle {
                width: stroke.width,
                cap: stroke.cap,
                join: stroke.join,
                dash: stroke.dash.clone(),
            })?;
            surface.stroke();
        }
    }
    Ok(())
}

// =============================================================
// Path construction
// =============================================================

/// Begin a new path and lay down the local-space outline of `shape`.
///
/// Text and groups have no outline; the path is left empty.
///
/// # Errors
///
/// Returns `Err` if the surface rejects the ellipse.
pub fn trace_shape<S: Surface>(surface: &mut S, shape: &Shape) -> Result<(), S::Error> {
    surface.begin_path();
    match shape {
        Shape::Rect { width, height } => surface.rect(0.0, 0.0, *width, *height),
        Shape::Ellipse { rx, ry } => surface.ellipse(Point::default(), *rx, *ry)?,
        Shape::Path { segments } => trace_segments(surface, segments),
        Shape::Line { end } => {
            surface.move_to(Point::default());
            surface.line_to(*end);
        }
        Shape::Polygon { sides, radius } => trace_closed(surface, &polygon_vertices(*sides, *radius)),
        Shape::Text { .. } | Shape::Group { .. } => {}
    }
    Ok(())
}

/// Append path segments to the current path.
pub fn trace_segments<S: Surface>(surface: &mut S, segments: &[PathSegment]) {
    for seg in segments {
        match *seg {
            PathSegment::MoveTo { to } => surface.move_to(to),
            PathSegment::LineTo { to } => surface.line_to(to),
            PathSegment::CubicTo { c1, c2, to } => surface.cubic_to(c1, c2, to),
            PathSegment::QuadTo { c, to } => surface.quad_to(c, to),
            PathSegment::Close => surface.close_path(),
        }
    }
}

fn trace_closed<S: Surface>(surface: &mut S, points: &[Point]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    surface.move_to(*first);
    for p in rest {
        surface.line_to(*p);
    }
    surface.close_path();
}

// =============================================================
// Selection UI
// =============================================================

fn accent_color() -> Color {
    Color::from_hex(SELECTION_COLOR).unwrap_or(Color::rgb(30, 144, 255))
}

fn dashed(width: f64) -> LineStyle {
    LineStyle { dash: vec![SELECTION_DASH, SELECTION_DASH], ..LineStyle::solid(width) }
}

/// Dashed outline of the object's local bounds, rotated with the object.
fn draw_outline<S: Surface>(surface: &mut S, obj: &SceneObject, accent: &Paint) -> Result<(), S::Error> {
    let corners = local_bounds(&obj.shape)
        .corners()
        .map(|p| local_to_world(p, &obj.transform));
    surface.begin_path();
    trace_closed(surface, &corners);
    surface.set_stroke_paint(accent)?;
    surface.set_line_style(&dashed(1.0))?;
    surface.stroke();
    Ok(())
}

fn draw_handles<S: Surface>(surface: &mut S, bounds: &Bounds, radius: f64, accent: &Paint) -> Result<(), S::Error> {
    surface.set_fill_paint(&Paint::Solid(HANDLE_FILL))?;
    surface.set_stroke_paint(accent)?;
    surface.set_line_style(&LineStyle::solid(1.0))?;
    for (_, pos) in handle_positions(bounds) {
        surface.begin_path();
        surface.rect(pos.x - radius, pos.y - radius, radius * 2.0, radius * 2.0);
        surface.fill();
        surface.stroke();
    }
    Ok(())
}

fn draw_marquee<S: Surface>(surface: &mut S, marquee: &Bounds, accent: &Paint) -> Result<(), S::Error> {
    surface.begin_path();
    surface.rect(marquee.x, marquee.y, marquee.width, marquee.height);
    surface.set_fill_paint(&Paint::Solid(MARQUEE_FILL))?;
    surface.fill();
    surface.set_stroke_paint(accent)?;
    surface.set_line_style(&dashed(1.0))?;
    surface.stroke();
    Ok(())
}
