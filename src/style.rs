//! Paint styles: colors, fills, gradients, and strokes.
//!
//! These are the persisted style fields of a scene object. The renderer turns
//! a [`Fill`] into a [`Paint`], which is what a surface actually consumes.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use serde::{Deserialize, Serialize};

use crate::geom::Point;

/// RGBA color with 8-bit channels and a unit alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha in `[0, 1]`.
    pub a: f64,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| match u8::from_str_radix(hex.get(i..i + 2)?, 16) {
            Ok(v) => Some(v),
            Err(_) => None,
        };
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: f64::from(channel(6)?) / 255.0,
            }),
            _ => None,
        }
    }

    /// Same color with alpha multiplied by `k` and clamped to `[0, 1]`.
    #[must_use]
    pub fn with_alpha_scaled(self, k: f64) -> Self {
        Self { a: (self.a * k).clamp(0.0, 1.0), ..self }
    }

    /// CSS `rgba(...)` string.
    #[must_use]
    pub fn to_css(self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Default fill color for new shapes.
pub const DEFAULT_FILL: Color = Color::rgb(0xD9, 0x4B, 0x4B);
/// Default stroke color for new shapes.
pub const DEFAULT_STROKE: Color = Color::rgb(0x1F, 0x1A, 0x17);

/// One color stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f64,
    pub color: Color,
    /// Multiplied into the stop color's alpha only.
    pub opacity: f64,
}

/// Object fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fill {
    Solid { color: Color },
    LinearGradient { start: Point, end: Point, stops: Vec<GradientStop> },
    RadialGradient { center: Point, radius: f64, stops: Vec<GradientStop> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Miter => "miter",
            Self::Round => "round",
            Self::Bevel => "bevel",
        }
    }
}

/// Object outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Alternating dash/gap lengths; empty for a solid line.
    pub dash: Vec<f64>,
}

/// Solid fill in the default shape color.
#[must_use]
pub fn default_fill() -> Fill {
    Fill::Solid { color: DEFAULT_FILL }
}

/// One-unit solid stroke in the default outline color.
#[must_use]
pub fn default_stroke() -> Stroke {
    Stroke {
        color: DEFAULT_STROKE,
        width: 1.0,
        cap: LineCap::Butt,
        join: LineJoin::Miter,
        dash: Vec::new(),
    }
}

/// A fill resolved for a surface: gradient stops sorted by offset with stop
/// opacity folded into each color's alpha.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear { start: Point, end: Point, stops: Vec<(f64, Color)> },
    Radial { center: Point, radius: f64, stops: Vec<(f64, Color)> },
}

impl From<&Fill> for Paint {
    fn from(fill: &Fill) -> Self {
        match fill {
            Fill::Solid { color } => Paint::Solid(*color),
            Fill::LinearGradient { start, end, stops } => Paint::Linear {
                start: *start,
                end: *end,
                stops: resolve_stops(stops),
            },
            Fill::RadialGradient { center, radius, stops } => Paint::Radial {
                center: *center,
                radius: radius.max(0.0),
                stops: resolve_stops(stops),
            },
        }
    }
}

/// Sort stops by increasing offset (clamped to `[0, 1]`) and fold stop opacity into alpha.
#[must_use]
pub fn resolve_stops(stops: &[GradientStop]) -> Vec<(f64, Color)> {
    let mut out: Vec<(f64, Color)> = stops
        .iter()
        .map(|s| (s.offset.clamp(0.0, 1.0), s.color.with_alpha_scaled(s.opacity)))
        .collect();
    out.sort_by(|a, b| a.0.total_cmp(&b.0));
    out
}
