//! Editor tuning parameters parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

use tracing::warn;

use crate::consts::{
    DRAG_THRESHOLD, FREEHAND_MIN_SPACING, FREEHAND_TENSION, HANDLE_RADIUS, HISTORY_CAPACITY, LINE_HIT_TOLERANCE,
    MAX_POLYGON_SIDES, MIN_CREATE_DISTANCE, MIN_RESIZE, MIN_STROKE_HIT_WIDTH, POLYGON_SIDES,
};

/// Errors raised while building an [`EditorConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An override was present but could not be parsed.
    #[error("could not parse {var}={value:?}")]
    Parse { var: String, value: String },
    /// A value violates its range constraint.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Tunable thresholds used by the interaction engine and hit-tester.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub drag_threshold: f64,
    pub min_create_distance: f64,
    pub history_capacity: usize,
    pub freehand_tension: f64,
    pub freehand_min_spacing: f64,
    pub line_hit_tolerance: f64,
    pub min_stroke_hit_width: f64,
    pub handle_radius: f64,
    pub min_resize: f64,
    pub polygon_sides: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_threshold: DRAG_THRESHOLD,
            min_create_distance: MIN_CREATE_DISTANCE,
            history_capacity: HISTORY_CAPACITY,
            freehand_tension: FREEHAND_TENSION,
            freehand_min_spacing: FREEHAND_MIN_SPACING,
            line_hit_tolerance: LINE_HIT_TOLERANCE,
            min_stroke_hit_width: MIN_STROKE_HIT_WIDTH,
            handle_radius: HANDLE_RADIUS,
            min_resize: MIN_RESIZE,
            polygon_sides: POLYGON_SIDES,
        }
    }
}

impl EditorConfig {
    /// Build config from environment variables.
    ///
    /// Every field is optional and falls back to its default:
    /// - `VECTORBOARD_DRAG_THRESHOLD`
    /// - `VECTORBOARD_MIN_CREATE_DISTANCE`
    /// - `VECTORBOARD_HISTORY_CAPACITY`
    /// - `VECTORBOARD_FREEHAND_TENSION`
    /// - `VECTORBOARD_FREEHAND_MIN_SPACING`
    /// - `VECTORBOARD_LINE_HIT_TOLERANCE`
    /// - `VECTORBOARD_MIN_STROKE_HIT_WIDTH`
    /// - `VECTORBOARD_HANDLE_RADIUS`
    /// - `VECTORBOARD_MIN_RESIZE`
    /// - `VECTORBOARD_POLYGON_SIDES`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for an unparsable override and
    /// [`ConfigError::Invalid`] for a value out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// [`from_env`](Self::from_env) over an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let cfg = Self {
            drag_threshold: parse_var(&lookup, "VECTORBOARD_DRAG_THRESHOLD", d.drag_threshold)?,
            min_create_distance: parse_var(&lookup, "VECTORBOARD_MIN_CREATE_DISTANCE", d.min_create_distance)?,
            history_capacity: parse_var(&lookup, "VECTORBOARD_HISTORY_CAPACITY", d.history_capacity)?,
            freehand_tension: parse_var(&lookup, "VECTORBOARD_FREEHAND_TENSION", d.freehand_tension)?,
            freehand_min_spacing: parse_var(&lookup, "VECTORBOARD_FREEHAND_MIN_SPACING", d.freehand_min_spacing)?,
            line_hit_tolerance: parse_var(&lookup, "VECTORBOARD_LINE_HIT_TOLERANCE", d.line_hit_tolerance)?,
            min_stroke_hit_width: parse_var(&lookup, "VECTORBOARD_MIN_STROKE_HIT_WIDTH", d.min_stroke_hit_width)?,
            handle_radius: parse_var(&lookup, "VECTORBOARD_HANDLE_RADIUS", d.handle_radius)?,
            min_resize: parse_var(&lookup, "VECTORBOARD_MIN_RESIZE", d.min_resize)?,
            polygon_sides: parse_var(&lookup, "VECTORBOARD_POLYGON_SIDES", d.polygon_sides)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every range constraint.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint as [`ConfigError::Invalid`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("drag_threshold", self.drag_threshold),
            ("freehand_min_spacing", self.freehand_min_spacing),
            ("line_hit_tolerance", self.line_hit_tolerance),
            ("min_stroke_hit_width", self.min_stroke_hit_width),
            ("handle_radius", self.handle_radius),
            ("min_resize", self.min_resize),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid { field, reason: "must be a positive number" });
            }
        }
        if !(self.min_create_distance.is_finite() && self.min_create_distance >= 0.0) {
            return Err(ConfigError::Invalid { field: "min_create_distance", reason: "must be zero or more" });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid { field: "history_capacity", reason: "must be at least 1" });
        }
        if !(self.freehand_tension > 0.0 && self.freehand_tension <= 1.0) {
            return Err(ConfigError::Invalid { field: "freehand_tension", reason: "must be in (0, 1]" });
        }
        if !(3..=MAX_POLYGON_SIDES).contains(&self.polygon_sides) {
            return Err(ConfigError::Invalid { field: "polygon_sides", reason: "must be in [3, 1024]" });
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str, default: T) -> Result<T, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) => {
            warn!(var, value = %raw, "config override could not be parsed");
            Err(ConfigError::Parse { var: var.to_owned(), value: raw })
        }
    }
}
