//! Shared numeric constants for the editing core.

// ── Gestures ────────────────────────────────────────────────────

/// Pointer travel in document units before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;

/// Drag distance below which a creation gesture is discarded.
pub const MIN_CREATE_DISTANCE: f64 = 2.0;

/// Smallest width or height a resize may produce.
pub const MIN_RESIZE: f64 = 2.0;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of entries kept in the undo log.
pub const HISTORY_CAPACITY: usize = 100;

// ── Freehand ────────────────────────────────────────────────────

/// Tangent scale for the cardinal cubic fit; 0.5 gives a Catmull-Rom curve.
pub const FREEHAND_TENSION: f64 = 0.5;

/// Minimum distance between retained freehand samples.
pub const FREEHAND_MIN_SPACING: f64 = 2.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Distance from a line object within which it counts as hit.
pub const LINE_HIT_TOLERANCE: f64 = 4.0;

/// Stroke width used for path hit-testing when the real stroke is thinner.
pub const MIN_STROKE_HIT_WIDTH: f64 = 8.0;

/// Half-size of a resize handle, used for both drawing and hit slop.
pub const HANDLE_RADIUS: f64 = 6.0;

// ── Shape defaults ──────────────────────────────────────────────

/// Side count of polygons created with the polygon tool.
pub const POLYGON_SIDES: u32 = 6;

/// Largest side count a polygon may carry; documents above it are rejected on load.
pub const MAX_POLYGON_SIDES: u32 = 1024;

/// Font size of text placed with the text tool.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Font family of text placed with the text tool.
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

// ── Overlay ─────────────────────────────────────────────────────

/// Selection accent color.
pub const SELECTION_COLOR: &str = "#1E90FF";

/// Dash segment length of selection outlines and the marquee.
pub const SELECTION_DASH: f64 = 4.0;
