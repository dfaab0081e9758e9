//! Vector drawing core: scene model, rendering, hit-testing, and editing.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but every
//! piece of logic is written against the [`surface::Surface`] abstraction so it
//! can be exercised natively through [`recording::RecordingSurface`]. The host
//! JavaScript layer forwards pointer and key events to [`engine::Engine`],
//! calls `render` once per animation frame, and reacts to the returned
//! [`engine::Action`]s (refresh panels, open a text editor, persist).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EditorCore`] |
//! | [`doc`] | Scene objects, layers, selection, and JSON persistence |
//! | [`shape`] | Kind-specific geometry and local bounds |
//! | [`style`] | Colors, gradients, fill and stroke styles |
//! | [`geom`] | Points, transforms, affine matrices, and bounding boxes |
//! | [`render`] | Scene and selection-overlay rendering |
//! | [`hit`] | Hit-testing, resize handles, and marquee collection |
//! | [`history`] | Reversible operations and the undo/redo log |
//! | [`input`] | Tools, modifiers, and the gesture state machine |
//! | [`resize`] | Handle-driven bounds and per-kind scaling |
//! | [`freehand`] | Freehand sampling and spline smoothing |
//! | [`surface`] | Drawing-surface trait |
//! | [`recording`] | In-memory surface for tests and hit probing |
//! | [`web`] | `CanvasRenderingContext2d` surface |
//! | [`config`] | Editor tuning loaded from the environment |
//! | [`consts`] | Shared numeric defaults (thresholds, tolerances, sizes) |

pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod freehand;
pub mod geom;
pub mod history;
pub mod hit;
pub mod input;
pub mod recording;
pub mod render;
pub mod resize;
pub mod shape;
pub mod style;
pub mod surface;
pub mod web;
