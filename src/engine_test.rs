#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::LayerProps;
use crate::recording::DrawCommand;
use crate::shape::PathSegment;

// =============================================================
// Helpers
// =============================================================

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn none() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn rect_at(x: f64, y: f64, w: f64, h: f64) -> SceneObject {
    SceneObject::new(Shape::Rect { width: w, height: h }).with_transform(Transform::at(x, y))
}

/// Insert directly into the active layer without recording history.
fn place(core: &mut EditorCore, obj: SceneObject) -> ObjectId {
    let id = obj.id;
    let layer = core.doc.active_layer().unwrap();
    core.doc.add_object(&layer, None, obj).unwrap();
    id
}

fn drag(core: &mut EditorCore, from: Point, to: Point, modifiers: Modifiers) -> Vec<Action> {
    let mut actions = core.on_pointer_down(from, modifiers);
    actions.extend(core.on_pointer_move(to, modifiers));
    actions.extend(core.on_pointer_up(to, modifiers));
    actions
}

fn click(core: &mut EditorCore, at: Point, modifiers: Modifiers) -> Vec<Action> {
    let mut actions = core.on_pointer_down(at, modifiers);
    actions.extend(core.on_pointer_up(at, modifiers));
    actions
}

fn order(core: &EditorCore) -> Vec<ObjectId> {
    let layer = core.doc.active_layer().unwrap();
    core.doc.layer(&layer).unwrap().objects.iter().map(|o| o.id).collect()
}

fn position(core: &EditorCore, id: &ObjectId) -> Point {
    core.doc.object(id).unwrap().transform.position()
}

/// The document with its selection dropped; selection is not part of history.
fn committed(core: &EditorCore) -> Document {
    let mut doc = core.doc.clone();
    doc.deselect_all();
    doc
}

fn created(actions: &[Action]) -> Vec<ObjectId> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::ObjectCreated(id) => Some(*id),
            _ => None,
        })
        .collect()
}

// =============================================================
// Click selection
// =============================================================

#[test]
fn click_selects_topmost_object() {
    let mut core = EditorCore::new();
    place(&mut core, rect_at(0.0, 0.0, 100.0, 100.0));
    let top = place(&mut core, rect_at(50.0, 50.0, 100.0, 100.0));
    let actions = click(&mut core, pt(75.0, 75.0), none());
    assert_eq!(core.doc.selection(), &[top]);
    assert!(actions.contains(&Action::SelectionChanged(vec![top])));
    assert!(core.history().is_empty());
}

#[test]
fn click_on_empty_space_clears_selection() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    core.doc.select_object(&a, false);
    click(&mut core, pt(200.0, 200.0), none());
    assert!(core.doc.selection().is_empty());
}

#[test]
fn shift_click_toggles_membership() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    let b = place(&mut core, rect_at(100.0, 0.0, 20.0, 20.0));
    click(&mut core, pt(10.0, 10.0), none());
    click(&mut core, pt(110.0, 10.0), shift());
    assert_eq!(core.doc.selection(), &[a, b]);
    click(&mut core, pt(10.0, 10.0), shift());
    assert_eq!(core.doc.selection(), &[b]);
}

#[test]
fn locked_object_is_not_picked() {
    let mut core = EditorCore::new();
    let mut obj = rect_at(0.0, 0.0, 50.0, 50.0);
    obj.locked = true;
    place(&mut core, obj);
    click(&mut core, pt(10.0, 10.0), none());
    assert!(core.doc.selection().is_empty());
}

// =============================================================
// Move
// =============================================================

#[test]
fn drag_moves_object_and_records_one_entry() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(10.0, 10.0, 50.0, 50.0));
    core.on_pointer_down(pt(20.0, 20.0), none());
    core.on_pointer_move(pt(30.0, 30.0), none());
    core.on_pointer_move(pt(60.0, 70.0), none());
    assert!(matches!(core.input, InputState::Moving { .. }));
    let actions = core.on_pointer_up(pt(60.0, 70.0), none());

    assert_eq!(position(&core, &id), pt(50.0, 60.0));
    assert_eq!(core.history().len(), 1);
    assert!(actions.contains(&Action::ObjectsUpdated(vec![id])));

    core.undo();
    assert_eq!(position(&core, &id), pt(10.0, 10.0));
    core.redo();
    assert_eq!(position(&core, &id), pt(50.0, 60.0));
}

#[test]
fn gesture_inside_drag_threshold_is_a_click() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(10.0, 10.0, 50.0, 50.0));
    drag(&mut core, pt(20.0, 20.0), pt(21.0, 21.0), none());
    assert_eq!(position(&core, &id), pt(10.0, 10.0));
    assert!(core.history().is_empty());
    assert_eq!(core.doc.selection(), &[id]);
}

#[test]
fn dragging_unselected_object_replaces_selection() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    let b = place(&mut core, rect_at(100.0, 0.0, 20.0, 20.0));
    core.doc.select_object(&a, false);
    drag(&mut core, pt(110.0, 10.0), pt(110.0, 60.0), none());
    assert_eq!(core.doc.selection(), &[b]);
    assert_eq!(position(&core, &a), pt(0.0, 0.0));
    assert_eq!(position(&core, &b), pt(100.0, 50.0));
}

#[test]
fn dragging_moves_whole_selection() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    let b = place(&mut core, rect_at(100.0, 0.0, 20.0, 20.0));
    core.doc.set_selection([a, b]);
    drag(&mut core, pt(110.0, 10.0), pt(120.0, 30.0), none());
    assert_eq!(position(&core, &a), pt(10.0, 20.0));
    assert_eq!(position(&core, &b), pt(110.0, 20.0));
    assert_eq!(core.history().len(), 1);
    core.undo();
    assert_eq!(position(&core, &a), pt(0.0, 0.0));
    assert_eq!(position(&core, &b), pt(100.0, 0.0));
}

// =============================================================
// Marquee
// =============================================================

#[test]
fn marquee_selects_in_either_drag_direction() {
    for (from, to) in [(pt(0.0, 0.0), pt(50.0, 50.0)), (pt(50.0, 50.0), pt(0.0, 0.0))] {
        let mut core = EditorCore::new();
        let a = place(&mut core, rect_at(10.0, 10.0, 20.0, 20.0));
        place(&mut core, rect_at(100.0, 100.0, 20.0, 20.0));
        drag(&mut core, from, to, none());
        assert_eq!(core.doc.selection(), &[a]);
        assert!(core.ui.marquee.is_none());
        assert!(core.history().is_empty());
    }
}

#[test]
fn marquee_shows_live_rectangle() {
    let mut core = EditorCore::new();
    core.on_pointer_down(pt(50.0, 50.0), none());
    core.on_pointer_move(pt(10.0, 20.0), none());
    assert_eq!(core.ui.marquee, Some(Bounds::new(10.0, 20.0, 40.0, 30.0)));
}

#[test]
fn additive_marquee_unions_prior_selection() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(10.0, 10.0, 20.0, 20.0));
    let b = place(&mut core, rect_at(100.0, 100.0, 20.0, 20.0));
    core.doc.select_object(&a, false);
    drag(&mut core, pt(90.0, 90.0), pt(130.0, 130.0), shift());
    assert_eq!(core.doc.selection(), &[a, b]);
}

#[test]
fn marquee_skips_hidden_objects() {
    let mut core = EditorCore::new();
    let mut hidden = rect_at(10.0, 10.0, 20.0, 20.0);
    hidden.visible = false;
    place(&mut core, hidden);
    drag(&mut core, pt(0.0, 0.0), pt(50.0, 50.0), none());
    assert!(core.doc.selection().is_empty());
}

// =============================================================
// Resize
// =============================================================

#[test]
fn south_east_handle_scales_rect() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(0.0, 0.0, 100.0, 100.0));
    core.doc.select_object(&id, false);
    core.on_pointer_down(pt(100.0, 100.0), none());
    assert!(matches!(core.input, InputState::Resizing { anchor: ResizeAnchor::Se, .. }));
    core.on_pointer_move(pt(150.0, 50.0), none());
    core.on_pointer_up(pt(150.0, 50.0), none());
    let obj = core.doc.object(&id).unwrap();
    assert_eq!(obj.shape, Shape::Rect { width: 150.0, height: 50.0 });
    assert_eq!(obj.transform.position(), pt(0.0, 0.0));
    assert_eq!(core.history().len(), 1);
}

#[test]
fn north_west_handle_moves_origin() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(0.0, 0.0, 100.0, 100.0));
    core.doc.select_object(&id, false);
    drag(&mut core, pt(0.0, 0.0), pt(-50.0, -50.0), none());
    let obj = core.doc.object(&id).unwrap();
    assert_eq!(obj.world_bounds(), Bounds::new(-50.0, -50.0, 150.0, 150.0));
    core.undo();
    assert_eq!(core.doc.object(&id).unwrap().world_bounds(), Bounds::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn resize_scales_every_selected_object() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 50.0, 50.0));
    let b = place(&mut core, rect_at(50.0, 50.0, 50.0, 50.0));
    core.doc.set_selection([a, b]);
    drag(&mut core, pt(100.0, 100.0), pt(200.0, 200.0), none());
    assert_eq!(core.doc.object(&a).unwrap().world_bounds(), Bounds::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(core.doc.object(&b).unwrap().world_bounds(), Bounds::new(100.0, 100.0, 100.0, 100.0));
    assert_eq!(core.history().len(), 1);
}

// =============================================================
// Creation tools
// =============================================================

#[test]
fn rect_tool_creates_normalized_rect() {
    for (from, to) in [(pt(10.0, 10.0), pt(60.0, 40.0)), (pt(60.0, 40.0), pt(10.0, 10.0))] {
        let mut core = EditorCore::new();
        core.set_tool(Tool::Rect);
        let actions = drag(&mut core, from, to, none());
        let ids = created(&actions);
        assert_eq!(ids.len(), 1);
        let obj = core.doc.object(&ids[0]).unwrap();
        assert_eq!(obj.shape, Shape::Rect { width: 50.0, height: 30.0 });
        assert_eq!(obj.transform.position(), pt(10.0, 10.0));
        assert_eq!(core.doc.selection(), &[ids[0]]);
        assert_eq!(core.history().len(), 1);
        assert!(core.ui.preview.is_none());
    }
}

#[test]
fn creation_shows_preview_while_dragging() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Rect);
    core.on_pointer_down(pt(0.0, 0.0), none());
    core.on_pointer_move(pt(30.0, 20.0), none());
    let preview = core.ui.preview.as_ref().unwrap();
    assert_eq!(preview.shape, Shape::Rect { width: 30.0, height: 20.0 });
    assert_eq!(core.doc.object_count(), 0);
}

#[test]
fn tiny_creation_is_discarded() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Ellipse);
    let actions = drag(&mut core, pt(10.0, 10.0), pt(11.0, 10.0), none());
    assert!(actions.is_empty());
    assert_eq!(core.doc.object_count(), 0);
    assert!(core.history().is_empty());
}

#[test]
fn ellipse_tool_inscribes_drag_box() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Ellipse);
    let ids = created(&drag(&mut core, pt(0.0, 0.0), pt(100.0, 50.0), none()));
    let obj = core.doc.object(&ids[0]).unwrap();
    assert_eq!(obj.shape, Shape::Ellipse { rx: 50.0, ry: 25.0 });
    assert_eq!(obj.transform.position(), pt(50.0, 25.0));
}

#[test]
fn line_tool_spans_drag() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Line);
    let ids = created(&drag(&mut core, pt(10.0, 10.0), pt(40.0, 50.0), none()));
    let obj = core.doc.object(&ids[0]).unwrap();
    assert_eq!(obj.shape, Shape::Line { end: pt(30.0, 40.0) });
    assert_eq!(obj.transform.position(), pt(10.0, 10.0));
    assert!(obj.fill.is_none());
}

#[test]
fn polygon_tool_uses_drag_distance_as_radius() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Polygon);
    let ids = created(&drag(&mut core, pt(50.0, 50.0), pt(50.0, 80.0), none()));
    let obj = core.doc.object(&ids[0]).unwrap();
    assert_eq!(obj.shape, Shape::Polygon { sides: 6, radius: 30.0 });
    assert_eq!(obj.transform.position(), pt(50.0, 50.0));
}

#[test]
fn text_tool_places_text_and_requests_edit() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Text);
    let actions = click(&mut core, pt(5.0, 5.0), none());
    let ids = created(&actions);
    assert_eq!(ids.len(), 1);
    let id = ids[0];
    assert!(actions.contains(&Action::EditTextRequested { id, text: "Text".into() }));
    assert_eq!(position(&core, &id), pt(5.0, 5.0));

    core.set_text(&id, "Hello".into());
    let Shape::Text { text, .. } = &core.doc.object(&id).unwrap().shape else {
        panic!("expected text");
    };
    assert_eq!(text, "Hello");
    assert_eq!(core.history().len(), 2);
    core.undo();
    let Shape::Text { text, .. } = &core.doc.object(&id).unwrap().shape else {
        panic!("expected text");
    };
    assert_eq!(text, "Text");
}

#[test]
fn text_is_added_on_release_not_on_press() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Text);
    assert!(core.on_pointer_down(pt(5.0, 5.0), none()).is_empty());
    assert_eq!(core.doc.object_count(), 0);
    core.on_key_down(&Key("Escape".into()), none());
    assert!(core.on_pointer_up(pt(5.0, 5.0), none()).is_empty());
    assert_eq!(core.doc.object_count(), 0);
    assert!(core.history().is_empty());
}

#[test]
fn set_text_with_same_content_records_nothing() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Text);
    let id = created(&click(&mut core, pt(5.0, 5.0), none()))[0];
    assert!(core.set_text(&id, "Text".into()).is_empty());
    assert_eq!(core.history().len(), 1);
}

#[test]
fn freehand_builds_unfilled_smooth_path() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Freehand);
    core.on_pointer_down(pt(0.0, 0.0), none());
    core.on_pointer_move(pt(10.0, 0.0), none());
    core.on_pointer_move(pt(20.0, 5.0), none());
    core.on_pointer_move(pt(30.0, 0.0), none());
    assert!(core.ui.preview.is_some());
    let ids = created(&core.on_pointer_up(pt(30.0, 0.0), none()));
    let obj = core.doc.object(&ids[0]).unwrap();
    assert!(obj.fill.is_none());
    assert!(obj.stroke.is_some());
    let Shape::Path { segments } = &obj.shape else {
        panic!("expected path");
    };
    assert_eq!(segments.len(), 4);
    assert_eq!(segments[0], PathSegment::MoveTo { to: pt(0.0, 0.0) });
    assert!(segments[1..].iter().all(|s| matches!(s, PathSegment::CubicTo { .. })));
}

#[test]
fn freehand_path_is_relative_to_first_sample() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Freehand);
    let ids = created(&drag(&mut core, pt(100.0, 200.0), pt(140.0, 200.0), none()));
    let obj = core.doc.object(&ids[0]).unwrap();
    assert_eq!(obj.transform.position(), pt(100.0, 200.0));
    let Shape::Path { segments } = &obj.shape else {
        panic!("expected path");
    };
    assert_eq!(segments[0], PathSegment::MoveTo { to: pt(0.0, 0.0) });
}

#[test]
fn short_freehand_stroke_is_discarded() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Freehand);
    drag(&mut core, pt(0.0, 0.0), pt(1.0, 0.0), none());
    assert_eq!(core.doc.object_count(), 0);
    assert!(core.history().is_empty());
}

// =============================================================
// Cancel
// =============================================================

#[test]
fn escape_mid_move_restores_document() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    let b = place(&mut core, rect_at(100.0, 0.0, 20.0, 20.0));
    core.doc.select_object(&a, false);
    let before = core.doc.clone();
    core.on_pointer_down(pt(110.0, 10.0), none());
    core.on_pointer_move(pt(150.0, 80.0), none());
    assert_eq!(position(&core, &b), pt(140.0, 70.0));
    core.on_key_down(&Key("Escape".into()), none());
    assert_eq!(core.doc, before);
    assert!(matches!(core.input, InputState::Idle));
    assert!(core.on_pointer_up(pt(150.0, 80.0), none()).is_empty());
    assert!(core.history().is_empty());
}

#[test]
fn cancel_mid_resize_restores_geometry() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(0.0, 0.0, 100.0, 100.0));
    core.doc.select_object(&id, false);
    let before = core.doc.clone();
    core.on_pointer_down(pt(100.0, 100.0), none());
    core.on_pointer_move(pt(300.0, 300.0), none());
    core.cancel_gesture();
    assert_eq!(core.doc, before);
}

#[test]
fn cancel_marquee_restores_prior_selection() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(10.0, 10.0, 20.0, 20.0));
    core.doc.select_object(&a, false);
    core.on_pointer_down(pt(100.0, 100.0), none());
    core.on_pointer_move(pt(200.0, 200.0), none());
    assert!(core.doc.selection().is_empty());
    core.cancel_gesture();
    assert_eq!(core.doc.selection(), &[a]);
    assert!(core.ui.marquee.is_none());
}

#[test]
fn cancel_creation_adds_nothing() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Rect);
    core.on_pointer_down(pt(0.0, 0.0), none());
    core.on_pointer_move(pt(50.0, 50.0), none());
    core.cancel_gesture();
    assert!(core.ui.preview.is_none());
    assert_eq!(core.doc.object_count(), 0);
}

#[test]
fn switching_tools_cancels_gesture() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    core.on_pointer_down(pt(10.0, 10.0), none());
    core.on_pointer_move(pt(60.0, 10.0), none());
    core.set_tool(Tool::Rect);
    assert_eq!(position(&core, &id), pt(0.0, 0.0));
    assert_eq!(core.ui.tool, Tool::Rect);
}

// =============================================================
// History
// =============================================================

#[test]
fn undo_walks_back_through_every_state() {
    let mut core = EditorCore::new();
    let mut states = vec![committed(&core)];

    let (top, _) = core.add_layer("Top");
    states.push(committed(&core));

    core.set_tool(Tool::Rect);
    let id = created(&drag(&mut core, pt(10.0, 10.0), pt(60.0, 40.0), none()))[0];
    assert_eq!(core.doc.locate(&id).unwrap().layer_id, top);
    states.push(committed(&core));

    core.set_tool(Tool::Select);
    drag(&mut core, pt(30.0, 20.0), pt(80.0, 70.0), none());
    assert_eq!(position(&core, &id), pt(60.0, 60.0));
    states.push(committed(&core));

    core.on_key_down(&Key("Delete".into()), none());
    assert_eq!(core.doc.object_count(), 0);
    states.push(committed(&core));

    for expected in states.iter().rev().skip(1) {
        core.undo();
        assert_eq!(&committed(&core), expected);
    }
    assert!(!core.can_undo());
    for expected in states.iter().skip(1) {
        core.redo();
        assert_eq!(&committed(&core), expected);
    }
    assert!(!core.can_redo());
}

#[test]
fn new_entry_after_undo_truncates_redo() {
    let mut core = EditorCore::new();
    let layer = core.doc.active_layer().unwrap();
    core.add_object(&layer, rect_at(0.0, 0.0, 10.0, 10.0));
    core.add_object(&layer, rect_at(20.0, 0.0, 10.0, 10.0));
    core.undo();
    assert!(core.can_redo());
    core.add_object(&layer, rect_at(40.0, 0.0, 10.0, 10.0));
    assert!(!core.can_redo());
    assert_eq!(core.history().len(), 2);
}

#[test]
fn history_evicts_oldest_past_capacity() {
    let config = EditorConfig { history_capacity: 3, ..EditorConfig::default() };
    let mut core = EditorCore::with_config(config);
    let layer = core.doc.active_layer().unwrap();
    for i in 0..5 {
        core.add_object(&layer, rect_at(f64::from(i) * 20.0, 0.0, 10.0, 10.0));
    }
    assert_eq!(core.history().len(), 3);
    for _ in 0..3 {
        core.undo();
    }
    assert!(!core.can_undo());
    assert_eq!(core.doc.object_count(), 2);
}

#[test]
fn undo_reports_history_state() {
    let mut core = EditorCore::new();
    let layer = core.doc.active_layer().unwrap();
    core.add_object(&layer, rect_at(0.0, 0.0, 10.0, 10.0));
    let actions = core.undo();
    assert!(actions.contains(&Action::DocumentChanged));
    assert!(actions.contains(&Action::HistoryChanged { can_undo: false, can_redo: true }));
}

#[test]
fn undo_with_empty_history_does_nothing() {
    let mut core = EditorCore::new();
    assert!(core.undo().is_empty());
    assert!(core.redo().is_empty());
}

#[test]
fn pushed_host_operations_are_undoable() {
    let mut core = EditorCore::new();
    let layer = core.doc.active_layer().unwrap();
    let obj = rect_at(0.0, 0.0, 10.0, 10.0);
    let index = core.doc.add_object(&layer, None, obj.clone()).unwrap();
    core.push_history("paste", vec![Operation::AddObject { layer_id: layer, index, object: obj }]);
    assert_eq!(core.history().len(), 1);
    core.undo();
    assert_eq!(core.doc.object_count(), 0);
}

#[test]
fn pushing_nothing_records_nothing() {
    let mut core = EditorCore::new();
    assert!(core.push_history("noop", Vec::new()).is_empty());
    assert!(core.history().is_empty());
}

// =============================================================
// Group / ungroup
// =============================================================

fn grouping_fixture() -> (EditorCore, ObjectId, ObjectId) {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(10.0, 10.0, 100.0, 50.0));
    let b = place(
        &mut core,
        SceneObject::new(Shape::Ellipse { rx: 30.0, ry: 20.0 }).with_transform(Transform::at(200.0, 200.0)),
    );
    core.doc.set_selection([a, b]);
    (core, a, b)
}

#[test]
fn group_preserves_world_bounds() {
    let (mut core, a, b) = grouping_fixture();
    let actions = core.group_selection();
    let group_id = created(&actions)[0];
    assert_eq!(order(&core), vec![group_id]);
    assert_eq!(core.doc.selection(), &[group_id]);
    let group = core.doc.object(&group_id).unwrap();
    assert_eq!(group.world_bounds(), Bounds::new(10.0, 10.0, 220.0, 210.0));
    assert!(core.doc.find(&a).is_some());
    assert!(core.doc.find(&b).is_some());
    assert_eq!(core.history().len(), 1);
}

#[test]
fn undo_group_restores_members() {
    let (mut core, a, b) = grouping_fixture();
    let before = committed(&core);
    let group_id = created(&core.group_selection())[0];
    let grouped = committed(&core);
    core.undo();
    assert_eq!(committed(&core), before);
    assert_eq!(position(&core, &a), pt(10.0, 10.0));
    assert_eq!(position(&core, &b), pt(200.0, 200.0));
    core.redo();
    assert_eq!(committed(&core), grouped);
    assert_eq!(order(&core), vec![group_id]);
}

#[test]
fn tool_driven_create_marquee_group_undo() {
    let mut core = EditorCore::new();
    core.set_tool(Tool::Rect);
    let a = created(&drag(&mut core, pt(10.0, 10.0), pt(110.0, 60.0), none()))[0];
    core.set_tool(Tool::Ellipse);
    let b = created(&drag(&mut core, pt(170.0, 180.0), pt(230.0, 220.0), none()))[0];
    assert_eq!(core.doc.object(&b).unwrap().shape, Shape::Ellipse { rx: 30.0, ry: 20.0 });

    core.set_tool(Tool::Select);
    drag(&mut core, pt(0.0, 0.0), pt(250.0, 250.0), none());
    assert_eq!(core.doc.selection(), &[a, b]);

    let group_id = created(&core.group_selection())[0];
    assert_eq!(order(&core), vec![group_id]);
    assert_eq!(core.doc.object(&group_id).unwrap().world_bounds(), Bounds::new(10.0, 10.0, 220.0, 210.0));

    core.undo();
    assert_eq!(order(&core), vec![a, b]);
    assert_eq!(core.doc.object(&a).unwrap().world_bounds(), Bounds::new(10.0, 10.0, 100.0, 50.0));
    assert_eq!(position(&core, &b), pt(200.0, 200.0));
}

#[test]
fn group_takes_topmost_member_slot() {
    let mut core = EditorCore::new();
    let x = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    let a = place(&mut core, rect_at(20.0, 0.0, 10.0, 10.0));
    let y = place(&mut core, rect_at(40.0, 0.0, 10.0, 10.0));
    let b = place(&mut core, rect_at(60.0, 0.0, 10.0, 10.0));
    let z = place(&mut core, rect_at(80.0, 0.0, 10.0, 10.0));
    core.doc.set_selection([b, a]);
    let group_id = created(&core.group_selection())[0];
    assert_eq!(order(&core), vec![x, y, group_id, z]);
    core.undo();
    assert_eq!(order(&core), vec![x, a, y, b, z]);
}

#[test]
fn grouping_needs_two_objects() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    core.doc.select_object(&a, false);
    assert!(core.group_selection().is_empty());
    assert!(core.history().is_empty());
}

#[test]
fn ungroup_returns_children_to_world_placement() {
    let (mut core, a, b) = grouping_fixture();
    let group_id = created(&core.group_selection())[0];
    core.ungroup_selection();
    assert_eq!(order(&core), vec![a, b]);
    assert!(core.doc.object(&group_id).is_none());
    assert_eq!(position(&core, &a), pt(10.0, 10.0));
    assert_eq!(position(&core, &b), pt(200.0, 200.0));
    assert_eq!(core.doc.selection(), &[a, b]);
    core.undo();
    assert_eq!(order(&core), vec![group_id]);
}

#[test]
fn ungroup_composes_group_rotation() {
    let mut core = EditorCore::new();
    let child = rect_at(10.0, 0.0, 5.0, 5.0);
    let child_id = child.id;
    let mut group = SceneObject::new(Shape::Group { children: vec![child] }).with_transform(Transform::at(100.0, 100.0));
    group.transform.rotation = 90.0;
    let group_id = place(&mut core, group);
    core.doc.select_object(&group_id, false);
    core.ungroup_selection();
    let t = core.doc.object(&child_id).unwrap().transform;
    assert!((t.x - 100.0).abs() < 1e-9);
    assert!((t.y - 110.0).abs() < 1e-9);
    assert_eq!(t.rotation, 90.0);
}

// =============================================================
// Delete / z-order
// =============================================================

#[test]
fn delete_and_undo_restore_stacking() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    let b = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    let c = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    core.doc.set_selection([c, a]);
    let actions = core.delete_selection();
    assert_eq!(order(&core), vec![b]);
    assert!(core.doc.selection().is_empty());
    assert!(actions.iter().any(|a| matches!(a, Action::ObjectsDeleted(ids) if ids.len() == 2)));
    core.undo();
    assert_eq!(order(&core), vec![a, b, c]);
}

#[test]
fn delete_with_empty_selection_is_noop() {
    let mut core = EditorCore::new();
    place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    assert!(core.delete_selection().is_empty());
    assert!(core.history().is_empty());
}

#[test]
fn backspace_is_ignored_mid_gesture() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    core.on_pointer_down(pt(10.0, 10.0), none());
    core.on_pointer_move(pt(40.0, 10.0), none());
    core.on_key_down(&Key("Backspace".into()), none());
    assert!(core.doc.object(&id).is_some());
}

fn stack_of_four() -> (EditorCore, [ObjectId; 4]) {
    let mut core = EditorCore::new();
    let ids = [(); 4].map(|()| place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0)));
    (core, ids)
}

#[test]
fn bring_to_front_and_send_to_back() {
    let (mut core, [a, b, c, d]) = stack_of_four();
    core.doc.set_selection([a, c]);
    core.bring_to_front();
    assert_eq!(order(&core), vec![b, d, a, c]);
    core.send_to_back();
    assert_eq!(order(&core), vec![a, c, b, d]);
    core.undo();
    core.undo();
    assert_eq!(order(&core), vec![a, b, c, d]);
}

#[test]
fn bring_forward_moves_block_one_step() {
    let (mut core, [a, b, c, d]) = stack_of_four();
    core.doc.set_selection([a, b]);
    core.bring_forward();
    assert_eq!(order(&core), vec![c, a, b, d]);
    assert_eq!(core.history().len(), 1);
}

#[test]
fn send_backward_stops_at_bottom() {
    let (mut core, [a, b, c, d]) = stack_of_four();
    core.doc.set_selection([a, c]);
    core.send_backward();
    assert_eq!(order(&core), vec![a, c, b, d]);
    core.doc.set_selection([a]);
    assert!(core.send_backward().is_empty());
}

#[test]
fn restack_at_limit_records_nothing() {
    let (mut core, [_, _, _, d]) = stack_of_four();
    core.doc.set_selection([d]);
    assert!(core.bring_to_front().is_empty());
    assert!(core.bring_forward().is_empty());
    assert!(core.history().is_empty());
}

// =============================================================
// Layers
// =============================================================

#[test]
fn add_layer_becomes_active() {
    let mut core = EditorCore::new();
    let base = core.doc.active_layer().unwrap();
    let before = committed(&core);
    let (id, actions) = core.add_layer("Top");
    assert_eq!(core.doc.active_layer(), Some(id));
    assert_eq!(core.doc.layers().len(), 2);
    assert!(actions.contains(&Action::LayersChanged));
    let after = committed(&core);
    core.undo();
    assert_eq!(committed(&core), before);
    assert_eq!(core.doc.active_layer(), Some(base));
    core.redo();
    assert_eq!(committed(&core), after);
    assert_eq!(core.doc.active_layer(), Some(id));
}

#[test]
fn undo_add_layer_restores_the_layer_active_before_it() {
    let mut core = EditorCore::new();
    let base = core.doc.active_layer().unwrap();
    core.add_layer("Second");
    core.set_active_layer(&base);
    let (third, _) = core.add_layer("Third");
    assert_eq!(core.doc.active_layer(), Some(third));
    core.undo();
    assert_eq!(core.doc.active_layer(), Some(base));
}

#[test]
fn remove_layer_undo_restores_objects_and_active() {
    let mut core = EditorCore::new();
    let base = core.doc.active_layer().unwrap();
    let (top, _) = core.add_layer("Top");
    let obj = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    core.remove_layer(&top);
    assert_eq!(core.doc.active_layer(), Some(base));
    assert!(core.doc.object(&obj).is_none());
    core.undo();
    assert_eq!(core.doc.active_layer(), Some(top));
    assert!(core.doc.object(&obj).is_some());
}

#[test]
fn hidden_layer_blocks_hits_until_undone() {
    let mut core = EditorCore::new();
    let layer = core.doc.active_layer().unwrap();
    place(&mut core, rect_at(0.0, 0.0, 50.0, 50.0));
    let props = LayerProps { name: "Layer 1".into(), visible: false, locked: false, opacity: 1.0 };
    core.set_layer_props(&layer, props);
    assert!(core.hit_test(pt(10.0, 10.0)).is_none());
    core.undo();
    assert!(core.hit_test(pt(10.0, 10.0)).is_some());
}

fn lock_layer(core: &mut EditorCore, layer: &LayerId) -> Vec<Action> {
    let mut props = core.doc.layer(layer).unwrap().props();
    props.locked = true;
    core.set_layer_props(layer, props)
}

#[test]
fn locking_layer_drops_its_objects_from_selection() {
    let mut core = EditorCore::new();
    let base = core.doc.active_layer().unwrap();
    let below = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    core.add_layer("Top");
    let above = place(&mut core, rect_at(20.0, 0.0, 10.0, 10.0));
    core.doc.set_selection([below, above]);
    let actions = lock_layer(&mut core, &base);
    assert_eq!(core.doc.selection(), &[above]);
    assert!(actions.contains(&Action::SelectionChanged(vec![above])));
}

#[test]
fn handle_drag_on_locked_layer_changes_nothing() {
    let mut core = EditorCore::new();
    let layer = core.doc.active_layer().unwrap();
    let id = place(&mut core, rect_at(0.0, 0.0, 100.0, 100.0));
    core.doc.select_object(&id, false);
    lock_layer(&mut core, &layer);
    let history = core.history().len();

    drag(&mut core, pt(100.0, 100.0), pt(150.0, 50.0), none());
    assert_eq!(core.doc.object(&id).unwrap().shape, Shape::Rect { width: 100.0, height: 100.0 });

    // Selection forced back by the host still cannot edit.
    core.doc.select_object(&id, false);
    drag(&mut core, pt(100.0, 100.0), pt(150.0, 50.0), none());
    assert_eq!(core.doc.object(&id).unwrap().shape, Shape::Rect { width: 100.0, height: 100.0 });
    core.doc.select_object(&id, false);
    assert!(core.delete_selection().is_empty());
    assert!(core.doc.object(&id).is_some());
    assert_eq!(core.history().len(), history);
}

#[test]
fn unchanged_layer_props_record_nothing() {
    let mut core = EditorCore::new();
    let layer = core.doc.active_layer().unwrap();
    let props = core.doc.layer(&layer).unwrap().props();
    assert!(core.set_layer_props(&layer, props).is_empty());
    assert!(core.history().is_empty());
}

#[test]
fn new_objects_go_to_active_layer() {
    let mut core = EditorCore::new();
    let (top, _) = core.add_layer("Top");
    core.set_tool(Tool::Rect);
    let id = created(&drag(&mut core, pt(0.0, 0.0), pt(20.0, 20.0), none()))[0];
    assert_eq!(core.doc.locate(&id).unwrap().layer_id, top);
}

#[test]
fn set_active_layer_is_not_recorded() {
    let mut core = EditorCore::new();
    let base = core.doc.active_layer().unwrap();
    core.add_layer("Top");
    let history = core.history().len();
    assert_eq!(core.set_active_layer(&base), vec![Action::LayersChanged]);
    assert_eq!(core.history().len(), history);
}

// =============================================================
// Selection commands
// =============================================================

#[test]
fn select_all_skips_locked_objects() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    let mut locked = rect_at(0.0, 0.0, 10.0, 10.0);
    locked.locked = true;
    place(&mut core, locked);
    let actions = core.select_all();
    assert_eq!(core.doc.selection(), &[a]);
    assert_eq!(actions, vec![Action::SelectionChanged(vec![a])]);
    assert_eq!(core.deselect_all(), vec![Action::SelectionChanged(Vec::new())]);
}

#[test]
fn unchanged_selection_emits_nothing() {
    let mut core = EditorCore::new();
    let a = place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    core.select_object(&a, false);
    assert!(core.select_object(&a, false).is_empty());
}

// =============================================================
// Persistence / rendering
// =============================================================

#[test]
fn save_and_load_round_trip_clears_history() {
    let mut core = EditorCore::new();
    let layer = core.doc.active_layer().unwrap();
    core.add_object(&layer, rect_at(5.0, 5.0, 10.0, 10.0));
    let json = core.save_json().unwrap();

    let mut other = EditorCore::new();
    let actions = other.load_json(&json).unwrap();
    assert!(actions.contains(&Action::DocumentChanged));
    assert_eq!(other.doc.layers(), core.doc.layers());
    assert!(other.history().is_empty());
}

#[test]
fn bad_json_leaves_document_untouched() {
    let mut core = EditorCore::new();
    place(&mut core, rect_at(0.0, 0.0, 10.0, 10.0));
    let before = core.doc.clone();
    assert!(core.load_json("{not json").is_err());
    assert_eq!(core.doc, before);
}

#[test]
fn load_rejects_saved_polygon_with_unbounded_sides() {
    let mut source = EditorCore::new();
    place(&mut source, SceneObject::new(Shape::Polygon { sides: u32::MAX, radius: 10.0 }));
    let json = source.save_json().unwrap();

    let mut core = EditorCore::new();
    let before = core.doc.clone();
    assert!(matches!(core.load_json(&json), Err(DocError::InvalidGeometry { .. })));
    assert_eq!(core.doc, before);
}

#[test]
fn dirty_flags_track_changes() {
    let mut core = EditorCore::new();
    assert_eq!(core.take_dirty(), Dirty { scene: true, overlay: true });
    assert_eq!(core.take_dirty(), Dirty::default());
    let id = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    core.select_object(&id, false);
    assert_eq!(core.take_dirty(), Dirty { scene: false, overlay: true });
    drag(&mut core, pt(10.0, 10.0), pt(50.0, 10.0), none());
    assert_eq!(core.take_dirty(), Dirty { scene: true, overlay: true });
}

#[test]
fn render_helpers_paint_scene_and_overlay() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    core.select_object(&id, false);

    let mut scene = RecordingSurface::new();
    core.render_scene(&mut scene, 200.0, 100.0).unwrap();
    assert!(scene.commands().iter().any(|c| matches!(c, DrawCommand::Fill { .. })));

    let mut overlay = RecordingSurface::new();
    core.render_overlay(&mut overlay, 200.0, 100.0).unwrap();
    assert!(matches!(overlay.commands().first(), Some(DrawCommand::Clear { .. })));
    assert!(overlay.commands().iter().any(|c| matches!(c, DrawCommand::Stroke { .. })));
}

#[test]
fn pointer_down_during_gesture_cancels_it_first() {
    let mut core = EditorCore::new();
    let id = place(&mut core, rect_at(0.0, 0.0, 20.0, 20.0));
    core.on_pointer_down(pt(10.0, 10.0), none());
    core.on_pointer_move(pt(60.0, 10.0), none());
    core.on_pointer_down(pt(300.0, 300.0), none());
    assert_eq!(position(&core, &id), pt(0.0, 0.0));
    assert!(matches!(core.input, InputState::Pending { .. }));
}
