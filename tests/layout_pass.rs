//! End-to-end layout pass tests: offset propagation, fragmentation, and
//! column balancing through the public engine API.

use std::sync::Arc;

use pageflow::geometry::{EdgeOffsets, Point, Rect, Size};
use pageflow::layout::multicol;
use pageflow::layout::state::PushArgs;
use pageflow::layout::{LayoutConfig, LayoutEngine, LayoutState, LayoutStack};
use pageflow::style::{ComputedStyle, Overflow, Position};
use pageflow::tree::{BoxArena, BoxKind};
use pageflow::view::ViewHost;

fn block(arena: &mut BoxArena, style: ComputedStyle) -> pageflow::BoxId {
  arena.create_box(Arc::new(style), BoxKind::Block)
}

fn sized(width: f32, height: f32) -> ComputedStyle {
  ComputedStyle {
    width: Some(width),
    height: Some(height),
    ..ComputedStyle::initial()
  }
}

fn run_layout(arena: &mut BoxArena, root: pageflow::BoxId, viewport: Size) -> pageflow::LayoutResult {
  let engine = LayoutEngine::new(LayoutConfig::new(viewport));
  let mut host = ViewHost::new();
  engine.layout(arena, root, &mut host).unwrap()
}

#[test]
fn paint_offsets_are_sums_of_ancestor_offsets() {
  let mut arena = BoxArena::new();
  let mut root_style = sized(200.0, 0.0);
  root_style.border = EdgeOffsets::all(3.0);
  root_style.padding = EdgeOffsets::all(7.0);
  let root = block(&mut arena, root_style);

  let mut mid_style = sized(100.0, 40.0);
  mid_style.padding = EdgeOffsets::all(5.0);
  let mid = block(&mut arena, mid_style);
  let leaf = block(&mut arena, sized(50.0, 10.0));

  arena.append_child(root, mid);
  arena.append_child(mid, leaf);
  run_layout(&mut arena, root, Size::new(400.0, 400.0));

  // Each box's absolute origin is its parent's content origin plus its own
  // position in the parent's flow.
  assert_eq!(arena.node(mid).border_box.origin, Point::new(10.0, 10.0));
  assert_eq!(arena.node(leaf).border_box.origin, Point::new(15.0, 15.0));
}

#[test]
fn second_sibling_stacks_below_first() {
  let mut arena = BoxArena::new();
  let root = block(&mut arena, sized(100.0, 0.0));
  let a = block(&mut arena, sized(100.0, 25.0));
  let b = block(&mut arena, sized(100.0, 35.0));
  let b_leaf = block(&mut arena, sized(20.0, 5.0));
  arena.append_child(root, a);
  arena.append_child(root, b);
  arena.append_child(b, b_leaf);

  run_layout(&mut arena, root, Size::new(100.0, 400.0));
  assert_eq!(arena.node(b).border_box.origin, Point::new(0.0, 25.0));
  assert_eq!(arena.node(b_leaf).border_box.origin, Point::new(0.0, 25.0));
}

#[test]
fn fixed_position_is_independent_of_ancestors() {
  let mut arena = BoxArena::new();
  let mut root_style = sized(300.0, 0.0);
  root_style.padding = EdgeOffsets::all(20.0);
  let root = block(&mut arena, root_style);
  let mut mid_style = sized(200.0, 100.0);
  mid_style.padding = EdgeOffsets::all(15.0);
  let mid = block(&mut arena, mid_style);

  let mut fixed_style = sized(50.0, 50.0);
  fixed_style.position = Position::Fixed;
  fixed_style.relative_offset = Point::new(12.0, 34.0);
  let fixed = block(&mut arena, fixed_style);

  arena.append_child(root, mid);
  arena.append_child(mid, fixed);
  run_layout(&mut arena, root, Size::new(300.0, 400.0));

  // Nested two levels deep behind padding, yet positioned purely against
  // the viewport.
  assert_eq!(arena.node(fixed).border_box.origin, Point::new(12.0, 34.0));
}

#[test]
fn fixed_position_does_not_affect_auto_height() {
  let mut arena = BoxArena::new();
  let root = block(
    &mut arena,
    ComputedStyle {
      width: Some(100.0),
      ..ComputedStyle::initial()
    },
  );
  let flow = block(&mut arena, sized(100.0, 30.0));
  let mut fixed_style = sized(50.0, 500.0);
  fixed_style.position = Position::Fixed;
  let fixed = block(&mut arena, fixed_style);
  arena.append_child(root, flow);
  arena.append_child(root, fixed);

  let result = run_layout(&mut arena, root, Size::new(100.0, 400.0));
  assert_eq!(result.root_size.height, 30.0);
}

#[test]
fn descendant_clips_never_grow() {
  let clipper = |w: f32, h: f32| {
    let mut style = ComputedStyle::initial();
    style.overflow = Overflow::Hidden;
    style.width = Some(w);
    style.height = Some(h);
    Arc::new(style)
  };

  let mut arena = BoxArena::new();
  let a = arena.create_box(clipper(100.0, 100.0), BoxKind::Block);
  let b = arena.create_box(clipper(80.0, 120.0), BoxKind::Block);
  let c = arena.create_box(clipper(200.0, 30.0), BoxKind::Block);
  arena.append_child(a, b);
  arena.append_child(b, c);
  let ids = [a, b, c];

  let mut stack = LayoutStack::new(LayoutState::root(0.0, false));
  let mut previous_clip: Option<Rect> = None;
  for (i, id) in ids.iter().enumerate() {
    let style = arena.node(*id).style.clone();
    stack.push(
      &arena,
      *id,
      PushArgs {
        offset: Point::new(5.0 * i as f32, 3.0 * i as f32),
        size: Size::new(style.width.unwrap(), style.height.unwrap()),
        ..Default::default()
      },
    );
    let clip = stack.current().clip.expect("every box here clips");
    if let Some(previous) = previous_clip {
      assert!(
        previous.contains_rect(clip),
        "child clip {clip:?} escapes parent clip {previous:?}"
      );
    }
    previous_clip = Some(clip);
  }
}

#[test]
fn column_count_and_width_formulas() {
  use pageflow::style::ColumnStyle;

  // Fixed width, auto count.
  let (count, width) = multicol::compute_column_count_and_width(
    &ColumnStyle {
      count: None,
      width: Some(100.0),
      gap: 10.0,
    },
    310.0,
  );
  assert_eq!(count, 2);
  assert_eq!(width, 150.0);

  // Fixed count, auto width.
  let (count, width) = multicol::compute_column_count_and_width(
    &ColumnStyle {
      count: Some(3),
      width: None,
      gap: 10.0,
    },
    300.0,
  );
  assert_eq!(count, 3);
  assert!((width - 280.0 / 3.0).abs() < 0.001);
}

fn multicol_container(arena: &mut BoxArena, count: u32, heights: &[f32]) -> pageflow::BoxId {
  let mut style = ComputedStyle::initial();
  style.width = Some(320.0);
  style.columns.count = Some(count);
  style.columns.gap = 10.0;
  let container = arena.create_box(Arc::new(style), BoxKind::multicol());
  for &height in heights {
    let child = block(arena, sized(90.0, height));
    multicol::add_child(arena, container, child);
  }
  container
}

#[test]
fn balancing_terminates_within_the_derived_bound() {
  let cases: &[(u32, &[f32])] = &[
    (3, &[100.0, 100.0, 100.0]),
    (3, &[90.0, 90.0, 90.0, 30.0]),
    (4, &[50.0, 50.0, 50.0, 50.0, 50.0, 50.0]),
    (2, &[120.0, 40.0, 40.0, 40.0]),
  ];
  for (count, heights) in cases {
    let mut arena = BoxArena::new();
    let container = multicol_container(&mut arena, *count, heights);
    let result = run_layout(&mut arena, container, Size::new(320.0, 600.0));

    assert!(
      !result.balancing_capped,
      "count={count} heights={heights:?} hit the pass cap"
    );
    assert!(
      result.balancing_passes <= multicol::max_balancing_passes(*count),
      "count={count} heights={heights:?} took {} passes",
      result.balancing_passes
    );
    let height = multicol::columns(&arena, container).column_height();
    assert!(height > 0.0);
  }
}

#[test]
fn capped_balancing_is_reported_not_hung() {
  let _ = env_logger::builder().is_test(true).try_init();

  let mut arena = BoxArena::new();
  // This content needs at least two passes to settle; a cap of one pass
  // forces the capped path.
  let container = multicol_container(&mut arena, 3, &[90.0, 90.0, 90.0, 30.0]);
  let engine = LayoutEngine::new(
    LayoutConfig::new(Size::new(320.0, 600.0)).with_balancing_pass_cap(1),
  );
  let mut host = ViewHost::new();
  let result = engine.layout(&mut arena, container, &mut host).unwrap();

  assert!(result.balancing_capped);
  assert_eq!(result.balancing_passes, 1);
  // The last computed height is kept rather than discarded.
  assert!(multicol::columns(&arena, container).column_height() > 0.0);
}

#[test]
fn forced_column_breaks_start_new_columns() {
  let mut arena = BoxArena::new();
  let mut style = ComputedStyle::initial();
  style.width = Some(320.0);
  style.columns.count = Some(3);
  style.columns.gap = 10.0;
  let container = arena.create_box(Arc::new(style), BoxKind::multicol());

  let a = block(&mut arena, sized(90.0, 60.0));
  let mut b_style = sized(90.0, 60.0);
  b_style.break_before = pageflow::style::BreakBetween::Column;
  let b = block(&mut arena, b_style);
  let mut c_style = sized(90.0, 60.0);
  c_style.break_before = pageflow::style::BreakBetween::Column;
  let c = block(&mut arena, c_style);

  for child in [a, b, c] {
    multicol::add_child(&mut arena, container, child);
  }
  let result = run_layout(&mut arena, container, Size::new(320.0, 600.0));

  assert!(!result.balancing_capped);
  // Three forced-break-separated 60px pieces balance to 60px columns.
  assert_eq!(multicol::columns(&arena, container).column_height(), 60.0);
}

#[test]
fn widget_geometry_flows_to_the_host_after_layout() {
  let mut arena = BoxArena::new();
  let root = block(&mut arena, sized(200.0, 0.0));
  let mut widget_style = sized(120.0, 80.0);
  widget_style.border = EdgeOffsets::all(2.0);
  let widget_box = arena.create_box(Arc::new(widget_style), BoxKind::widget());
  arena.append_child(root, widget_box);

  let mut host = ViewHost::new();
  let view = host.create_view();
  let mut queue = pageflow::widget::DeferredReparentQueue::new();
  pageflow::widget::set_widget(&mut arena, widget_box, &mut queue, &mut host, Some(view));
  // No layout yet; geometry must not have been applied.
  assert_eq!(host.frame_of(view), Rect::ZERO);

  let engine = LayoutEngine::new(LayoutConfig::new(Size::new(200.0, 400.0)));
  engine.layout(&mut arena, root, &mut host).unwrap();

  assert_eq!(host.frame_of(view), Rect::from_xywh(2.0, 2.0, 116.0, 76.0));
  assert!(host.is_visible(view));
}
