//! Per-box layout state propagation
//!
//! While the engine recurses through the box tree it carries a chain of
//! [`LayoutState`] frames: one per box currently being laid out, each derived
//! from its parent's. A frame accumulates the paint offset, the active clip,
//! and the pagination context that apply to the box's content.
//!
//! Frames are plain values held in a [`LayoutStack`] (a `Vec`), pushed when
//! layout of a box begins and popped when it completes. The stack discipline
//! mirrors the recursion exactly, so a frame can never outlive the layout
//! call that created it, and a non-root frame always has a parent below it —
//! both by construction rather than by assertion.

use std::sync::Arc;

use crate::geometry::{Point, Rect, Size};
use crate::style::Position;
use crate::tree::{BoxArena, BoxId, BoxKind};

/// By-value snapshot of the enclosing column context
///
/// Descendants of a multicol container read these counters; all mutation
/// funnels through the owning container box in the arena, so the snapshot
/// cannot violate the "descendants must not mutate column state" rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnContext {
  /// The multicol container owning the column bookkeeping
  pub owner: BoxId,
  /// Used column count this pass
  pub column_count: u32,
  /// Current column height this pass (0 = not yet balanced)
  pub column_height: f32,
}

/// Shape-inside exclusion info, positioned in absolute coordinates
///
/// Established by a box with `shape-inside` and inherited by descendant
/// frames; content layout treats it as an opaque exclusion area.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInsideInfo {
  /// The box that established the shape
  pub owner: BoxId,
  /// Exclusion area in absolute coordinates
  pub bounds: Rect,
}

/// Accumulated layout state for one box being laid out
#[derive(Debug, Clone)]
pub struct LayoutState {
  /// Offset at which this box's content paints, in absolute coordinates
  ///
  /// Includes in-flow relative-position adjustments and scroll offsets.
  pub paint_offset: Point,
  /// Like `paint_offset`, but before any in-flow positioned-layer
  /// adjustment; pagination arithmetic keys off this one
  pub layout_offset: Point,
  /// Accumulated delta between old and new positions during incremental
  /// layout, consumed by repaint-rect mapping
  pub layout_delta: Point,
  /// Active clip rectangle in absolute coordinates, if any ancestor (or
  /// this box) clips
  pub clip: Option<Rect>,
  /// Current fragmentainer height; 0 when not paginated by height
  pub page_height: f32,
  /// Absolute origin the pagination space is measured from
  pub page_offset: Point,
  /// Whether the page height differs from the previous layout pass
  pub page_height_changed: bool,
  /// Enclosing column context, if inside a multicol container
  pub columns: Option<ColumnContext>,
  /// Enclosing shape-inside info, if any
  pub shape: Option<Arc<ShapeInsideInfo>>,
}

impl LayoutState {
  /// Creates the root frame
  ///
  /// `page_height` is non-zero when the whole view is paginated (printing);
  /// `page_height_changed` forces full re-pagination of the pass.
  pub fn root(page_height: f32, page_height_changed: bool) -> Self {
    Self {
      paint_offset: Point::ZERO,
      layout_offset: Point::ZERO,
      layout_delta: Point::ZERO,
      clip: None,
      page_height,
      page_offset: Point::ZERO,
      page_height_changed,
      columns: None,
      shape: None,
    }
  }

  /// True when content in this frame is subject to fragmentation
  pub fn is_paginated(&self) -> bool {
    self.page_height != 0.0 || self.columns.is_some()
  }

  /// Offset of an absolute block position into the current pagination space
  pub fn page_block_offset(&self, block_position: f32) -> f32 {
    block_position - self.page_offset.y
  }

  /// Space remaining in the fragmentainer containing `block_position`
  ///
  /// `block_position` is absolute; returns `page_height` at an exact
  /// fragmentainer boundary.
  pub fn page_remaining_space(&self, block_position: f32) -> f32 {
    debug_assert!(self.page_height > 0.0);
    let offset = self.page_block_offset(block_position);
    let into_page = offset.rem_euclid(self.page_height);
    if into_page == 0.0 {
      self.page_height
    } else {
      self.page_height - into_page
    }
  }
}

/// Arguments for deriving a child frame; see [`LayoutStack::push`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PushArgs {
  /// Offset of the box's border-box origin from the parent frame's origin
  pub offset: Point,
  /// Border-box size of the box, as computed so far
  pub size: Size,
  /// New fragmentainer height established by this box, if any
  pub page_height: Option<f32>,
  /// Whether that new height differs from the previous pass
  pub page_height_changed: bool,
}

/// Stack of [`LayoutState`] frames mirroring the layout recursion
///
/// Constructing the stack creates the root frame, so every subsequent push
/// has a parent to derive from; `pop` refuses to remove the root.
#[derive(Debug)]
pub struct LayoutStack {
  frames: Vec<LayoutState>,
}

impl LayoutStack {
  /// Creates a stack holding only the root frame
  pub fn new(root: LayoutState) -> Self {
    Self { frames: vec![root] }
  }

  /// The frame of the box currently being laid out
  pub fn current(&self) -> &LayoutState {
    self.frames.last().expect("layout stack always has a root")
  }

  /// The root frame
  pub fn root_frame(&self) -> &LayoutState {
    &self.frames[0]
  }

  /// Current nesting depth, root included
  pub fn depth(&self) -> usize {
    self.frames.len()
  }

  /// Derives and pushes the frame for `box_id`
  ///
  /// Propagation rules:
  /// - fixed-position boxes take their offset from the root frame, ignoring
  ///   every intervening ancestor offset;
  /// - the layout offset snapshots the paint offset *before* the in-flow
  ///   positioned-layer adjustment;
  /// - an overflow-clipping box intersects its padding-box rect with the
  ///   inherited clip, then shifts the paint offset by its scroll position;
  /// - pagination fields are set fresh when the box establishes a
  ///   fragmentation context (explicit page height, own columns, or being a
  ///   flow thread) and copied from the parent otherwise; an unsplittable
  ///   box zeroes the page height for its subtree.
  pub fn push(&mut self, arena: &BoxArena, box_id: BoxId, args: PushArgs) {
    let node = arena.node(box_id);
    let style = &node.style;
    let parent = self.current();

    let mut paint_offset = if style.position == Position::Fixed {
      self.root_frame().paint_offset + args.offset
    } else {
      parent.paint_offset + args.offset
    };

    // The layout offset must not include the in-flow positioned-layer
    // shift; repaint mapping undoes that shift through the layer instead.
    let layout_offset = paint_offset;
    if style.position.is_in_flow_positioned() && node.has_layer() {
      paint_offset += style.relative_offset;
    }

    let layout_delta = parent.layout_delta;

    let mut clip = parent.clip;
    if style.has_overflow_clip() {
      let bp = style.border;
      let own_clip = Rect::from_xywh(
        paint_offset.x + bp.left,
        paint_offset.y + bp.top,
        (args.size.width - bp.horizontal()).max(0.0),
        (args.size.height - bp.vertical()).max(0.0),
      );
      clip = Some(match parent.clip {
        Some(parent_clip) => parent_clip.intersection(own_clip),
        None => own_clip,
      });
      paint_offset += -style.scroll_offset;
    }

    let columns = match &node.kind {
      BoxKind::MulticolContainer { columns, .. } => Some(ColumnContext {
        owner: box_id,
        column_count: columns.column_count(),
        column_height: columns.column_height(),
      }),
      _ => parent.columns,
    };

    let establishes_page_height =
      args.page_height.is_some() || node.is_flow_thread() || node.is_multicol_container();

    let (mut page_height, page_offset, page_height_changed) = if establishes_page_height {
      let height = args.page_height.unwrap_or_else(|| {
        columns.map(|c| c.column_height).unwrap_or(parent.page_height)
      });
      let origin = layout_offset + style.border_and_padding().top_left();
      (height, origin, args.page_height_changed)
    } else {
      (parent.page_height, parent.page_offset, parent.page_height_changed)
    };

    if style.unsplittable {
      page_height = 0.0;
    }

    let shape = match style.shape_inside {
      Some(rect) => Some(Arc::new(ShapeInsideInfo {
        owner: box_id,
        bounds: rect.translate(paint_offset),
      })),
      None => parent.shape.clone(),
    };

    self.frames.push(LayoutState {
      paint_offset,
      layout_offset,
      layout_delta,
      clip,
      page_height,
      page_offset,
      page_height_changed,
      columns,
      shape,
    });
  }

  /// Adds to the current frame's accumulated layout delta
  ///
  /// Called when a box is found at a different position than the previous
  /// pass left it; repaint-rect mapping consumes the accumulated value.
  pub fn add_layout_delta(&mut self, delta: Point) {
    let frame = self.frames.last_mut().expect("layout stack always has a root");
    frame.layout_delta += delta;
  }

  /// Pops the frame pushed for the box whose layout just completed
  pub fn pop(&mut self) {
    debug_assert!(self.frames.len() > 1, "cannot pop the root frame");
    if self.frames.len() > 1 {
      self.frames.pop();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::style::{ComputedStyle, Overflow};
  use crate::tree::BoxKind;

  fn arena_with_chain(styles: Vec<ComputedStyle>) -> (BoxArena, Vec<BoxId>) {
    let mut arena = BoxArena::new();
    let mut ids = Vec::new();
    for style in styles {
      let id = arena.create_box(Arc::new(style), BoxKind::Block);
      if let Some(&parent) = ids.last() {
        arena.append_child(parent, id);
      }
      ids.push(id);
    }
    (arena, ids)
  }

  fn push_plain(stack: &mut LayoutStack, arena: &BoxArena, id: BoxId, x: f32, y: f32) {
    stack.push(
      arena,
      id,
      PushArgs {
        offset: Point::new(x, y),
        size: Size::new(100.0, 100.0),
        ..Default::default()
      },
    );
  }

  #[test]
  fn offsets_accumulate_down_the_chain() {
    let (arena, ids) =
      arena_with_chain(vec![ComputedStyle::initial(), ComputedStyle::initial(), ComputedStyle::initial()]);
    let mut stack = LayoutStack::new(LayoutState::root(0.0, false));

    push_plain(&mut stack, &arena, ids[0], 10.0, 20.0);
    push_plain(&mut stack, &arena, ids[1], 1.0, 2.0);
    push_plain(&mut stack, &arena, ids[2], 100.0, 200.0);

    assert_eq!(stack.current().paint_offset, Point::new(111.0, 222.0));
    assert_eq!(stack.current().layout_offset, Point::new(111.0, 222.0));

    stack.pop();
    assert_eq!(stack.current().paint_offset, Point::new(11.0, 22.0));
  }

  #[test]
  fn fixed_position_ignores_ancestor_offsets() {
    let mut fixed = ComputedStyle::initial();
    fixed.position = Position::Fixed;
    let (arena, ids) =
      arena_with_chain(vec![ComputedStyle::initial(), ComputedStyle::initial(), fixed]);
    let mut stack = LayoutStack::new(LayoutState::root(0.0, false));

    push_plain(&mut stack, &arena, ids[0], 50.0, 50.0);
    push_plain(&mut stack, &arena, ids[1], 30.0, 30.0);
    push_plain(&mut stack, &arena, ids[2], 5.0, 7.0);

    assert_eq!(stack.current().paint_offset, Point::new(5.0, 7.0));
  }

  #[test]
  fn overflow_clip_intersects_and_scroll_shifts_paint_offset() {
    let mut clipper = ComputedStyle::initial();
    clipper.overflow = Overflow::Scroll;
    clipper.scroll_offset = Point::new(0.0, 40.0);
    let (arena, ids) = arena_with_chain(vec![ComputedStyle::initial(), clipper]);
    let mut stack = LayoutStack::new(LayoutState::root(0.0, false));

    push_plain(&mut stack, &arena, ids[0], 0.0, 0.0);
    push_plain(&mut stack, &arena, ids[1], 10.0, 10.0);

    let state = stack.current();
    // Clip rect uses the unscrolled paint offset.
    assert_eq!(state.clip, Some(Rect::from_xywh(10.0, 10.0, 100.0, 100.0)));
    // Paint offset then shifts by the negative scroll offset.
    assert_eq!(state.paint_offset, Point::new(10.0, -30.0));
    // Layout offset is unaffected by scrolling.
    assert_eq!(state.layout_offset, Point::new(10.0, 10.0));
  }

  #[test]
  fn nested_clips_intersect() {
    let mut outer = ComputedStyle::initial();
    outer.overflow = Overflow::Hidden;
    let mut inner = ComputedStyle::initial();
    inner.overflow = Overflow::Hidden;
    let (arena, ids) = arena_with_chain(vec![outer, inner]);
    let mut stack = LayoutStack::new(LayoutState::root(0.0, false));

    stack.push(
      &arena,
      ids[0],
      PushArgs {
        offset: Point::ZERO,
        size: Size::new(50.0, 50.0),
        ..Default::default()
      },
    );
    stack.push(
      &arena,
      ids[1],
      PushArgs {
        offset: Point::new(40.0, 40.0),
        size: Size::new(50.0, 50.0),
        ..Default::default()
      },
    );

    let clip = stack.current().clip.unwrap();
    assert_eq!(clip, Rect::from_xywh(40.0, 40.0, 10.0, 10.0));
  }

  #[test]
  fn relative_layer_shifts_paint_but_not_layout_offset() {
    let mut relative = ComputedStyle::initial();
    relative.position = Position::Relative;
    relative.relative_offset = Point::new(3.0, 4.0);
    let (mut arena, ids) = arena_with_chain(vec![ComputedStyle::initial(), relative]);
    arena.node_mut(ids[1]).layer = Some(crate::layer::Layer::new());

    let mut stack = LayoutStack::new(LayoutState::root(0.0, false));
    push_plain(&mut stack, &arena, ids[0], 0.0, 0.0);
    push_plain(&mut stack, &arena, ids[1], 10.0, 10.0);

    assert_eq!(stack.current().paint_offset, Point::new(13.0, 14.0));
    assert_eq!(stack.current().layout_offset, Point::new(10.0, 10.0));
  }

  #[test]
  fn explicit_page_height_establishes_pagination() {
    let (arena, ids) = arena_with_chain(vec![ComputedStyle::initial(), ComputedStyle::initial()]);
    let mut stack = LayoutStack::new(LayoutState::root(0.0, false));

    stack.push(
      &arena,
      ids[0],
      PushArgs {
        offset: Point::new(0.0, 0.0),
        size: Size::new(100.0, 400.0),
        page_height: Some(200.0),
        page_height_changed: true,
      },
    );
    assert!(stack.current().is_paginated());
    assert_eq!(stack.current().page_height, 200.0);
    assert!(stack.current().page_height_changed);

    // A plain child inherits the pagination context verbatim.
    push_plain(&mut stack, &arena, ids[1], 0.0, 50.0);
    assert_eq!(stack.current().page_height, 200.0);
    assert!(stack.current().page_height_changed);
  }

  #[test]
  fn unsplittable_box_zeroes_page_height() {
    let mut unsplittable = ComputedStyle::initial();
    unsplittable.unsplittable = true;
    let (arena, ids) = arena_with_chain(vec![ComputedStyle::initial(), unsplittable]);
    let mut stack = LayoutStack::new(LayoutState::root(0.0, false));

    stack.push(
      &arena,
      ids[0],
      PushArgs {
        page_height: Some(100.0),
        ..Default::default()
      },
    );
    push_plain(&mut stack, &arena, ids[1], 0.0, 0.0);
    assert_eq!(stack.current().page_height, 0.0);
  }

  #[test]
  fn page_remaining_space_wraps_at_boundaries() {
    let state = LayoutState::root(100.0, false);
    assert_eq!(state.page_remaining_space(0.0), 100.0);
    assert_eq!(state.page_remaining_space(30.0), 70.0);
    assert_eq!(state.page_remaining_space(100.0), 100.0);
    assert_eq!(state.page_remaining_space(130.0), 70.0);
  }

  #[test]
  fn shape_inside_is_established_and_inherited() {
    let mut shaped = ComputedStyle::initial();
    shaped.shape_inside = Some(Rect::from_xywh(5.0, 5.0, 20.0, 20.0));
    let (arena, ids) =
      arena_with_chain(vec![ComputedStyle::initial(), shaped, ComputedStyle::initial()]);
    let mut stack = LayoutStack::new(LayoutState::root(0.0, false));

    push_plain(&mut stack, &arena, ids[0], 0.0, 0.0);
    assert!(stack.current().shape.is_none());
    push_plain(&mut stack, &arena, ids[1], 10.0, 0.0);
    let established = stack.current().shape.clone().unwrap();
    assert_eq!(established.owner, ids[1]);
    assert_eq!(established.bounds, Rect::from_xywh(15.0, 5.0, 20.0, 20.0));

    push_plain(&mut stack, &arena, ids[2], 0.0, 0.0);
    let inherited = stack.current().shape.clone().unwrap();
    assert!(Arc::ptr_eq(&established, &inherited));
  }
}
