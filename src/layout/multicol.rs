//! Multi-column container mechanics
//!
//! A multicol container never holds real content directly: its single flow
//! thread child does. The container computes the used column count and width
//! from style, drives the flow thread's layout, and (when its height is auto)
//! re-runs that layout with an updated column height until balancing settles.
//! The repeated-layout loop itself lives in `layout::engine`; this module
//! supplies the pieces it loops over.

use std::sync::Arc;

use crate::layout::columns::ColumnInfo;
use crate::style::{ColumnStyle, ComputedStyle};
use crate::tree::{BoxArena, BoxId, BoxKind};

/// Upper bound on balancing passes for a container
///
/// Balancing converges in at most one pass per column (each pass either
/// settles or stretches past at least one more break), so `count + 2` leaves
/// slack for the initial guess and a rounding wobble. Exceeding the bound is
/// a logic error that gets logged and reported, never an infinite loop.
pub fn max_balancing_passes(column_count: u32) -> u32 {
  (column_count + 2).max(4)
}

/// Computes the used column count and width from style inputs
///
/// `avail_width` is the container's content logical width. At least one of
/// `column-count`/`column-width` must be non-auto; the style layer upstream
/// guarantees that for any box it reports as a multicol container.
pub fn compute_column_count_and_width(columns: &ColumnStyle, avail_width: f32) -> (u32, f32) {
  debug_assert!(
    columns.is_multicol(),
    "column count and width cannot both be auto"
  );
  let col_gap = columns.gap;
  let col_width = columns.width.map(|w| w.max(1.0));
  let col_count = columns.count.map(|c| c.max(1));

  match (col_width, col_count) {
    (None, Some(count)) => {
      let width = ((avail_width - (count - 1) as f32 * col_gap) / count as f32).max(0.0);
      (count, width)
    }
    (Some(width), None) => {
      let count = (((avail_width + col_gap) / (width + col_gap)).floor()).max(1.0) as u32;
      let used_width = (avail_width + col_gap) / count as f32 - col_gap;
      (count, used_width)
    }
    (Some(width), Some(count)) => {
      let fitting = (((avail_width + col_gap) / (width + col_gap)).floor()).max(1.0) as u32;
      let count = count.min(fitting).max(1);
      let used_width = (avail_width + col_gap) / count as f32 - col_gap;
      (count, used_width)
    }
    (None, None) => (1, avail_width.max(0.0)),
  }
}

/// Inserts a child into a multicol container
///
/// The first insertion lazily creates the flow thread; every child, first
/// and subsequent, actually lands inside the flow thread — never directly in
/// the container. The flow thread, once created, is never replaced.
pub fn add_child(arena: &mut BoxArena, container: BoxId, child: BoxId) {
  debug_assert!(arena.node(container).is_multicol_container());

  let thread = match flow_thread(arena, container) {
    Some(thread) => thread,
    None => {
      let thread = arena.create_box(Arc::new(ComputedStyle::initial()), BoxKind::FlowThread);
      arena.append_child(container, thread);
      let BoxKind::MulticolContainer { flow_thread, .. } = &mut arena.node_mut(container).kind
      else {
        unreachable!("checked above");
      };
      *flow_thread = Some(thread);
      thread
    }
  };

  arena.append_child(thread, child);
}

/// The container's flow thread, if it has been created
pub fn flow_thread(arena: &BoxArena, container: BoxId) -> Option<BoxId> {
  match arena.node(container).kind {
    BoxKind::MulticolContainer { flow_thread, .. } => flow_thread,
    _ => None,
  }
}

/// Borrows the container's column bookkeeping
pub fn columns(arena: &BoxArena, container: BoxId) -> &ColumnInfo {
  match &arena.node(container).kind {
    BoxKind::MulticolContainer { columns, .. } => columns,
    _ => panic!("{container:?} is not a multicol container"),
  }
}

/// Mutably borrows the container's column bookkeeping
pub fn columns_mut(arena: &mut BoxArena, container: BoxId) -> &mut ColumnInfo {
  match &mut arena.node_mut(container).kind {
    BoxKind::MulticolContainer { columns, .. } => columns,
    _ => panic!("{container:?} is not a multicol container"),
  }
}
