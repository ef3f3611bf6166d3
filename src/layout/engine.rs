//! Layout engine — orchestrates the layout pass
//!
//! The engine walks the box tree parent-first, maintaining a [`LayoutStack`]
//! of per-box state frames. Block-level children stack vertically; sizes
//! come from style (definite px) or from content (auto heights). Content
//! inside a fragmentation context gets pushed across fragmentainer
//! boundaries, recording forced breaks and space shortages into the owning
//! multicol container's column bookkeeping.
//!
//! Multicol containers are laid out through a repeated-relayout loop: the
//! flow thread is laid out, the balanced column height recalculated, and the
//! pass re-run until the height settles or the pass cap is hit. The cap
//! turns a non-converging balance into a logged, reported condition instead
//! of a hang.

use crate::error::{LayoutError, Result};
use crate::geometry::{Point, Rect, Size};
use crate::layout::multicol;
use crate::layout::state::{LayoutState, LayoutStack, PushArgs};
use crate::style::Position;
use crate::tree::{BoxArena, BoxId};
use crate::view::ViewHost;
use crate::widget;

/// Configuration for a layout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
  /// Viewport size; the root's containing block
  pub viewport: Size,
  /// Fragmentainer height for view-level pagination (printing); 0 disables
  pub page_height: f32,
  /// Whether the view-level page height differs from the previous pass
  pub page_height_changed: bool,
  /// Override for the balancing pass cap; `None` derives it per container
  pub balancing_pass_cap: Option<u32>,
}

impl LayoutConfig {
  /// Creates a config for an unpaginated view of the given size
  pub fn new(viewport: Size) -> Self {
    Self {
      viewport,
      page_height: 0.0,
      page_height_changed: false,
      balancing_pass_cap: None,
    }
  }

  /// Sets a view-level fragmentainer height (printing mode)
  pub fn with_page_height(mut self, height: f32, changed: bool) -> Self {
    self.page_height = height;
    self.page_height_changed = changed;
    self
  }

  /// Overrides the balancing pass cap for every container
  pub fn with_balancing_pass_cap(mut self, cap: u32) -> Self {
    self.balancing_pass_cap = Some(cap.max(1));
    self
  }
}

/// Outcome of a layout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutResult {
  /// Final border-box size of the root box
  pub root_size: Size,
  /// Most balancing passes any single multicol container needed
  pub balancing_passes: u32,
  /// True when some container hit the balancing pass cap before settling
  pub balancing_capped: bool,
}

#[derive(Debug, Default)]
struct PassStats {
  balancing_passes: u32,
  balancing_capped: bool,
}

/// The layout engine
///
/// Stateless between passes apart from its configuration; all mutable state
/// lives in the arena and the per-pass [`LayoutStack`].
#[derive(Debug, Clone)]
pub struct LayoutEngine {
  config: LayoutConfig,
}

impl LayoutEngine {
  /// Creates an engine with the given configuration
  pub fn new(config: LayoutConfig) -> Self {
    Self { config }
  }

  /// The engine's configuration
  pub fn config(&self) -> &LayoutConfig {
    &self.config
  }

  /// Lays out the tree rooted at `root`
  ///
  /// Writes final absolute border-box rects into the arena, syncs widget
  /// view geometry through `host`, and reports balancing diagnostics.
  pub fn layout(
    &self,
    arena: &mut BoxArena,
    root: BoxId,
    host: &mut ViewHost,
  ) -> Result<LayoutResult> {
    let viewport = self.config.viewport;
    if !viewport.width.is_finite()
      || !viewport.height.is_finite()
      || viewport.width < 0.0
      || viewport.height < 0.0
    {
      return Err(
        LayoutError::InvalidViewport {
          width: viewport.width,
          height: viewport.height,
        }
        .into(),
      );
    }
    if !arena.is_live(root) {
      return Err(LayoutError::StaleBox(root).into());
    }
    if arena.node(root).is_flow_thread() {
      // Flow threads are laid out by their owning container.
      return Err(LayoutError::InvalidLayoutRoot(root).into());
    }

    let mut stack = LayoutStack::new(LayoutState::root(
      self.config.page_height,
      self.config.page_height_changed,
    ));
    let mut stats = PassStats::default();

    self.layout_box(arena, host, &mut stack, root, Point::ZERO, viewport.width, &mut stats)?;
    debug_assert_eq!(stack.depth(), 1, "push/pop imbalance");

    let root_size = arena.node(root).border_box.size;
    Ok(LayoutResult {
      root_size,
      balancing_passes: stats.balancing_passes,
      balancing_capped: stats.balancing_capped,
    })
  }

  /// Lays out one box at `origin` (relative to the parent frame's origin)
  /// and returns its border-box height.
  fn layout_box(
    &self,
    arena: &mut BoxArena,
    host: &mut ViewHost,
    stack: &mut LayoutStack,
    id: BoxId,
    origin: Point,
    avail_width: f32,
    stats: &mut PassStats,
  ) -> Result<f32> {
    let style = arena.node(id).style.clone();
    let width = style.width.unwrap_or(avail_width).max(0.0);
    // Auto heights resolve after children; push with the best known size so
    // clip propagation has something to work with (previous size if valid).
    let node = arena.node(id);
    let tentative_height = style.height.unwrap_or(if node.layout_valid {
      node.border_box.height()
    } else {
      0.0
    });

    let args = PushArgs {
      offset: origin,
      size: Size::new(width, tentative_height),
      ..Default::default()
    };

    let height = if arena.node(id).is_multicol_container() {
      self.layout_multicol(arena, host, stack, id, args, width, stats)?
    } else {
      stack.push(arena, id, args);
      let content_height = self.layout_children(arena, host, stack, id, width, stats)?;
      stack.pop();
      style
        .height
        .unwrap_or(content_height + style.border_and_padding().vertical())
    };

    self.finish_box(arena, host, stack, id, origin, Size::new(width, height));
    Ok(height)
  }

  /// Records final geometry and performs per-kind post-layout work
  fn finish_box(
    &self,
    arena: &mut BoxArena,
    host: &mut ViewHost,
    stack: &mut LayoutStack,
    id: BoxId,
    origin: Point,
    size: Size,
  ) {
    let parent_state = stack.current();
    let style = &arena.node(id).style;
    let mut paint_origin = if style.position == Position::Fixed {
      stack.root_frame().paint_offset + origin
    } else {
      parent_state.paint_offset + origin
    };
    if style.position.is_in_flow_positioned() && arena.node(id).has_layer() {
      paint_origin += style.relative_offset;
    }

    let new_rect = Rect::new(paint_origin, size);
    {
      let node = arena.node(id);
      if node.layout_valid && node.border_box.origin != new_rect.origin {
        // Accumulate the move for repaint-rect mapping in this pass.
        stack.add_layout_delta(node.border_box.origin - new_rect.origin);
      }
    }
    let node = arena.node_mut(id);
    node.border_box = new_rect;
    node.layout_valid = true;
    node.needs_layout = false;

    if arena.node(id).is_widget() {
      widget::sync_widget_geometry(arena, id, host);
    }
  }

  /// Lays out in-flow children stacked vertically, honoring fragmentation;
  /// returns the content height.
  fn layout_children(
    &self,
    arena: &mut BoxArena,
    host: &mut ViewHost,
    stack: &mut LayoutStack,
    id: BoxId,
    width: f32,
    stats: &mut PassStats,
  ) -> Result<f32> {
    let style = arena.node(id).style.clone();
    let bp = style.border_and_padding();
    let content_width = (width - bp.horizontal()).max(0.0);
    let children = arena.node(id).children.clone();

    let mut cursor = 0.0f32;
    for child in &children {
      let child_style = arena.node(*child).style.clone();
      if child_style.position.is_out_of_flow() {
        continue;
      }

      if child_style.break_before.is_forced() {
        cursor = self.apply_forced_break(arena, stack, bp.top + cursor) - bp.top;
      }

      let origin = Point::new(bp.left, bp.top + cursor);
      let child_height =
        self.layout_box(arena, host, stack, *child, origin, content_width, stats)?;

      // Atomic content (leaves and explicitly unsplittable boxes) does not
      // split across fragmentainers; push it whole and record the shortage.
      let atomic = child_style.unsplittable || arena.node(*child).children.is_empty();
      if atomic && child_height > 0.0 {
        cursor = self.adjust_for_pagination(
          arena,
          host,
          stack,
          *child,
          bp.top + cursor,
          child_height,
          content_width,
          stats,
        )? - bp.top;
      }

      cursor += child_height;

      if child_style.break_after.is_forced() {
        cursor = self.apply_forced_break(arena, stack, bp.top + cursor) - bp.top;
      }
    }

    // Out-of-flow boxes position against their containing block without
    // affecting flow or auto height.
    for child in &children {
      let child_style = arena.node(*child).style.clone();
      if !child_style.position.is_out_of_flow() {
        continue;
      }
      let origin = if child_style.position == Position::Fixed {
        child_style.relative_offset
      } else {
        Point::new(bp.left, bp.top) + child_style.relative_offset
      };
      self.layout_box(arena, host, stack, *child, origin, content_width, stats)?;
    }

    Ok(cursor)
  }

  /// Advances past a forced break and records it; returns the new cursor
  /// (in the parent frame's coordinate space, like its input).
  fn apply_forced_break(&self, arena: &mut BoxArena, stack: &mut LayoutStack, cursor: f32) -> f32 {
    let state = stack.current();
    let abs = state.layout_offset.y + cursor;
    let mut new_cursor = cursor;
    if state.page_height > 0.0 {
      let remaining = state.page_remaining_space(abs);
      if remaining < state.page_height {
        new_cursor += remaining;
      }
    }
    if let Some(columns) = state.columns {
      let offset = state.page_block_offset(state.layout_offset.y + new_cursor);
      multicol::columns_mut(arena, columns.owner).add_forced_break(offset);
    }
    new_cursor
  }

  /// Moves an atomic child that straddles a fragmentainer boundary to the
  /// next fragmentainer, recording space shortage; returns the child's new
  /// position (in the parent frame's coordinate space).
  #[allow(clippy::too_many_arguments)]
  fn adjust_for_pagination(
    &self,
    arena: &mut BoxArena,
    host: &mut ViewHost,
    stack: &mut LayoutStack,
    child: BoxId,
    position: f32,
    child_height: f32,
    avail_width: f32,
    stats: &mut PassStats,
  ) -> Result<f32> {
    let state = stack.current();
    if let Some(columns) = state.columns {
      multicol::columns_mut(arena, columns.owner).record_minimum_column_height(child_height);
    }
    let state = stack.current();
    if state.page_height <= 0.0 {
      return Ok(position);
    }

    let abs = state.layout_offset.y + position;
    let remaining = state.page_remaining_space(abs);
    if child_height <= remaining {
      return Ok(position);
    }

    let shortage = child_height - remaining;
    let columns = state.columns;
    let page_height = state.page_height;
    if let Some(columns) = columns {
      multicol::columns_mut(arena, columns.owner).record_space_shortage(shortage);
    }

    if child_height > page_height {
      // Taller than a whole fragmentainer; moving it would not help.
      return Ok(position);
    }

    // Push the child to the top of the next fragmentainer and re-lay it out
    // at its new position.
    let new_position = position + remaining;
    let bp_left = arena.node(child).parent.map_or(0.0, |p| {
      let s = &arena.node(p).style;
      s.border.left + s.padding.left
    });
    self.layout_box(
      arena,
      host,
      stack,
      child,
      Point::new(bp_left, new_position),
      avail_width,
      stats,
    )?;
    Ok(new_position)
  }

  /// Lays out a multicol container through the balancing loop; returns the
  /// container's border-box height.
  #[allow(clippy::too_many_arguments)]
  fn layout_multicol(
    &self,
    arena: &mut BoxArena,
    host: &mut ViewHost,
    stack: &mut LayoutStack,
    id: BoxId,
    args: PushArgs,
    width: f32,
    stats: &mut PassStats,
  ) -> Result<f32> {
    let style = arena.node(id).style.clone();
    let bp = style.border_and_padding();
    let content_width = (width - bp.horizontal()).max(0.0);

    let (count, col_width) = multicol::compute_column_count_and_width(&style.columns, content_width);
    {
      let columns = multicol::columns_mut(arena, id);
      // Runs, shortages, and the balanced height describe a single layout;
      // a fresh layout of this container starts over.
      columns.prepare_for_layout();
      columns.set_column_count_and_width(count, col_width);
      let definite_height = style.height.map(|h| (h - bp.vertical()).max(1.0));
      columns.set_height_policy(style.height.is_none(), definite_height);
    }

    let cap = self
      .config
      .balancing_pass_cap
      .unwrap_or_else(|| multicol::max_balancing_passes(count));

    let mut pass = 0u32;
    let mut initial = true;
    let mut rebalancing = false;
    loop {
      pass += 1;
      stack.push(
        arena,
        id,
        PushArgs {
          page_height_changed: args.page_height_changed || rebalancing,
          ..args
        },
      );

      let content_height = match multicol::flow_thread(arena, id) {
        Some(thread) => {
          let h = self.layout_box(
            arena,
            host,
            stack,
            thread,
            bp.top_left(),
            col_width.max(0.0),
            stats,
          )?;
          // The flow thread reports a forced break at end of content.
          multicol::columns_mut(arena, id).add_forced_break(h);
          h
        }
        None => 0.0,
      };

      stack.pop();

      if !multicol::columns(arena, id).requires_balancing() || content_height <= 0.0 {
        break;
      }

      let needs_another =
        multicol::columns_mut(arena, id).recalculate_balanced_height(initial, content_height);
      initial = false;

      if !needs_another {
        break;
      }
      if pass >= cap {
        log::warn!(
          "column balancing for {id:?} did not settle after {pass} passes; keeping last height"
        );
        stats.balancing_capped = true;
        break;
      }

      rebalancing = true;
      if let Some(thread) = multicol::flow_thread(arena, id) {
        arena.mark_self_needs_layout(thread);
      }
    }

    stats.balancing_passes = stats.balancing_passes.max(pass);

    Ok(
      style
        .height
        .unwrap_or_else(|| multicol::columns(arena, id).column_height() + bp.vertical()),
    )
  }
}

/// Width available to flow-thread children of a multicol container
///
/// Exposed for diagnostics; content inside columns is constrained to the
/// used column width, not the container's full content width.
pub fn column_content_width(arena: &BoxArena, container: BoxId) -> f32 {
  multicol::columns(arena, container).column_width()
}
