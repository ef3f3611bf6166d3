//! Foreign-view embedding (plugins, subframes)
//!
//! A widget box hosts an embedder-owned view. Moving such views between
//! native parents is expensive and order-sensitive, so batch passes suspend
//! reparenting: while an [`UpdateSuspendScope`] is open, move requests only
//! record the latest desired target per view in a [`DeferredReparentQueue`],
//! and the queue is flushed when the outermost scope closes. Outside any
//! scope, moves apply immediately.
//!
//! The queue is a plain value owned by whoever orchestrates the batch and
//! passed by reference into widget code. There is no hidden global; the
//! nesting counter lives on the queue and the scope is an RAII guard over it.

use crate::geometry::{Rect, Size};
use crate::style::Visibility;
use crate::tree::{BoxArena, BoxId, BoxKind};
use crate::view::{ViewHost, ViewId};

/// Pending foreign-view moves, recorded while updates are suspended
///
/// Each view has at most one entry: later requests overwrite the target in
/// place (last-write-wins), but the entry keeps its original position, so a
/// flush applies moves in first-request order.
#[derive(Debug, Default)]
pub struct DeferredReparentQueue {
  depth: u32,
  pending: Vec<(ViewId, Option<ViewId>)>,
}

impl DeferredReparentQueue {
  /// Creates an empty queue with no scopes open
  pub fn new() -> Self {
    Self::default()
  }

  /// True while at least one suspend scope is open
  pub fn is_suspended(&self) -> bool {
    self.depth > 0
  }

  /// Number of views with a pending move
  pub fn pending_moves(&self) -> usize {
    self.pending.len()
  }

  /// Requests that `view` move under `target` (`None` = detach)
  ///
  /// Applies immediately when no scope is open; otherwise records the
  /// request, overwriting any earlier pending target for the same view.
  pub fn move_view(&mut self, host: &mut ViewHost, view: ViewId, target: Option<ViewId>) {
    if self.depth == 0 {
      Self::apply(host, view, target);
      return;
    }
    match self.pending.iter_mut().find(|(v, _)| *v == view) {
      Some(entry) => entry.1 = target,
      None => self.pending.push((view, target)),
    }
  }

  fn apply(host: &mut ViewHost, view: ViewId, target: Option<ViewId>) {
    if host.parent_of(view) == target {
      return;
    }
    match target {
      Some(parent) => host.attach(view, parent),
      None => host.detach(view),
    }
  }

  fn flush(&mut self, host: &mut ViewHost) {
    debug_assert_eq!(self.depth, 0, "flush while still suspended");
    let pending = std::mem::take(&mut self.pending);
    for (view, target) in pending {
      Self::apply(host, view, target);
    }
  }
}

/// RAII guard suspending foreign-view reparenting
///
/// Opening the scope bumps the queue's nesting counter; dropping it
/// decrements, and the transition to zero flushes every pending move.
/// Nested scopes reborrow through [`UpdateSuspendScope::nested`], which makes
/// flushing before the outermost exit unrepresentable.
pub struct UpdateSuspendScope<'a> {
  queue: &'a mut DeferredReparentQueue,
  host: &'a mut ViewHost,
}

impl<'a> UpdateSuspendScope<'a> {
  /// Opens a suspend scope over `queue`
  pub fn new(queue: &'a mut DeferredReparentQueue, host: &'a mut ViewHost) -> Self {
    queue.depth += 1;
    Self { queue, host }
  }

  /// Opens an inner scope; the outer one is inaccessible until it drops
  pub fn nested(&mut self) -> UpdateSuspendScope<'_> {
    UpdateSuspendScope::new(self.queue, self.host)
  }

  /// Requests a (deferred) move of `view` under `target`
  pub fn move_view(&mut self, view: ViewId, target: Option<ViewId>) {
    self.queue.move_view(self.host, view, target);
  }

  /// Swaps the view embedded in a widget box
  pub fn set_widget(&mut self, arena: &mut BoxArena, id: BoxId, new_view: Option<ViewId>) {
    set_widget(arena, id, self.queue, self.host, new_view);
  }

  /// The suspended host, for non-reparenting operations
  pub fn host(&mut self) -> &mut ViewHost {
    self.host
  }
}

impl Drop for UpdateSuspendScope<'_> {
  fn drop(&mut self) {
    self.queue.depth -= 1;
    if self.queue.depth == 0 {
      self.queue.flush(self.host);
    }
  }
}

/// The view currently embedded in a widget box
pub fn view_of(arena: &BoxArena, id: BoxId) -> Option<ViewId> {
  match arena.node(id).kind {
    BoxKind::Widget { view } => view,
    _ => None,
  }
}

/// Swaps the view embedded in a widget box
///
/// The old view, if any, is detached through the queue (so a surrounding
/// suspend scope defers it). The new view gets its frame and visibility
/// applied right away when the box already has layout-valid geometry;
/// otherwise the next layout pass syncs them.
pub fn set_widget(
  arena: &mut BoxArena,
  id: BoxId,
  queue: &mut DeferredReparentQueue,
  host: &mut ViewHost,
  new_view: Option<ViewId>,
) {
  let BoxKind::Widget { view } = &mut arena.node_mut(id).kind else {
    debug_assert!(false, "set_widget on non-widget {id:?}");
    return;
  };
  if *view == new_view {
    return;
  }
  let old_view = std::mem::replace(view, new_view);

  if let Some(old) = old_view {
    queue.move_view(host, old, None);
  }

  if new_view.is_some() {
    let node = arena.node(id);
    if node.layout_valid && !node.needs_layout {
      sync_widget_geometry(arena, id, host);
    }
  }
}

/// Pushes a widget box's content-box rect and visibility to its view
///
/// Called at the end of the box's layout and from `set_widget` when geometry
/// is already valid. Change detection lives in the host, so calling this
/// redundantly emits nothing.
pub fn sync_widget_geometry(arena: &BoxArena, id: BoxId, host: &mut ViewHost) {
  let node = arena.node(id);
  let BoxKind::Widget { view: Some(view) } = node.kind else {
    return;
  };

  let bp = node.style.border_and_padding();
  let frame = Rect::new(
    node.border_box.origin.translate(bp.top_left()),
    Size::new(
      (node.border_box.size.width - bp.horizontal()).max(0.0),
      (node.border_box.size.height - bp.vertical()).max(0.0),
    ),
  );
  host.set_frame(view, frame);
  host.set_visible(view, node.style.visibility == Visibility::Visible);
}

/// Teardown hook for a widget box about to be removed from the tree
///
/// Releases the embedded view, detaching it through the queue so an active
/// suspend scope batches the detach with the rest of the update.
pub fn will_be_destroyed(
  arena: &mut BoxArena,
  id: BoxId,
  queue: &mut DeferredReparentQueue,
  host: &mut ViewHost,
) {
  let BoxKind::Widget { view } = &mut arena.node_mut(id).kind else {
    return;
  };
  if let Some(old) = view.take() {
    queue.move_view(host, old, None);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::Point;
  use crate::style::ComputedStyle;
  use crate::view::ViewEvent;
  use std::sync::Arc;

  fn widget_arena() -> (BoxArena, BoxId) {
    let mut arena = BoxArena::new();
    let id = arena.create_box(Arc::new(ComputedStyle::initial()), BoxKind::widget());
    (arena, id)
  }

  #[test]
  fn moves_apply_immediately_outside_scope() {
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let parent = host.create_view();
    let view = host.create_view();

    queue.move_view(&mut host, view, Some(parent));
    assert_eq!(host.parent_of(view), Some(parent));
    assert_eq!(queue.pending_moves(), 0);
  }

  #[test]
  fn last_write_wins_inside_scope() {
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let a = host.create_view();
    let b = host.create_view();
    let initial = host.create_view();
    let view = host.create_view();
    host.attach(view, initial);
    host.clear_events();

    {
      let mut scope = UpdateSuspendScope::new(&mut queue, &mut host);
      scope.move_view(view, Some(a));
      scope.move_view(view, Some(b));
      scope.move_view(view, None);
      assert!(scope.host().events().is_empty());
    }

    // One detach, no intermediate attaches to a or b.
    assert_eq!(host.events(), &[ViewEvent::Detached { view }]);
    assert_eq!(host.parent_of(view), None);
  }

  #[test]
  fn flush_skips_views_already_at_target() {
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let parent = host.create_view();
    let view = host.create_view();
    host.attach(view, parent);
    host.clear_events();

    {
      let mut scope = UpdateSuspendScope::new(&mut queue, &mut host);
      scope.move_view(view, Some(parent));
    }
    assert!(host.events().is_empty());
  }

  #[test]
  fn nested_scopes_flush_only_at_outermost_exit() {
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let parent = host.create_view();
    let view = host.create_view();

    {
      let mut outer = UpdateSuspendScope::new(&mut queue, &mut host);
      {
        let mut inner = outer.nested();
        inner.move_view(view, Some(parent));
      }
      // Inner scope closed; still suspended, nothing applied yet.
      assert!(outer.host().events().is_empty());
      outer.move_view(view, Some(parent));
    }
    assert_eq!(host.parent_of(view), Some(parent));
    assert_eq!(host.events(), &[ViewEvent::Attached { view, parent }]);
  }

  #[test]
  fn flush_applies_in_first_request_order() {
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let parent = host.create_view();
    let first = host.create_view();
    let second = host.create_view();

    {
      let mut scope = UpdateSuspendScope::new(&mut queue, &mut host);
      scope.move_view(first, None); // no-op, already detached
      scope.move_view(second, Some(parent));
      scope.move_view(first, Some(parent));
    }
    // Re-requesting `first` overwrote its target but kept its original queue
    // slot, so it still flushes ahead of `second`.
    assert_eq!(
      host.events(),
      &[
        ViewEvent::Attached { view: first, parent },
        ViewEvent::Attached { view: second, parent },
      ]
    );
  }

  #[test]
  fn set_widget_replacement_detaches_old_view() {
    let (mut arena, id) = widget_arena();
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let parent = host.create_view();
    let old = host.create_view();
    let new = host.create_view();
    host.attach(old, parent);

    set_widget(&mut arena, id, &mut queue, &mut host, Some(old));
    assert_eq!(view_of(&arena, id), Some(old));

    set_widget(&mut arena, id, &mut queue, &mut host, Some(new));
    assert_eq!(view_of(&arena, id), Some(new));
    assert_eq!(host.parent_of(old), None);
  }

  #[test]
  fn set_widget_applies_geometry_when_layout_valid() {
    let (mut arena, id) = widget_arena();
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let view = host.create_view();

    {
      let node = arena.node_mut(id);
      node.border_box = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
      node.layout_valid = true;
      node.needs_layout = false;
    }
    set_widget(&mut arena, id, &mut queue, &mut host, Some(view));

    assert_eq!(host.frame_of(view), Rect::from_xywh(10.0, 20.0, 100.0, 50.0));
    assert!(host.is_visible(view));
  }

  #[test]
  fn set_widget_defers_geometry_until_layout() {
    let (mut arena, id) = widget_arena();
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let view = host.create_view();

    set_widget(&mut arena, id, &mut queue, &mut host, Some(view));
    assert!(host.events().is_empty());
  }

  #[test]
  fn sync_excludes_border_and_padding() {
    let (mut arena, id) = widget_arena();
    let mut host = ViewHost::new();
    let view = host.create_view();
    {
      let node = arena.node_mut(id);
      let mut style = ComputedStyle::initial();
      style.border = crate::geometry::EdgeOffsets::all(2.0);
      style.padding = crate::geometry::EdgeOffsets::all(3.0);
      node.style = Arc::new(style);
      node.kind = BoxKind::Widget { view: Some(view) };
      node.border_box = Rect::new(Point::new(0.0, 0.0), Size::new(100.0, 60.0));
    }

    sync_widget_geometry(&arena, id, &mut host);
    assert_eq!(host.frame_of(view), Rect::from_xywh(5.0, 5.0, 90.0, 50.0));
  }

  #[test]
  fn hidden_widget_hides_its_view() {
    let (mut arena, id) = widget_arena();
    let mut host = ViewHost::new();
    let view = host.create_view();
    host.set_visible(view, true);
    {
      let node = arena.node_mut(id);
      let mut style = ComputedStyle::initial();
      style.visibility = Visibility::Hidden;
      node.style = Arc::new(style);
      node.kind = BoxKind::Widget { view: Some(view) };
    }

    sync_widget_geometry(&arena, id, &mut host);
    assert!(!host.is_visible(view));
  }

  #[test]
  fn destruction_releases_the_view() {
    let (mut arena, id) = widget_arena();
    let mut host = ViewHost::new();
    let mut queue = DeferredReparentQueue::new();
    let parent = host.create_view();
    let view = host.create_view();
    host.attach(view, parent);
    set_widget(&mut arena, id, &mut queue, &mut host, Some(view));

    will_be_destroyed(&mut arena, id, &mut queue, &mut host);
    assert_eq!(view_of(&arena, id), None);
    assert_eq!(host.parent_of(view), None);
  }
}
