//! View/window host surface
//!
//! The embedder owns real native views and compositing; this module models
//! the narrow surface the layout engine drives: foreign-view attachment and
//! geometry, repaint invalidation, and the registry of viewport-constrained
//! boxes. Everything is observable after the fact, which is also what the
//! integration tests assert against.

use rustc_hash::FxHashSet;

use crate::geometry::Rect;
use crate::tree::BoxId;

/// Stable identifier of a foreign (embedder-owned) view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub(crate) u32);

#[derive(Debug)]
struct ForeignView {
  parent: Option<ViewId>,
  frame: Rect,
  visible: bool,
}

/// One attach/detach/geometry operation applied to the host
///
/// Recorded in application order so batching behavior (deferred reparenting
/// in particular) can be verified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
  /// View attached to a parent view
  Attached { view: ViewId, parent: ViewId },
  /// View detached from its parent
  Detached { view: ViewId },
  /// View frame rect updated
  FrameSet { view: ViewId, frame: Rect },
  /// View shown or hidden
  VisibilitySet { view: ViewId, visible: bool },
}

/// The host the engine pushes view and repaint operations into
///
/// A real embedder would forward these to the windowing system and the
/// compositor; this implementation applies them to an in-memory model and
/// keeps an event log.
#[derive(Debug, Default)]
pub struct ViewHost {
  views: Vec<ForeignView>,
  events: Vec<ViewEvent>,
  repaints: Vec<(BoxId, Rect)>,
  viewport_constrained: FxHashSet<BoxId>,
}

impl ViewHost {
  /// Creates an empty host
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a new foreign view, detached and hidden
  pub fn create_view(&mut self) -> ViewId {
    let id = ViewId(self.views.len() as u32);
    self.views.push(ForeignView {
      parent: None,
      frame: Rect::ZERO,
      visible: false,
    });
    id
  }

  /// Current parent of a view
  pub fn parent_of(&self, view: ViewId) -> Option<ViewId> {
    self.views[view.0 as usize].parent
  }

  /// Current frame rect of a view
  pub fn frame_of(&self, view: ViewId) -> Rect {
    self.views[view.0 as usize].frame
  }

  /// Current visibility of a view
  pub fn is_visible(&self, view: ViewId) -> bool {
    self.views[view.0 as usize].visible
  }

  /// Attaches `view` under `parent`, detaching from any current parent first
  pub fn attach(&mut self, view: ViewId, parent: ViewId) {
    debug_assert!(view != parent, "view cannot parent itself");
    if self.views[view.0 as usize].parent.is_some() {
      self.detach(view);
    }
    self.views[view.0 as usize].parent = Some(parent);
    self.events.push(ViewEvent::Attached { view, parent });
  }

  /// Detaches `view` from its parent; no-op when already detached
  pub fn detach(&mut self, view: ViewId) {
    if self.views[view.0 as usize].parent.take().is_some() {
      self.events.push(ViewEvent::Detached { view });
    }
  }

  /// Sets a view's frame rect
  pub fn set_frame(&mut self, view: ViewId, frame: Rect) {
    let entry = &mut self.views[view.0 as usize];
    if entry.frame != frame {
      entry.frame = frame;
      self.events.push(ViewEvent::FrameSet { view, frame });
    }
  }

  /// Shows or hides a view
  pub fn set_visible(&mut self, view: ViewId, visible: bool) {
    let entry = &mut self.views[view.0 as usize];
    if entry.visible != visible {
      entry.visible = visible;
      self.events.push(ViewEvent::VisibilitySet { view, visible });
    }
  }

  /// Requests a repaint of `rect` on behalf of `source`
  pub fn invalidate_rect(&mut self, source: BoxId, rect: Rect) {
    self.repaints.push((source, rect));
  }

  /// Repaint requests issued so far, in order
  pub fn repaints(&self) -> &[(BoxId, Rect)] {
    &self.repaints
  }

  /// Clears the repaint log (a frame was painted)
  pub fn clear_repaints(&mut self) {
    self.repaints.clear();
  }

  /// Adds a box to the viewport-constrained registry
  pub fn add_viewport_constrained(&mut self, id: BoxId) {
    self.viewport_constrained.insert(id);
  }

  /// Removes a box from the viewport-constrained registry
  pub fn remove_viewport_constrained(&mut self, id: BoxId) {
    self.viewport_constrained.remove(&id);
  }

  /// True while the box is registered as viewport-constrained
  pub fn is_viewport_constrained(&self, id: BoxId) -> bool {
    self.viewport_constrained.contains(&id)
  }

  /// Full host event log, in application order
  pub fn events(&self) -> &[ViewEvent] {
    &self.events
  }

  /// Clears the event log
  pub fn clear_events(&mut self) {
    self.events.clear();
  }
}
