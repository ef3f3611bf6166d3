//! Box tree arena
//!
//! Layout operates on a tree of boxes stored in an arena and addressed by
//! stable integer ids. Parent/child links are ids, never references, so the
//! usual parent-pointer lifetime hazards of a linked box tree cannot arise:
//! holding a `BoxId` across mutations is always safe, it just may go stale
//! (and staleness is checkable).
//!
//! Box capabilities are expressed as tagged variants rather than a deep
//! inheritance chain: a box is a plain block, a multicol container, the flow
//! thread inside one, or a widget host. Cross-cutting state (the optional
//! layer, computed geometry) lives directly on the node.

use std::sync::Arc;

use crate::geometry::Rect;
use crate::layer::Layer;
use crate::layout::columns::ColumnInfo;
use crate::style::ComputedStyle;
use crate::view::ViewId;

/// Stable identifier of a box in a [`BoxArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(pub(crate) u32);

impl BoxId {
  /// Index into the arena's node storage
  pub(crate) fn index(self) -> usize {
    self.0 as usize
  }
}

/// Capability variant of a box
#[derive(Debug, Clone, Default)]
pub enum BoxKind {
  /// An ordinary block-level box
  #[default]
  Block,
  /// A multi-column container
  ///
  /// Owns its column bookkeeping and (lazily) a single flow-thread child
  /// holding all real content.
  MulticolContainer {
    /// The flow thread, created on first child insertion
    flow_thread: Option<BoxId>,
    /// Column counters and balancing state
    columns: ColumnInfo,
  },
  /// The internal flow thread of a multicol container
  FlowThread,
  /// A box embedding a foreign content view (plugin/frame)
  Widget {
    /// The embedded view, if one is attached
    view: Option<ViewId>,
  },
}

impl BoxKind {
  /// Creates an empty multicol container variant
  pub fn multicol() -> Self {
    BoxKind::MulticolContainer {
      flow_thread: None,
      columns: ColumnInfo::default(),
    }
  }

  /// Creates a widget variant with no view attached yet
  pub fn widget() -> Self {
    BoxKind::Widget { view: None }
  }
}

/// One box in the arena
#[derive(Debug)]
pub struct BoxNode {
  /// Computed style, shared with whoever resolved it
  pub style: Arc<ComputedStyle>,
  /// Capability variant
  pub kind: BoxKind,
  /// Parent link; `None` only for the root (and detached subtree roots)
  pub parent: Option<BoxId>,
  /// Children in document order
  pub children: Vec<BoxId>,
  /// Stacking/compositing layer, when the box owns one
  pub layer: Option<Layer>,
  /// Border-box rect in absolute (paint) coordinates, valid after layout
  pub border_box: Rect,
  /// Whether `border_box` reflects a completed layout pass
  pub layout_valid: bool,
  /// Dirty bit consumed by the next layout pass
  pub needs_layout: bool,
  live: bool,
}

impl BoxNode {
  fn new(style: Arc<ComputedStyle>, kind: BoxKind) -> Self {
    Self {
      style,
      kind,
      parent: None,
      children: Vec::new(),
      layer: None,
      border_box: Rect::ZERO,
      layout_valid: false,
      needs_layout: true,
      live: true,
    }
  }

  /// True while the box has an owned layer
  pub fn has_layer(&self) -> bool {
    self.layer.is_some()
  }

  /// True for the flow-thread variant
  pub fn is_flow_thread(&self) -> bool {
    matches!(self.kind, BoxKind::FlowThread)
  }

  /// True for the multicol-container variant
  pub fn is_multicol_container(&self) -> bool {
    matches!(self.kind, BoxKind::MulticolContainer { .. })
  }

  /// True for the widget variant
  pub fn is_widget(&self) -> bool {
    matches!(self.kind, BoxKind::Widget { .. })
  }
}

/// Arena of boxes addressed by [`BoxId`]
///
/// Nodes are never physically removed; destruction marks them dead so stale
/// ids stay detectable instead of aliasing a recycled slot.
#[derive(Debug, Default)]
pub struct BoxArena {
  nodes: Vec<BoxNode>,
}

impl BoxArena {
  /// Creates an empty arena
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a new detached box and returns its id
  pub fn create_box(&mut self, style: Arc<ComputedStyle>, kind: BoxKind) -> BoxId {
    let id = BoxId(self.nodes.len() as u32);
    self.nodes.push(BoxNode::new(style, kind));
    id
  }

  /// True while `id` refers to a live box
  pub fn is_live(&self, id: BoxId) -> bool {
    self.nodes.get(id.index()).is_some_and(|n| n.live)
  }

  /// Borrows a box
  ///
  /// Panics on a stale or out-of-range id; ids are produced by this arena
  /// and outliving the box is a caller bug.
  pub fn node(&self, id: BoxId) -> &BoxNode {
    let node = &self.nodes[id.index()];
    debug_assert!(node.live, "access to destroyed box {id:?}");
    node
  }

  /// Mutably borrows a box
  pub fn node_mut(&mut self, id: BoxId) -> &mut BoxNode {
    let node = &mut self.nodes[id.index()];
    debug_assert!(node.live, "access to destroyed box {id:?}");
    node
  }

  /// Appends `child` to `parent`'s child list
  ///
  /// This is the raw tree edit; multicol containers redirect insertions into
  /// their flow thread via `layout::multicol::add_child` instead of calling
  /// this directly.
  pub fn append_child(&mut self, parent: BoxId, child: BoxId) {
    debug_assert!(self.node(child).parent.is_none(), "child already attached");
    self.node_mut(child).parent = Some(parent);
    self.node_mut(parent).children.push(child);
    self.mark_needs_layout(parent);
  }

  /// Detaches `child` from its parent, leaving it a free-standing subtree
  pub fn detach_child(&mut self, child: BoxId) {
    let Some(parent) = self.node(child).parent else {
      return;
    };
    self.node_mut(child).parent = None;
    let siblings = &mut self.node_mut(parent).children;
    siblings.retain(|&c| c != child);
    self.mark_needs_layout(parent);
  }

  /// Marks a box (and its ancestor chain) as needing layout
  pub fn mark_needs_layout(&mut self, id: BoxId) {
    let mut current = Some(id);
    while let Some(box_id) = current {
      let node = self.node_mut(box_id);
      if node.needs_layout {
        break;
      }
      node.needs_layout = true;
      current = node.parent;
    }
  }

  /// Marks only the box itself as needing layout
  pub fn mark_self_needs_layout(&mut self, id: BoxId) {
    self.node_mut(id).needs_layout = true;
  }

  /// Marks every child for layout (used when paint-order semantics change)
  pub fn mark_children_need_layout(&mut self, id: BoxId) {
    let children = self.node(id).children.clone();
    for child in children {
      self.mark_self_needs_layout(child);
    }
  }

  /// Marks a box dead and recursively its subtree
  ///
  /// The caller is responsible for having run teardown (layer destruction,
  /// widget detachment) first; this only flips liveness.
  pub fn destroy_subtree(&mut self, id: BoxId) {
    if let Some(parent) = self.node(id).parent {
      let siblings = &mut self.node_mut(parent).children;
      siblings.retain(|&c| c != id);
    }
    let mut stack = vec![id];
    while let Some(box_id) = stack.pop() {
      let node = &mut self.nodes[box_id.index()];
      node.live = false;
      stack.extend(node.children.drain(..));
    }
  }

  /// Walks the ancestor chain starting at `id`'s parent
  pub fn ancestors(&self, id: BoxId) -> impl Iterator<Item = BoxId> + '_ {
    let mut current = self.node(id).parent;
    std::iter::from_fn(move || {
      let next = current?;
      current = self.node(next).parent;
      Some(next)
    })
  }

  /// Returns the nearest ancestor that establishes a containing block
  ///
  /// For out-of-flow fixed boxes this is the root; for everything this
  /// engine models otherwise, the parent.
  pub fn containing_block(&self, id: BoxId) -> Option<BoxId> {
    let node = self.node(id);
    if node.style.position == crate::style::Position::Fixed {
      return self.ancestors(id).last().or(node.parent);
    }
    node.parent
  }

  /// Number of slots ever allocated (live and dead)
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  /// True when no boxes have been created
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}
