//! Stacking/compositing layer lifecycle
//!
//! A box owns a layer when its style demands one (positioning, transform,
//! non-unit opacity, filter, reflection). Style swaps run as a two-phase
//! transaction: [`style_will_change`] inspects the old state and issues any
//! repaints that must happen against the *old* style/geometry, returning an
//! explicit [`StyleTransaction`] context; after the new style is installed,
//! [`style_did_change`] reconciles layer existence, attachment, and
//! registration with the host. Threading the context through as a value
//! (instead of stashing it in a global, as older engines did) keeps the
//! transaction re-entrant and safe by construction.
//!
//! Layers form their own sparse tree over the box tree: each layer tracks
//! its parent layer (the nearest layered ancestor at creation time) and the
//! boxes of its child layers. Destroying a layer always detaches it first;
//! an attached layer is never dropped.

use std::sync::Arc;

use crate::geometry::Point;
use crate::style::{ComputedStyle, Float, StyleDifference};
use crate::tree::{BoxArena, BoxId};
use crate::view::ViewHost;

/// A stacking/compositing layer owned by a box
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
  /// Box owning the parent layer, when attached
  parent: Option<BoxId>,
  /// Whether the layer currently sits in a parent layer's child list
  attached: bool,
  /// Boxes owning this layer's child layers
  children: Vec<BoxId>,
  /// Whether the layer paints itself (vs. being painted by its parent)
  self_painting: bool,
  /// The layer carries a transform
  transformed: bool,
  /// The layer carries a reflection
  reflected: bool,
  /// Cached clip rects are valid
  clip_cache_valid: bool,
  /// Absolute position, synced from the box's border box
  position: Point,
}

impl Layer {
  /// Creates a detached layer
  pub fn new() -> Self {
    Self {
      parent: None,
      attached: false,
      children: Vec::new(),
      self_painting: false,
      transformed: false,
      reflected: false,
      clip_cache_valid: false,
      position: Point::ZERO,
    }
  }

  /// Whether the layer paints its own content
  pub fn is_self_painting(&self) -> bool {
    self.self_painting
  }

  /// Whether the layer is attached to a parent layer
  pub fn is_attached(&self) -> bool {
    self.attached
  }

  /// Box owning the parent layer, when attached
  pub fn parent(&self) -> Option<BoxId> {
    self.parent
  }

  /// Boxes owning this layer's child layers
  pub fn children(&self) -> &[BoxId] {
    &self.children
  }

  /// Absolute position of the layer
  pub fn position(&self) -> Point {
    self.position
  }

  /// Drops cached clip rects; they recompute lazily on next use
  pub fn invalidate_clip_cache(&mut self) {
    self.clip_cache_valid = false;
  }
}

impl Default for Layer {
  fn default() -> Self {
    Self::new()
  }
}

/// Whether a layer paints itself rather than through its parent
///
/// In-flow relative boxes keep normal-flow paint order; everything else
/// that owns a layer paints it directly. Flipping this bit changes paint
/// order semantics for children, which is why a flip marks them for layout.
fn is_self_painting(style: &ComputedStyle) -> bool {
  style.position.is_out_of_flow()
    || style.has_transform
    || style.opacity < 1.0
    || style.has_filter
    || style.has_reflection
}

/// Context carried from [`style_will_change`] to [`style_did_change`]
#[derive(Debug, Clone)]
pub struct StyleTransaction {
  old_style: Arc<ComputedStyle>,
  diff: StyleDifference,
  was_floating: bool,
  had_transform: bool,
}

impl StyleTransaction {
  /// The classification computed for this transaction
  pub fn diff(&self) -> StyleDifference {
    self.diff
  }

  /// Whether the box floated before the swap
  pub fn was_floating(&self) -> bool {
    self.was_floating
  }
}

/// Controls layer creation during a style transaction
///
/// Some subtrees (hidden foreign-content containers, for instance) suspend
/// layer creation; their boxes keep "needs a layer" latent until allowed.
#[derive(Debug, Clone, Copy)]
pub struct LayerPolicy {
  /// Whether a newly-required layer may be created right now
  pub creation_allowed: bool,
}

impl Default for LayerPolicy {
  fn default() -> Self {
    Self {
      creation_allowed: true,
    }
  }
}

/// First half of a style swap: react against the old style
///
/// Issues the repaints that only make sense while the old style/geometry is
/// still in effect:
/// - a repaint-class change on a layered box repaints now, so content the
///   new style removes (an outline, say) still gets erased;
/// - a layout-class change either invalidates the layer's clip caches (when
///   only clipping changed) or repaints the box and its descendants;
/// - a box about to *gain* a layer repaints its old geometry now — the layer
///   doesn't exist yet to do it later.
pub fn style_will_change(
  arena: &mut BoxArena,
  id: BoxId,
  host: &mut ViewHost,
  new_style: &ComputedStyle,
) -> StyleTransaction {
  let old_style = arena.node(id).style.clone();
  let diff = old_style.diff(new_style);
  let transaction = StyleTransaction {
    was_floating: old_style.float != Float::None,
    had_transform: old_style.has_transform,
    old_style: old_style.clone(),
    diff,
  };

  match diff {
    StyleDifference::Equal => {}
    StyleDifference::RepaintOnly | StyleDifference::RepaintLayer => {
      if arena.node(id).has_layer() {
        let rect = arena.node(id).border_box;
        host.invalidate_rect(id, rect);
      }
    }
    StyleDifference::Layout => {
      if arena.node(id).has_layer() {
        let clip_only = clip_changed(&old_style, new_style) && !geometry_changed(&old_style, new_style);
        if clip_only {
          if let Some(layer) = arena.node_mut(id).layer.as_mut() {
            layer.invalidate_clip_cache();
          }
        } else {
          invalidate_subtree(arena, id, host);
        }
      }
    }
  }

  if !arena.node(id).has_layer() && will_gain_paint_layer(&old_style, new_style) {
    // The layer doesn't exist yet to repaint the old geometry for us.
    let rect = arena.node(id).border_box;
    host.invalidate_rect(id, rect);
  }

  transaction
}

fn clip_changed(old: &ComputedStyle, new: &ComputedStyle) -> bool {
  old.overflow != new.overflow || old.scroll_offset != new.scroll_offset
}

fn geometry_changed(old: &ComputedStyle, new: &ComputedStyle) -> bool {
  old.width != new.width
    || old.height != new.height
    || old.border != new.border
    || old.padding != new.padding
    || old.position != new.position
    || old.relative_offset != new.relative_offset
}

fn will_gain_paint_layer(old: &ComputedStyle, new: &ComputedStyle) -> bool {
  !old.requires_layer()
    && (new.has_transform || new.opacity < 1.0 || new.has_filter || new.has_reflection)
}

fn invalidate_subtree(arena: &BoxArena, id: BoxId, host: &mut ViewHost) {
  let mut stack = vec![id];
  while let Some(box_id) = stack.pop() {
    let node = arena.node(box_id);
    host.invalidate_rect(box_id, node.border_box);
    stack.extend(node.children.iter().copied());
  }
}

/// Second half of a style swap: reconcile against the new style
///
/// The caller must have installed `new_style` on the box between the two
/// halves (or use [`apply_style_change`], which does). Creates, destroys, or
/// updates the layer per the new requirement, and keeps the host's
/// viewport-constrained registry in sync.
pub fn style_did_change(
  arena: &mut BoxArena,
  id: BoxId,
  host: &mut ViewHost,
  policy: LayerPolicy,
  transaction: StyleTransaction,
) {
  let new_style = arena.node(id).style.clone();
  debug_assert!(
    new_style.as_ref() != transaction.old_style.as_ref()
      || transaction.diff == StyleDifference::Equal,
    "new style must be installed before style_did_change"
  );

  let needs_layer = new_style.requires_layer();
  let has_layer = arena.node(id).has_layer();

  if needs_layer && !has_layer {
    if policy.creation_allowed {
      create_layer(arena, id);
      let node = arena.node(id);
      if !node.needs_layout && node.parent.is_some() {
        // Single-layer fast path: repaint and position just this layer
        // instead of running subtree-wide position update machinery.
        let rect = node.border_box;
        host.invalidate_rect(id, rect);
        if let Some(layer) = arena.node_mut(id).layer.as_mut() {
          layer.position = rect.origin;
        }
      }
    }
  } else if !needs_layer && has_layer {
    if let Some(layer) = arena.node_mut(id).layer.as_mut() {
      layer.transformed = false;
      layer.reflected = false;
    }
    destroy_layer(arena, id);
    if new_style.float != Float::None {
      // The float's placement is the containing block's concern.
      if let Some(parent) = arena.node(id).parent {
        arena.mark_needs_layout(parent);
      }
    }
    if transaction.had_transform {
      // Transforms affect metrics beyond paint; force a relayout.
      arena.mark_needs_layout(id);
    }
  } else if needs_layer && has_layer {
    let self_painting = is_self_painting(&new_style);
    let layer = arena.node_mut(id).layer.as_mut().expect("checked has_layer");
    layer.transformed = new_style.has_transform;
    layer.reflected = new_style.has_reflection;
    let flipped = layer.self_painting != self_painting;
    layer.self_painting = self_painting;
    if transaction.diff >= StyleDifference::RepaintLayer {
      let rect = arena.node(id).border_box;
      host.invalidate_rect(id, rect);
    }
    if flipped {
      // Paint-order semantics for children changed.
      arena.mark_children_need_layout(id);
    }
  }

  let was_constrained = transaction.old_style.is_viewport_constrained();
  let is_constrained = new_style.is_viewport_constrained();
  if was_constrained != is_constrained {
    if is_constrained {
      host.add_viewport_constrained(id);
    } else {
      host.remove_viewport_constrained(id);
    }
  }
}

/// Runs a full style transaction: will-change, install, did-change
pub fn apply_style_change(
  arena: &mut BoxArena,
  id: BoxId,
  host: &mut ViewHost,
  policy: LayerPolicy,
  new_style: Arc<ComputedStyle>,
) -> StyleDifference {
  let transaction = style_will_change(arena, id, host, &new_style);
  if transaction.diff >= StyleDifference::Layout {
    arena.mark_needs_layout(id);
  }
  arena.node_mut(id).style = new_style;
  let diff = transaction.diff;
  style_did_change(arena, id, host, policy, transaction);
  diff
}

/// Creates the box's layer and attaches it under the nearest layered ancestor
fn create_layer(arena: &mut BoxArena, id: BoxId) {
  debug_assert!(!arena.node(id).has_layer());
  let parent_layer_box = arena.ancestors(id).find(|&a| arena.node(a).has_layer());

  let mut layer = Layer::new();
  layer.self_painting = is_self_painting(&arena.node(id).style);
  layer.transformed = arena.node(id).style.has_transform;
  layer.reflected = arena.node(id).style.has_reflection;
  layer.parent = parent_layer_box;
  layer.attached = parent_layer_box.is_some();
  arena.node_mut(id).layer = Some(layer);

  if let Some(parent) = parent_layer_box {
    let parent_layer = arena.node_mut(parent).layer.as_mut().expect("found by has_layer");
    parent_layer.children.push(id);
  }
}

/// Detaches and destroys the box's layer
///
/// Detachment from the parent layer's child list always precedes the drop;
/// destroying an attached layer is a structural bug.
pub fn destroy_layer(arena: &mut BoxArena, id: BoxId) {
  let Some(layer) = arena.node(id).layer.as_ref() else {
    return;
  };
  let parent = layer.parent;
  let orphaned_children = layer.children.clone();

  if let Some(parent) = parent {
    if let Some(parent_layer) = arena.node_mut(parent).layer.as_mut() {
      parent_layer.children.retain(|&c| c != id);
    }
  }
  if let Some(layer) = arena.node_mut(id).layer.as_mut() {
    layer.attached = false;
    layer.parent = None;
  }

  // Child layers re-home to this layer's parent (or become roots).
  for child in orphaned_children {
    if let Some(child_layer) = arena.node_mut(child).layer.as_mut() {
      child_layer.parent = parent;
      child_layer.attached = parent.is_some();
    }
    if let Some(parent) = parent {
      if let Some(parent_layer) = arena.node_mut(parent).layer.as_mut() {
        parent_layer.children.push(child);
      }
    }
  }

  let layer = arena.node_mut(id).layer.take().expect("checked above");
  debug_assert!(!layer.is_attached(), "destroying an attached layer");
}

/// Teardown hook for a box about to be removed from the tree
///
/// Destroys the layer and clears host registrations. Widget view teardown
/// is the `widget` module's job.
pub fn will_be_destroyed(arena: &mut BoxArena, id: BoxId, host: &mut ViewHost) {
  destroy_layer(arena, id);
  host.remove_viewport_constrained(id);
}
