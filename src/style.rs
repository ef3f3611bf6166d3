//! Computed style inputs consumed by the layout engine
//!
//! Style resolution happens upstream; this module only models the slice of a
//! computed style that geometry propagation, column balancing, layer lifecycle
//! and widget sync actually read. Lengths are pre-resolved to CSS pixels.
//!
//! The diff classification in [`ComputedStyle::diff`] drives the layer
//! transaction in the `layer` module: it decides whether a style swap needs a
//! repaint, a layer-level repaint, or a full relayout.

use crate::geometry::{EdgeOffsets, Point};

/// CSS positioning scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
  /// Normal flow
  #[default]
  Static,
  /// Normal flow, then offset; establishes a layer
  Relative,
  /// Out of flow, positioned against the nearest positioned ancestor
  Absolute,
  /// Out of flow, positioned against the viewport
  Fixed,
  /// Normal flow with scroll-linked offsetting
  Sticky,
}

impl Position {
  /// True for any scheme other than `static`
  pub fn is_positioned(self) -> bool {
    self != Position::Static
  }

  /// True when the box stays in normal flow but may be offset
  pub fn is_in_flow_positioned(self) -> bool {
    matches!(self, Position::Relative | Position::Sticky)
  }

  /// True when the box is removed from normal flow
  pub fn is_out_of_flow(self) -> bool {
    matches!(self, Position::Absolute | Position::Fixed)
  }
}

/// CSS float
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Float {
  #[default]
  None,
  Left,
  Right,
}

/// Overflow behavior on the box's own edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
  #[default]
  Visible,
  /// Content is clipped to the padding box
  Hidden,
  /// Clipped and scrollable
  Scroll,
}

/// Visibility of painted content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
  #[default]
  Visible,
  Hidden,
}

/// Forced/allowed break behavior between sibling boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakBetween {
  #[default]
  Auto,
  /// Force a column break at this edge
  Column,
  Avoid,
}

impl BreakBetween {
  /// True when this value forces a fragmentainer break
  pub fn is_forced(self) -> bool {
    self == BreakBetween::Column
  }
}

/// Multi-column properties
///
/// `None` means `auto` for both count and width. The style layer guarantees
/// that a box reporting itself as a multicol container has at least one of the
/// two set; the count/width formulas in `layout::multicol` rely on that.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnStyle {
  /// `column-count`, `None` = auto
  pub count: Option<u32>,
  /// `column-width` in px, `None` = auto
  pub width: Option<f32>,
  /// `column-gap` in px
  pub gap: f32,
}

impl ColumnStyle {
  /// True when either property requests a multi-column layout
  pub fn is_multicol(&self) -> bool {
    self.count.is_some() || self.width.is_some()
  }
}

/// Classification of the difference between two computed styles
///
/// Ordered from cheapest to most expensive reaction; `max` of two
/// classifications is the combined one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StyleDifference {
  /// No observable change
  Equal,
  /// Repaint the box, geometry unaffected
  RepaintOnly,
  /// Repaint and notify the box's layer (opacity/filter-level change)
  RepaintLayer,
  /// Geometry may have changed; relayout required
  Layout,
}

/// The slice of a computed style the layout engine consumes
///
/// Produced by the upstream style resolver. All lengths are in CSS pixels,
/// already resolved against their percentage bases.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputedStyle {
  /// Positioning scheme
  pub position: Position,
  /// Float placement
  pub float: Float,
  /// Overflow on both axes
  pub overflow: Overflow,
  /// Current scroll position of this box's content, if scrollable
  pub scroll_offset: Point,
  /// Offset applied to in-flow positioned boxes (left/top resolution)
  pub relative_offset: Point,
  /// Visibility of painted content (widgets show/hide on this)
  pub visibility: Visibility,
  /// Whether a transform other than identity applies
  pub has_transform: bool,
  /// Opacity in [0, 1]
  pub opacity: f32,
  /// Whether any filter applies
  pub has_filter: bool,
  /// Whether a box reflection applies
  pub has_reflection: bool,
  /// Used border-box width, when definite
  pub width: Option<f32>,
  /// Used border-box height, when definite
  pub height: Option<f32>,
  /// Border widths
  pub border: EdgeOffsets,
  /// Padding widths
  pub padding: EdgeOffsets,
  /// Multi-column properties
  pub columns: ColumnStyle,
  /// Break behavior before this box
  pub break_before: BreakBetween,
  /// Break behavior after this box
  pub break_after: BreakBetween,
  /// The box must not be split across fragmentainers
  pub unsplittable: bool,
  /// `shape-inside` exclusion area, relative to the border box
  pub shape_inside: Option<crate::geometry::Rect>,
}

impl ComputedStyle {
  /// A default style with opacity restored to its CSS initial value
  pub fn initial() -> Self {
    Self {
      opacity: 1.0,
      ..Self::default()
    }
  }

  /// True when content overflowing this box is clipped
  pub fn has_overflow_clip(&self) -> bool {
    !matches!(self.overflow, Overflow::Visible)
  }

  /// True when this box's position is defined against the viewport
  pub fn is_viewport_constrained(&self) -> bool {
    self.position == Position::Fixed
  }

  /// True when the style itself demands a stacking/compositing layer
  ///
  /// Positioning, transforms, non-unit opacity, filters, and reflections all
  /// force one. Root-ness forces one too, but that is a tree property and is
  /// handled by the caller.
  pub fn requires_layer(&self) -> bool {
    self.position.is_positioned()
      || self.has_transform
      || self.opacity < 1.0
      || self.has_filter
      || self.has_reflection
  }

  /// Combined border+padding edges (the content-box inset)
  pub fn border_and_padding(&self) -> EdgeOffsets {
    EdgeOffsets::new(
      self.border.top + self.padding.top,
      self.border.right + self.padding.right,
      self.border.bottom + self.padding.bottom,
      self.border.left + self.padding.left,
    )
  }

  /// Classifies what reacting to a change from `self` to `new` requires
  ///
  /// Geometry-affecting properties dominate; layer-level properties come
  /// next; visibility alone is a plain repaint.
  pub fn diff(&self, new: &ComputedStyle) -> StyleDifference {
    if self == new {
      return StyleDifference::Equal;
    }

    let layout_changed = self.position != new.position
      || self.float != new.float
      || self.width != new.width
      || self.height != new.height
      || self.border != new.border
      || self.padding != new.padding
      || self.overflow != new.overflow
      || self.scroll_offset != new.scroll_offset
      || self.relative_offset != new.relative_offset
      || self.columns != new.columns
      || self.break_before != new.break_before
      || self.break_after != new.break_after
      || self.unsplittable != new.unsplittable
      || self.shape_inside != new.shape_inside
      || self.has_transform != new.has_transform;
    if layout_changed {
      return StyleDifference::Layout;
    }

    let layer_changed = self.opacity != new.opacity
      || self.has_filter != new.has_filter
      || self.has_reflection != new.has_reflection;
    if layer_changed {
      return StyleDifference::RepaintLayer;
    }

    StyleDifference::RepaintOnly
  }
}
