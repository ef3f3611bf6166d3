//! Core geometry types for layout
//!
//! All units are CSS pixels (1/96th of an inch, independent of device pixels).
//! The coordinate system has its origin at the top-left corner: positive X
//! extends right, positive Y extends down, matching CSS 2.1 Section 8.3.1.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

/// A 2D point or offset in CSS pixel space
///
/// Layout uses this both as an absolute coordinate and as a relative offset;
/// the arithmetic is the same either way.
///
/// # Examples
///
/// ```
/// use pageflow::geometry::Point;
///
/// let p = Point::new(10.0, 20.0) + Point::new(5.0, 3.0);
/// assert_eq!(p, Point::new(15.0, 23.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
  /// X coordinate (increases to the right)
  pub x: f32,
  /// Y coordinate (increases downward)
  pub y: f32,
}

impl Point {
  /// The origin (0, 0)
  pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

  /// Creates a new point at the given coordinates
  pub const fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }

  /// Translates this point by another point's coordinates
  pub fn translate(self, other: Point) -> Self {
    Self {
      x: self.x + other.x,
      y: self.y + other.y,
    }
  }
}

impl Add for Point {
  type Output = Point;

  fn add(self, rhs: Point) -> Point {
    self.translate(rhs)
  }
}

impl AddAssign for Point {
  fn add_assign(&mut self, rhs: Point) {
    self.x += rhs.x;
    self.y += rhs.y;
  }
}

impl Sub for Point {
  type Output = Point;

  fn sub(self, rhs: Point) -> Point {
    Point::new(self.x - rhs.x, self.y - rhs.y)
  }
}

impl Neg for Point {
  type Output = Point;

  fn neg(self) -> Point {
    Point::new(-self.x, -self.y)
  }
}

impl fmt::Display for Point {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// A 2D size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
  /// Width (horizontal extent)
  pub width: f32,
  /// Height (vertical extent)
  pub height: f32,
}

impl Size {
  /// A size with zero width and height
  pub const ZERO: Self = Self {
    width: 0.0,
    height: 0.0,
  };

  /// Creates a new size with the given dimensions
  pub const fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }

  /// Returns true if either dimension is zero or negative
  pub fn is_empty(self) -> bool {
    self.width <= 0.0 || self.height <= 0.0
  }
}

impl fmt::Display for Size {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}×{}", self.width, self.height)
  }
}

/// An axis-aligned rectangle in CSS pixel space
///
/// Defined by an origin point (top-left corner) and a size.
///
/// # Examples
///
/// ```
/// use pageflow::geometry::Rect;
///
/// let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
/// let b = Rect::from_xywh(5.0, 5.0, 10.0, 10.0);
/// assert_eq!(a.intersection(b), Rect::from_xywh(5.0, 5.0, 5.0, 5.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
  /// The top-left corner of the rectangle
  pub origin: Point,
  /// The size (width and height) of the rectangle
  pub size: Size,
}

impl Rect {
  /// A zero-sized rectangle at the origin
  pub const ZERO: Self = Self {
    origin: Point::ZERO,
    size: Size::ZERO,
  };

  /// Creates a new rectangle from an origin point and size
  pub const fn new(origin: Point, size: Size) -> Self {
    Self { origin, size }
  }

  /// Creates a rectangle from x, y, width, height components
  pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      origin: Point::new(x, y),
      size: Size::new(width, height),
    }
  }

  /// Returns the x coordinate of the left edge
  pub fn x(self) -> f32 {
    self.origin.x
  }

  /// Returns the y coordinate of the top edge
  pub fn y(self) -> f32 {
    self.origin.y
  }

  /// Returns the width
  pub fn width(self) -> f32 {
    self.size.width
  }

  /// Returns the height
  pub fn height(self) -> f32 {
    self.size.height
  }

  /// Returns the x coordinate of the right edge
  pub fn max_x(self) -> f32 {
    self.origin.x + self.size.width
  }

  /// Returns the y coordinate of the bottom edge
  pub fn max_y(self) -> f32 {
    self.origin.y + self.size.height
  }

  /// Returns true if the rectangle has no area
  pub fn is_empty(self) -> bool {
    self.size.is_empty()
  }

  /// Returns true if this rectangle fully contains another
  pub fn contains_rect(self, other: Rect) -> bool {
    other.x() >= self.x()
      && other.max_x() <= self.max_x()
      && other.y() >= self.y()
      && other.max_y() <= self.max_y()
  }

  /// Returns true if this rectangle intersects another
  ///
  /// Rectangles that merely touch at an edge or corner count as intersecting.
  pub fn intersects(self, other: Rect) -> bool {
    self.x() <= other.max_x()
      && self.max_x() >= other.x()
      && self.y() <= other.max_y()
      && self.max_y() >= other.y()
  }

  /// Computes the intersection of two rectangles
  ///
  /// Disjoint rectangles intersect to an empty rect clamped to zero size at
  /// the nearer boundary, which is what clip accumulation wants: a fully
  /// clipped-out subtree keeps a well-defined (empty) clip.
  pub fn intersection(self, other: Rect) -> Rect {
    let x = self.x().max(other.x());
    let y = self.y().max(other.y());
    let max_x = self.max_x().min(other.max_x());
    let max_y = self.max_y().min(other.max_y());
    Rect::from_xywh(x, y, (max_x - x).max(0.0), (max_y - y).max(0.0))
  }

  /// Computes the smallest rectangle containing both rectangles
  pub fn union(self, other: Rect) -> Rect {
    let x = self.x().min(other.x());
    let y = self.y().min(other.y());
    let max_x = self.max_x().max(other.max_x());
    let max_y = self.max_y().max(other.max_y());
    Rect::from_xywh(x, y, max_x - x, max_y - y)
  }

  /// Translates this rectangle by an offset
  pub fn translate(self, offset: Point) -> Rect {
    Rect {
      origin: self.origin.translate(offset),
      size: self.size,
    }
  }
}

impl fmt::Display for Rect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.size, self.origin)
  }
}

/// Edge offsets representing spacing on all four sides
///
/// Used for border and padding widths. Follows CSS box model convention:
/// top, right, bottom, left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeOffsets {
  /// Top edge offset
  pub top: f32,
  /// Right edge offset
  pub right: f32,
  /// Bottom edge offset
  pub bottom: f32,
  /// Left edge offset
  pub left: f32,
}

impl EdgeOffsets {
  /// Zero offsets on all sides
  pub const ZERO: Self = Self {
    top: 0.0,
    right: 0.0,
    bottom: 0.0,
    left: 0.0,
  };

  /// Creates edge offsets with the same value on all sides
  pub const fn all(value: f32) -> Self {
    Self {
      top: value,
      right: value,
      bottom: value,
      left: value,
    }
  }

  /// Creates edge offsets with individual values for each side
  pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
    Self {
      top,
      right,
      bottom,
      left,
    }
  }

  /// Returns the sum of left and right offsets
  pub fn horizontal(self) -> f32 {
    self.left + self.right
  }

  /// Returns the sum of top and bottom offsets
  pub fn vertical(self) -> f32 {
    self.top + self.bottom
  }

  /// Offset of the content origin from the border-box origin
  pub fn top_left(self) -> Point {
    Point::new(self.left, self.top)
  }
}
