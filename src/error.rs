//! Error types for pageflow
//!
//! Inputs to this engine come from trusted upstream stages (style resolution,
//! box-tree construction), so most misuse is a programming error guarded by
//! debug assertions rather than a recoverable condition. The errors here cover
//! the few cases an embedder can meaningfully observe and react to.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use thiserror::Error;

use crate::tree::BoxId;

/// Result type alias for pageflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for pageflow
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
  /// Layout error
  #[error("Layout error: {0}")]
  Layout(#[from] LayoutError),
}

/// Errors surfaced by the layout pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
  /// A box id did not resolve to a live box in the arena
  #[error("Stale box id {0:?}")]
  StaleBox(BoxId),

  /// Layout was requested for a box kind the entry point does not accept
  ///
  /// Flow threads are laid out by their owning multicol container, never
  /// directly by the engine entry point.
  #[error("Box {0:?} cannot be a layout root")]
  InvalidLayoutRoot(BoxId),

  /// The viewport given to the engine has a non-finite or negative dimension
  #[error("Invalid viewport size: {width}×{height}")]
  InvalidViewport { width: f32, height: f32 },
}
