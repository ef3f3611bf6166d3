//! pageflow: layout-state propagation and multi-column fragmentation
//!
//! A small layout core modeling the part of a rendering engine that sits
//! between style resolution and painting:
//!
//! - per-box layout state (paint offsets, clips, pagination context)
//!   propagated down the tree as values on an explicit stack;
//! - multi-column containers with an internal flow thread and an iterative
//!   column-balancing loop with a hard pass bound;
//! - stacking-layer lifecycle driven transactionally by style changes;
//! - widget boxes embedding foreign views, with batched (deferred)
//!   reparenting of those views.
//!
//! The box tree lives in an arena ([`tree::BoxArena`]) addressed by stable
//! ids, and everything the engine would push out to a real windowing system
//! or compositor goes through [`view::ViewHost`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pageflow::geometry::Size;
//! use pageflow::layout::{LayoutConfig, LayoutEngine};
//! use pageflow::style::ComputedStyle;
//! use pageflow::tree::{BoxArena, BoxKind};
//! use pageflow::view::ViewHost;
//!
//! let mut arena = BoxArena::new();
//! let root = arena.create_box(Arc::new(ComputedStyle::initial()), BoxKind::Block);
//! let child = arena.create_box(
//!   Arc::new(ComputedStyle {
//!     height: Some(120.0),
//!     ..ComputedStyle::initial()
//!   }),
//!   BoxKind::Block,
//! );
//! arena.append_child(root, child);
//!
//! let engine = LayoutEngine::new(LayoutConfig::new(Size::new(800.0, 600.0)));
//! let mut host = ViewHost::new();
//! let result = engine.layout(&mut arena, root, &mut host).unwrap();
//! assert_eq!(result.root_size.height, 120.0);
//! ```

pub mod error;
pub mod geometry;
pub mod layer;
pub mod layout;
pub mod style;
pub mod tree;
pub mod view;
pub mod widget;

pub use error::{Error, LayoutError, Result};
pub use layout::{LayoutConfig, LayoutEngine, LayoutResult};
pub use tree::{BoxArena, BoxId, BoxKind};
pub use view::{ViewHost, ViewId};
