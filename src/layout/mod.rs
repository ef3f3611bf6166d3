//! Layout: geometry propagation, fragmentation, and column balancing
//!
//! `state` carries per-box layout state down the tree as values on an
//! explicit stack. `columns` holds the balancing math for one multicol
//! container, `multicol` the container/flow-thread structure, and `engine`
//! the pass that drives them all and writes final geometry back to the arena.

pub mod columns;
pub mod engine;
pub mod multicol;
pub mod state;

pub use engine::{LayoutConfig, LayoutEngine, LayoutResult};
pub use state::{ColumnContext, LayoutStack, LayoutState, ShapeInsideInfo};
