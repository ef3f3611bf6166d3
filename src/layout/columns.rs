//! Column bookkeeping and balanced-height calculation
//!
//! A multicol container distributes its flow thread's content into columns.
//! When the column height is not fixed by the container, it has to be
//! *balanced*: guessed from the content, then stretched over repeated layout
//! passes until everything fits in the used number of columns.
//!
//! The balancer reasons about *content runs*: the spans of flow-thread
//! content between forced breaks. The flow thread always reports a forced
//! break at the end of its content, so there is at least one run per pass.
//! Initial balancing pretends to insert implicit breaks into whichever run
//! currently has the tallest columns until the total break count reaches the
//! used column count; the tallest run then dictates the starting height.
//! Later passes stretch the height by the smallest space shortage recorded
//! while content failed to fit.

/// A span of flow-thread content ending at a forced break
///
/// During initial balancing a run may be assigned additional *assumed*
/// implicit breaks, which subdivide it evenly for height estimation only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRun {
  break_offset: f32,
  assumed_implicit_breaks: u32,
}

impl ContentRun {
  fn new(break_offset: f32) -> Self {
    Self {
      break_offset,
      assumed_implicit_breaks: 0,
    }
  }

  /// Offset of the forced break terminating this run
  pub fn break_offset(&self) -> f32 {
    self.break_offset
  }

  /// Column height this run would need, given where the previous run ended
  ///
  /// Assumed implicit breaks subdivide the run into equal parts.
  fn column_height(&self, previous_break_offset: f32) -> f32 {
    let length = self.break_offset - previous_break_offset;
    length / (self.assumed_implicit_breaks + 1) as f32
  }
}

/// Per-fragmentation-context column counters and balancing state
///
/// Owned by a multicol container box; content laid out inside the columns
/// reads a by-value snapshot (`ColumnContext` in `layout::state`) and writes
/// back only through the owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
  /// Used `column-count` for this pass
  used_column_count: u32,
  /// Used `column-width` for this pass
  column_width: f32,
  /// Current column height; 0 means "not yet balanced"
  column_height: f32,
  /// Ceiling imposed by a definite container height, if any
  max_column_height: f32,
  /// Whether the height must be balanced (container height is auto)
  requires_balancing: bool,
  /// Smallest space shortage recorded during the current pass
  min_space_shortage: f32,
  /// Floor for the balanced height (tallest unbreakable piece seen)
  minimum_column_height: f32,
  content_runs: Vec<ContentRun>,
}

impl Default for ColumnInfo {
  fn default() -> Self {
    Self {
      used_column_count: 1,
      column_width: 0.0,
      column_height: 0.0,
      max_column_height: f32::INFINITY,
      requires_balancing: true,
      min_space_shortage: f32::INFINITY,
      minimum_column_height: 0.0,
      content_runs: Vec::new(),
    }
  }
}

impl ColumnInfo {
  /// Used column count for the current pass
  pub fn column_count(&self) -> u32 {
    self.used_column_count
  }

  /// Used column width for the current pass
  pub fn column_width(&self) -> f32 {
    self.column_width
  }

  /// Current (possibly unbalanced) column height; 0 = not yet balanced
  pub fn column_height(&self) -> f32 {
    self.column_height
  }

  /// True when the container's height is auto and balancing applies
  pub fn requires_balancing(&self) -> bool {
    self.requires_balancing
  }

  /// Number of forced breaks recorded this pass
  pub fn forced_break_count(&self) -> usize {
    self.content_runs.len()
  }

  /// Installs the used count/width computed for this layout pass
  pub fn set_column_count_and_width(&mut self, count: u32, width: f32) {
    debug_assert!(count >= 1);
    self.used_column_count = count;
    self.column_width = width;
  }

  /// Configures whether balancing applies and any imposed height ceiling
  ///
  /// With balancing off the column height is simply the ceiling (the
  /// container's definite content height).
  pub fn set_height_policy(&mut self, requires_balancing: bool, max_height: Option<f32>) {
    self.requires_balancing = requires_balancing;
    self.max_column_height = max_height.unwrap_or(f32::INFINITY);
    if !requires_balancing {
      // Avoid a zero height; that would imply infinitely many columns.
      self.column_height = self.max_column_height.max(1.0);
    }
  }

  /// Resets per-layout balancing state before a container's first pass
  ///
  /// Content runs, the shortage, the unbreakable-content floor, and the
  /// balanced height all describe one layout of one set of content; a new
  /// layout starts from scratch. Without this, stale runs from the previous
  /// layout would swallow the new end-of-content break (the monotonicity
  /// check compares against the old last run) and keep the old height.
  pub fn prepare_for_layout(&mut self) {
    self.clear_forced_breaks();
    self.min_space_shortage = f32::INFINITY;
    self.minimum_column_height = 0.0;
    self.column_height = 0.0;
  }

  /// Raises the floor below which balancing will not shrink the height
  pub fn record_minimum_column_height(&mut self, height: f32) {
    if height > self.minimum_column_height {
      self.minimum_column_height = height;
    }
  }

  /// Records a forced break at `offset` from the start of the flow thread
  ///
  /// Non-monotonic offsets are ignored, and runs stop accumulating once the
  /// used column count is reached: whatever lands in the overflow area must
  /// not affect balancing.
  pub fn add_forced_break(&mut self, offset: f32) {
    if !self.requires_balancing {
      return;
    }
    if let Some(last) = self.content_runs.last() {
      if offset <= last.break_offset() {
        return;
      }
    }
    if self.content_runs.len() < self.used_column_count as usize {
      self.content_runs.push(ContentRun::new(offset));
    }
  }

  /// Records that a piece of content fell short of fitting by `shortage`
  ///
  /// The minimum recorded shortage is the stretch amount for the next pass;
  /// a non-positive shortage would make no progress and is a caller bug.
  pub fn record_space_shortage(&mut self, shortage: f32) {
    debug_assert!(shortage > 0.0, "space shortage must be positive");
    if shortage < self.min_space_shortage {
      self.min_space_shortage = shortage;
    }
  }

  /// Clears per-pass break bookkeeping
  pub fn clear_forced_breaks(&mut self) {
    self.content_runs.clear();
  }

  /// Number of columns the current height actually produces for `content_height`
  pub fn actual_column_count(&self, content_height: f32) -> u32 {
    if self.column_height <= 0.0 || content_height <= 0.0 {
      return 1;
    }
    (content_height / self.column_height).ceil().max(1.0) as u32
  }

  fn find_run_with_tallest_columns(&self) -> usize {
    let mut index_with_largest_height = 0;
    let mut largest_height = 0.0f32;
    let mut previous_offset = 0.0f32;
    for (i, run) in self.content_runs.iter().enumerate() {
      let height = run.column_height(previous_offset);
      if height > largest_height {
        largest_height = height;
        index_with_largest_height = i;
      }
      previous_offset = run.break_offset();
    }
    index_with_largest_height
  }

  /// Distributes implicit breaks across runs until the break count reaches
  /// the used column count
  ///
  /// Each round gives the run with the currently tallest columns one more
  /// assumed break, shrinking its estimated column height.
  fn distribute_implicit_breaks(&mut self) {
    debug_assert!(
      self.content_runs.iter().all(|r| r.assumed_implicit_breaks == 0),
      "implicit breaks already assumed"
    );
    // The flow thread reports a forced break at end of content, so there is
    // always at least one run.
    debug_assert!(!self.content_runs.is_empty());

    let mut break_count = self.content_runs.len() as u32;
    while break_count < self.used_column_count {
      let index = self.find_run_with_tallest_columns();
      self.content_runs[index].assumed_implicit_breaks += 1;
      break_count += 1;
    }
  }

  fn calculate_balanced_height(&self, initial: bool, content_height: f32) -> f32 {
    if initial {
      // Start with the lowest imaginable column height.
      let index = self.find_run_with_tallest_columns();
      let start_offset = if index > 0 {
        self.content_runs[index - 1].break_offset()
      } else {
        0.0
      };
      return self.content_runs[index]
        .column_height(start_offset)
        .max(self.minimum_column_height);
    }

    if self.actual_column_count(content_height) <= self.used_column_count {
      // Content fits without overflowing columns at the current height.
      return self.column_height;
    }

    let breaks = self.forced_break_count();
    if breaks > 1 && breaks >= self.used_column_count as usize {
      // Too many forced breaks to allow any implicit ones; the initial pass
      // already chose the best height available.
      return self.column_height;
    }

    if self.min_space_shortage == f32::INFINITY {
      // No shortage was recorded even though columns overflow. Stretching
      // blindly would loop, so keep the current height.
      return self.column_height;
    }

    debug_assert!(self.min_space_shortage > 0.0);
    self.column_height + self.min_space_shortage
  }

  fn set_and_constrain_column_height(&mut self, new_height: f32) {
    self.column_height = new_height.min(self.max_column_height).max(1.0);
  }

  /// Recalculates the balanced column height after a layout pass
  ///
  /// Returns true when the height changed and the container needs another
  /// pass. In that case per-pass bookkeeping (shortage, breaks) is reset.
  pub fn recalculate_balanced_height(&mut self, initial: bool, content_height: f32) -> bool {
    debug_assert!(self.requires_balancing);

    let old_column_height = self.column_height;
    if initial {
      self.distribute_implicit_breaks();
    }
    let new_height = self.calculate_balanced_height(initial, content_height);
    self.set_and_constrain_column_height(new_height);

    if self.column_height == old_column_height {
      return false;
    }

    self.min_space_shortage = f32::INFINITY;
    self.clear_forced_breaks();
    true
  }
}
