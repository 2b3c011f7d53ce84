//! High-water-mark occupancy intervals used to prune view scans.
//!
//! Each component column tracks the inclusive interval of slots that have
//! ever held that component. The interval only expands: removal leaves it
//! untouched, so it is an upper bound on occupancy, not an exact set. Views
//! intersect the intervals of every requested type to bound their scan, which
//! skips the empty head and tail of the slot space without any per-slot work.

/// Per-column running interval of slots that have ever held the component.
#[derive(Debug, Clone, Copy)]
struct ComponentRange {
    /// Whether the component has ever been added anywhere.
    present: bool,
    /// Lowest slot that ever held the component (inclusive).
    first_slot: usize,
    /// Highest slot that ever held the component (inclusive).
    last_slot: usize,
}

impl ComponentRange {
    const EMPTY: ComponentRange = ComponentRange {
        present: false,
        first_slot: usize::MAX,
        last_slot: 0,
    };
}

/// One [`ComponentRange`] per declared component column.
#[derive(Debug)]
pub struct RangeTracker {
    ranges: Vec<ComponentRange>,
}

impl RangeTracker {
    /// Create a tracker for `columns` component types, all initially absent.
    pub fn new(columns: usize) -> Self {
        Self {
            ranges: vec![ComponentRange::EMPTY; columns],
        }
    }

    /// Expand the column's interval to include `slot`. The first recording
    /// initializes both bounds to `slot`.
    pub fn record(&mut self, column: usize, slot: usize) {
        let range = &mut self.ranges[column];
        if !range.present {
            range.present = true;
            range.first_slot = slot;
            range.last_slot = slot;
        } else {
            range.first_slot = range.first_slot.min(slot);
            range.last_slot = range.last_slot.max(slot);
        }
    }

    /// The column's inclusive interval, or `None` if the component was never
    /// added anywhere.
    pub fn get(&self, column: usize) -> Option<(usize, usize)> {
        let range = self.ranges[column];
        range.present.then_some((range.first_slot, range.last_slot))
    }

    /// Intersect the intervals of several columns: the max of the first slots
    /// and the min of the last slots. Returns `None` when any column was
    /// never recorded or when the intersection is empty; either way no slot
    /// can hold all of the requested components.
    pub fn combine(&self, columns: &[usize]) -> Option<(usize, usize)> {
        let mut first = 0usize;
        let mut last = usize::MAX;
        for &column in columns {
            let (f, l) = self.get(column)?;
            first = first.max(f);
            last = last.min(l);
        }
        (first <= last).then_some((first, last))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
