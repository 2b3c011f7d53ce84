//! Entity identifiers and slot allocation.
//!
//! An [`EntityId`] is a lightweight handle whose value equals the physical
//! slot index the entity occupies. The maximum representable index is reserved
//! as a null sentinel, so a default-constructed id is unbound and converts to
//! "invalid". Slot indices are reused after removal, which means a handle held
//! across a removal may later name a different entity occupying the same slot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::EcsError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Reserved sentinel value meaning "no entity".
const NULL_SLOT: usize = usize::MAX;

/// An opaque handle to an entity. Equal to the slot index it was created for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(usize);

impl EntityId {
    /// The unbound handle.
    pub const NULL: EntityId = EntityId(NULL_SLOT);

    /// Construct a handle for a slot index.
    #[inline]
    pub fn new(slot: usize) -> Self {
        Self(slot)
    }

    /// The slot index this handle names.
    #[inline]
    pub fn slot(self) -> usize {
        self.0
    }

    /// `true` unless this is the null sentinel.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 != NULL_SLOT
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "EntityId({})", self.0)
        } else {
            write!(f, "EntityId(null)")
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "null")
        }
    }
}

// ---------------------------------------------------------------------------
// SlotAllocator
// ---------------------------------------------------------------------------

/// Maps entity creation and removal onto physical slot indices.
///
/// Allocation is a first-fit linear scan over the compacted prefix
/// `[0, end_slot)`, so a freshly freed low slot is always reused before the
/// frontier grows. This is O(end_slot) worst case; churn-heavy workloads keep
/// the scan short in practice because holes cluster near the front. Releasing
/// the tail slot shrinks the frontier by one, so a dense run of trailing
/// removals compacts without a defragmentation pass.
#[derive(Debug)]
pub struct SlotAllocator {
    /// Whether each slot currently holds a live entity. Length is the number
    /// of slots ever backed by storage (may exceed `end_slot` after tail
    /// compaction).
    active: Vec<bool>,
    /// One past the highest slot in use.
    end_slot: usize,
    /// Count of currently active slots.
    live: usize,
    /// Hard slot limit for the bounded variant; `None` grows without bound.
    capacity: Option<usize>,
}

impl SlotAllocator {
    /// Create a growable allocator with no slot limit.
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            end_slot: 0,
            live: 0,
            capacity: None,
        }
    }

    /// Create an allocator that refuses to grow past `capacity` slots.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            active: Vec::new(),
            end_slot: 0,
            live: 0,
            capacity: Some(capacity),
        }
    }

    /// Find or create a free slot, mark it active, and return its index.
    ///
    /// Scans `[0, end_slot)` for the lowest inactive slot; if every slot in
    /// the prefix is live the frontier is extended instead.
    pub fn allocate(&mut self) -> Result<usize, EcsError> {
        let mut slot = 0;
        while slot < self.end_slot && self.active[slot] {
            slot += 1;
        }
        if slot == self.end_slot {
            if let Some(capacity) = self.capacity {
                if self.end_slot == capacity {
                    return Err(EcsError::CapacityExceeded { capacity });
                }
            }
            if slot == self.active.len() {
                self.active.push(false);
            }
            self.end_slot += 1;
        }
        self.active[slot] = true;
        self.live += 1;
        Ok(slot)
    }

    /// Mark an active slot inactive. If it was the tail of the frontier, the
    /// frontier shrinks by one so the slot is reused immediately by the next
    /// allocation.
    ///
    /// Callers validate activity before releasing; releasing an inactive slot
    /// is a contract violation.
    pub fn release(&mut self, slot: usize) {
        debug_assert!(slot < self.end_slot, "release of slot beyond frontier");
        debug_assert!(self.active[slot], "release of inactive slot");
        self.active[slot] = false;
        self.live -= 1;
        if slot + 1 == self.end_slot {
            self.end_slot -= 1;
        }
    }

    /// Whether `slot` is within the frontier and currently live.
    #[inline]
    pub fn is_active(&self, slot: usize) -> bool {
        slot < self.end_slot && self.active[slot]
    }

    /// One past the highest slot in use.
    #[inline]
    pub fn end_slot(&self) -> usize {
        self.end_slot
    }

    /// Number of currently active slots.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    /// The slot limit for the bounded variant, if any.
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of slots ever backed by storage.
    #[inline]
    pub fn backing_len(&self) -> usize {
        self.active.len()
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
