//! Per-slot, per-component presence flags.
//!
//! A slot's column entry is only meaningful while its presence flag is set;
//! component removal just clears the flag and leaves the stored value in
//! place (cheap-remove). Flags for inactive slots are always cleared, both
//! when a slot is first activated and when its entity is removed, so a stale
//! handle can never observe leftover presence.

/// Row-major boolean matrix: one row per slot, one column per declared
/// component type. Rows grow in lockstep with the slot storage.
#[derive(Debug)]
pub struct PresenceMatrix {
    flags: Vec<bool>,
    width: usize,
}

impl PresenceMatrix {
    /// Create an empty matrix with `width` flags per row.
    pub fn new(width: usize) -> Self {
        Self {
            flags: Vec::new(),
            width,
        }
    }

    /// Number of rows (slots backed by storage).
    #[inline]
    pub fn rows(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.flags.len() / self.width
        }
    }

    /// Flags per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Append one all-false row.
    pub fn push_row(&mut self) {
        self.flags.resize(self.flags.len() + self.width, false);
    }

    /// Read the flag for `(slot, column)`.
    #[inline]
    pub fn get(&self, slot: usize, column: usize) -> bool {
        self.flags[slot * self.width + column]
    }

    /// Set the flag for `(slot, column)`.
    #[inline]
    pub fn set(&mut self, slot: usize, column: usize, value: bool) {
        self.flags[slot * self.width + column] = value;
    }

    /// Clear every flag in a slot's row.
    pub fn clear_row(&mut self, slot: usize) {
        let start = slot * self.width;
        self.flags[start..start + self.width].fill(false);
    }

    /// The full row of flags for a slot.
    #[inline]
    pub fn row(&self, slot: usize) -> &[bool] {
        let start = slot * self.width;
        &self.flags[start..start + self.width]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
