//! Write cursor into this core's slice of the shared segment.

use barelog::consts::EVENT_MAX_SIZE;
use barelog::mem_space::Address;

/// Cursor over one shared slice, counted in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedSliceCursor {
    base: Address,
    bytes: usize,
    cursor: usize,
}

impl SharedSliceCursor {
    /// Cursor at the start of the `bytes`-long slice at `base`.
    pub const fn new(base: Address, bytes: usize) -> Self {
        Self {
            base,
            bytes,
            cursor: 0,
        }
    }

    /// Address of the first byte of the slice.
    #[inline]
    pub const fn base(&self) -> Address {
        self.base
    }

    /// Length of the slice in bytes.
    #[inline]
    pub const fn byte_len(&self) -> usize {
        self.bytes
    }

    /// Events the slice holds.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.bytes / EVENT_MAX_SIZE
    }

    /// Index of the next event slot to write.
    #[inline]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Free event slots after the cursor.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Address of event slot `index`.
    #[inline]
    pub const fn slot_address(&self, index: usize) -> Address {
        self.base + index * EVENT_MAX_SIZE
    }

    /// Move the cursor forward by `n` slots, saturating at capacity.
    pub fn advance(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.capacity());
    }

    /// Rewind to the first slot.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}
