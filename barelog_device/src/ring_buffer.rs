//! Per-core local ring buffer.
//!
//! Fixed array in private memory, no allocation. `head` is the next slot to
//! write and `tail` the oldest unread slot; `head == tail` is ambiguous, so
//! the `full` and `empty` flags tell the two cases apart.
//!
//! Overflow policies are not applied here: the buffer only knows how to
//! store, evict and erase. [`crate::manager::DeviceMemManager`] decides what
//! to do when it is full.

use barelog::error::{BarelogError, BarelogResult};
use barelog::event::EventRecord;

/// Wrap a signed index difference into `[0, modulus)`.
#[inline]
pub const fn wrap(value: isize, modulus: usize) -> usize {
    value.rem_euclid(modulus as isize) as usize
}

/// Circular FIFO of `N` event records.
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    events: [EventRecord; N],
    head: usize,
    tail: usize,
    full: bool,
    empty: bool,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    /// Number of slots.
    pub const CAPACITY: usize = N;

    /// Empty buffer with every slot zeroed.
    pub const fn new() -> Self {
        const { assert!(N > 0, "ring buffer needs at least one slot") };
        Self {
            events: [EventRecord::ZERO; N],
            head: 0,
            tail: 0,
            full: false,
            empty: true,
        }
    }

    /// Events currently held: `N` if full, else `(head - tail) mod N`.
    #[inline]
    pub const fn len(&self) -> usize {
        if self.full {
            N
        } else {
            wrap(self.head as isize - self.tail as isize, N)
        }
    }

    /// `true` when nothing is buffered.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.empty
    }

    /// `true` when every slot holds an unread event.
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.full
    }

    /// Next slot to write.
    #[inline]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// Oldest unread slot.
    #[inline]
    pub const fn tail(&self) -> usize {
        self.tail
    }

    /// Store `event` at `head`, stamped with `core`.
    ///
    /// Overwrites the slot unconditionally; callers make room first when the
    /// buffer is full.
    pub fn push(&mut self, core: u32, mut event: EventRecord) {
        event.core = core;
        self.events[self.head] = event;
        self.head = wrap(self.head as isize + 1, N);
        self.empty = false;
        if self.head == self.tail {
            self.full = true;
        }
    }

    /// Forget the oldest event by moving `tail` one slot forward.
    ///
    /// The slot keeps its bytes until overwritten.
    pub fn evict_oldest(&mut self) {
        if self.empty {
            return;
        }
        self.tail = wrap(self.tail as isize + 1, N);
        self.full = false;
        if self.tail == self.head {
            self.empty = true;
        }
    }

    /// Erase up to `n` of the oldest events, returning how many were erased.
    ///
    /// Stops at the newest event and marks the buffer empty.
    ///
    /// # Errors
    /// `InconsistentParameter` if `check` is set and `n` is outside `[1, N]`.
    pub fn clear(&mut self, n: usize, check: bool) -> BarelogResult<usize> {
        if check && !(1..=N).contains(&n) {
            return Err(BarelogError::InconsistentParameter {
                what: "clear count outside [1, capacity]",
            });
        }
        if self.empty || n == 0 {
            return Ok(0);
        }

        let newest = wrap(self.head as isize - 1, N);
        let mut cleared = 0;
        let mut index = self.tail;
        while cleared < n.min(N) {
            self.events[index] = EventRecord::ZERO;
            cleared += 1;
            if index == newest {
                self.empty = true;
                break;
            }
            index = wrap(index as isize + 1, N);
        }
        self.tail = if self.empty { self.head } else { index };
        self.full = false;
        Ok(cleared)
    }

    /// Erase every buffered event.
    pub fn clear_all(&mut self) -> usize {
        match self.len() {
            0 => 0,
            n => self.clear(n, false).unwrap_or_default(),
        }
    }

    /// Zero every slot and rewind to an empty buffer at index 0.
    pub fn reset(&mut self) {
        self.events = [EventRecord::ZERO; N];
        self.head = 0;
        self.tail = 0;
        self.full = false;
        self.empty = true;
    }

    /// The `n` oldest events as two contiguous runs: from `tail` toward the
    /// end of the array, then the wrapped rest from index 0.
    ///
    /// `n` is clamped to the occupancy.
    pub fn oldest(&self, n: usize) -> (&[EventRecord], &[EventRecord]) {
        let n = n.min(self.len());
        let first = n.min(N - self.tail);
        (
            &self.events[self.tail..self.tail + first],
            &self.events[..n - first],
        )
    }

    /// Buffered events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        let (first, second) = self.oldest(self.len());
        first.iter().chain(second)
    }

    /// Raw slots in array order, including stale ones.
    pub fn slots(&self) -> &[EventRecord; N] {
        &self.events
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn event(i: u32) -> EventRecord {
        EventRecord::from_fmt(i, format_args!("E{i}"))
    }

    fn payloads<const N: usize>(buffer: &RingBuffer<N>) -> Vec<String> {
        buffer
            .iter()
            .map(|e| e.payload_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn wrap_handles_negative_differences() {
        assert_eq!(wrap(-1, 10), 9);
        assert_eq!(wrap(10, 10), 0);
        assert_eq!(wrap(-11, 10), 9);
        assert_eq!(wrap(3, 10), 3);
    }

    #[test]
    fn push_stamps_core_and_fills() {
        let mut buffer = RingBuffer::<3>::new();
        assert!(buffer.is_empty());
        let mut e = event(0);
        e.core = 99;
        buffer.push(4, e);
        assert_eq!(buffer.iter().next().unwrap().core, 4);

        buffer.push(4, event(1));
        assert!(!buffer.is_full());
        buffer.push(4, event(2));
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.head(), buffer.tail());
    }

    #[test]
    fn evict_then_push_keeps_newest() {
        let mut buffer = RingBuffer::<10>::new();
        for i in 0..12 {
            if buffer.is_full() {
                buffer.evict_oldest();
            }
            buffer.push(0, event(i));
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 10);
        let expected: Vec<String> = (2..12).map(|i| format!("E{i}")).collect();
        assert_eq!(payloads(&buffer), expected);
    }

    #[test]
    fn clear_stops_at_newest() {
        let mut buffer = RingBuffer::<5>::new();
        for i in 0..3 {
            buffer.push(0, event(i));
        }
        assert_eq!(buffer.clear(5, true).unwrap(), 3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.tail(), buffer.head());
        assert!(buffer.slots().iter().all(EventRecord::is_zero));
    }

    #[test]
    fn partial_clear_advances_tail() {
        let mut buffer = RingBuffer::<4>::new();
        for i in 0..4 {
            buffer.push(0, event(i));
        }
        assert_eq!(buffer.clear(3, true).unwrap(), 3);
        assert!(!buffer.is_full());
        assert!(!buffer.is_empty());
        assert_eq!(buffer.len(), 1);
        assert_eq!(payloads(&buffer), vec!["E3".to_string()]);
    }

    #[test]
    fn clear_count_is_checked() {
        let mut buffer = RingBuffer::<4>::new();
        buffer.push(0, event(0));
        assert!(buffer.clear(0, true).is_err());
        assert!(buffer.clear(5, true).is_err());
        assert_eq!(buffer.clear(0, false).unwrap(), 0);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn clear_on_empty_is_noop() {
        let mut buffer = RingBuffer::<4>::new();
        assert_eq!(buffer.clear(2, true).unwrap(), 0);
        assert_eq!(buffer.clear_all(), 0);
    }

    #[test]
    fn oldest_splits_at_wraparound() {
        let mut buffer = RingBuffer::<4>::new();
        for i in 0..6 {
            if buffer.is_full() {
                buffer.evict_oldest();
            }
            buffer.push(0, event(i));
        }
        // tail = 2: E2 E3 at [2..4], E4 E5 at [0..2]
        let (first, second) = buffer.oldest(4);
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0].payload(), b"E2");
        assert_eq!(second[1].payload(), b"E5");

        let (first, second) = buffer.oldest(1);
        assert_eq!((first.len(), second.len()), (1, 0));
    }

    #[test]
    fn reset_rewinds_to_zero() {
        let mut buffer = RingBuffer::<3>::new();
        for i in 0..5 {
            if buffer.is_full() {
                buffer.evict_oldest();
            }
            buffer.push(1, event(i));
        }
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!((buffer.head(), buffer.tail()), (0, 0));
        assert!(buffer.slots().iter().all(EventRecord::is_zero));
    }
}
