//! Device writer of the diagnostic slot.
//!
//! The slot is written with a plain copy through the usable base address of
//! the platform, skipping the injected write primitive and the mutex, so a
//! broken write path can still be reported.

use barelog::consts::EVENT_MAX_SIZE;
use barelog::diagnostic;
use barelog::error::{BarelogError, STATUS_SUCCESS};
use barelog::event::EventRecord;
use barelog::mem_space::{Address, MemSpace};

/// Single-slot diagnostic channel of one core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugChannel {
    address: Address,
    core: u32,
}

impl DebugChannel {
    /// Channel for the slot `offset` bytes into `space`.
    ///
    /// `None` if the space is not directly addressable or the slot does not
    /// fit in it.
    pub fn new(space: &MemSpace, offset: usize, core: u32) -> Option<Self> {
        let slot = space.sub_space(offset, EVENT_MAX_SIZE).ok()?;
        Some(Self {
            address: slot.base()?,
            core,
        })
    }

    /// Usable address of the slot.
    #[inline]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Overwrite the slot with `record`.
    pub fn store(&self, record: &EventRecord) {
        let bytes = EventRecord::as_bytes(core::slice::from_ref(record));
        // SAFETY: the address comes from a mapped `MemSpace`, whose
        // constructor guarantees validity for its whole length, and the slot
        // was bounds-checked against it in `new`.
        unsafe {
            core::ptr::copy_nonoverlapping(bytes.as_ptr(), self.address as *mut u8, bytes.len())
        };
    }

    /// Record `error`, raised at `file:line`.
    pub fn report(&self, timestamp: u32, file: &str, line: u32, error: &BarelogError) {
        self.store(&diagnostic::error_record(
            timestamp, self.core, file, line, error,
        ));
    }

    /// Record a success entry carrying `message`.
    pub fn note(&self, timestamp: u32, file: &str, line: u32, message: &str) {
        self.store(&diagnostic::diagnostic_record(
            timestamp,
            self.core,
            file,
            line,
            STATUS_SUCCESS,
            message,
        ));
    }
}
