//! Host reader: pulls a core's slice back and rebuilds its event history.
//!
//! A slice is read whole and cut at the first record with an empty payload.
//! An event logged with an empty message therefore ends the stream early;
//! the on-wire format has no other end marker.

use crate::manager::HostMemManager;
use barelog::boundary::{MemoryMapper, SharedMemoryIo};
use barelog::config::SessionModes;
use barelog::diagnostic::Diagnostic;
use barelog::error::{BarelogError, BarelogResult};
use barelog::event::{EventRecord, events_to_strings};
use barelog::layout::RegionKind;
use barelog::sync::{SharedMutex, with_mutex};
use tracing::{debug, error};

impl<Io: SharedMemoryIo, M: MemoryMapper> HostMemManager<Io, M> {
    /// Events stored in the slice of `core`, oldest slot first.
    ///
    /// The slice is read under the core's mutex byte when the session has
    /// them.
    ///
    /// # Errors
    /// - `InconsistentParameter` if `core` is out of range
    /// - `UninitializedParameter` if the slice (or its mutex) is not mapped
    /// - `Generic` if the output cannot be allocated
    /// - `MutexTimeout` or `SharedMemoryRead` from the guarded read
    pub fn read_core(&mut self, core: u32) -> BarelogResult<Vec<EventRecord>> {
        if core >= self.layout.cores() {
            return Err(BarelogError::InconsistentParameter {
                what: "core id out of range",
            });
        }
        self.ensure_initialized()?;

        let base = self
            .region_base(RegionKind::Slice(core))
            .ok_or(BarelogError::UninitializedParameter {
                what: "slice of core not mapped",
            })?;
        let mutex = if self.layout.has_mutexes() {
            let mutexes = self.region_base(RegionKind::Mutexes).ok_or(
                BarelogError::UninitializedParameter {
                    what: "mutex bytes not mapped",
                },
            )?;
            Some(SharedMutex::new(mutexes + self.layout.mutex_offset(core)))
        } else {
            None
        };

        let slots = self.layout.slice_events();
        let mut events = Vec::new();
        events
            .try_reserve_exact(slots)
            .map_err(|_| BarelogError::Generic)?;
        events.resize(slots, EventRecord::ZERO);

        with_mutex(mutex, &mut self.io, |io| {
            io.read(base, EventRecord::as_bytes_mut(&mut events))
        })?;

        let count = events
            .iter()
            .position(EventRecord::has_empty_payload)
            .unwrap_or(slots);
        events.truncate(count);
        debug!("Read {} of {} slots from core {}", count, slots, core);
        Ok(events)
    }

    /// Events of `core` rendered as `"<timestamp> <core> <payload>"`.
    ///
    /// # Errors
    /// As [`HostMemManager::read_core`], plus `EventConversion` for a record
    /// that cannot be rendered.
    pub fn read_core_strings(&mut self, core: u32) -> BarelogResult<Vec<String>> {
        let events = self.read_core(core)?;
        events_to_strings(&events, self.modes().contains(SessionModes::CHECK))
    }

    /// Events of `core` as a JSON array of `{timestamp, core, payload}`.
    pub fn export_json(&mut self, core: u32) -> BarelogResult<String> {
        let events = self.read_core(core)?;
        serde_json::to_string(&events).map_err(|_| BarelogError::Generic)
    }

    /// Content of the diagnostic slot.
    ///
    /// Copied straight from the mapping, without the injected read primitive
    /// or a mutex. An error entry is also logged.
    ///
    /// # Errors
    /// - `InconsistentParameter` if the session has no debug slot
    /// - `UninitializedParameter` if the slot is not mapped
    pub fn read_debug_region(&self) -> BarelogResult<EventRecord> {
        if !self.layout.has_debug_slot() {
            return Err(BarelogError::InconsistentParameter {
                what: "session has no debug slot",
            });
        }
        self.ensure_initialized()?;
        let base = self
            .region_base(RegionKind::Debug)
            .ok_or(BarelogError::UninitializedParameter {
                what: "debug slot not mapped",
            })?;

        let mut record = EventRecord::ZERO;
        let bytes = EventRecord::as_bytes_mut(core::slice::from_mut(&mut record));
        // SAFETY: the slot was mapped for one event and the mapper contract
        // keeps it valid until finalize.
        unsafe {
            core::ptr::copy_nonoverlapping(base as *const u8, bytes.as_mut_ptr(), bytes.len())
        };

        if let Some(diag) = Diagnostic::parse(&record) {
            if diag.is_error() {
                error!(
                    "Core {} at t={}: {}:{} failed with code {}: {}",
                    record.core, record.timestamp, diag.file, diag.line, diag.code, diag.message
                );
            }
        }
        Ok(record)
    }
}
