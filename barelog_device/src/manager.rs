//! Device memory manager: local buffering and the flush engine of one core.
//!
//! ```text
//!   write(event) ──► RingBuffer<10> ──flush(n)──► shared slice of this core
//!                    (private memory)   │          [cursor ─►        ]
//!                                       └─ mutex byte held around each flush
//! ```
//!
//! Two independent overflow policies apply: `buffer_policy` when the ring
//! buffer is full on write, `memory_policy` when the slice lacks room on
//! flush. Both are fixed at construction.
//!
//! No allocation happens after [`DeviceMemManager::new`].

use crate::debug::DebugChannel;
use crate::ring_buffer::RingBuffer;
use crate::slice::SharedSliceCursor;
use barelog::boundary::SharedMemoryIo;
use barelog::config::{SessionModes, SessionSettings};
use barelog::consts::{EVENT_MAX_SIZE, LOCAL_EVENTS_PER_CORE};
use barelog::diagnostic::FLUSH_SUCCESS_MESSAGE;
use barelog::error::{BarelogError, BarelogResult};
use barelog::event::EventRecord;
use barelog::layout::SharedLayout;
use barelog::mem_space::Platform;
use barelog::policy::{OverflowPolicy, PolicyLayer};
use barelog::sync::{SharedMutex, with_mutex};
use core::panic::Location;
use tracing::{debug, info, warn};

/// Local ring buffer sized to the private memory budget of a core.
pub type LocalBuffer = RingBuffer<LOCAL_EVENTS_PER_CORE>;

static ZERO_CHUNK: [EventRecord; LOCAL_EVENTS_PER_CORE] =
    [EventRecord::ZERO; LOCAL_EVENTS_PER_CORE];

/// Per-core device state: local buffer, slice cursor, policies.
#[derive(Debug)]
pub struct DeviceMemManager<Io: SharedMemoryIo> {
    core: u32,
    io: Io,
    buffer: LocalBuffer,
    slice: SharedSliceCursor,
    mutex: Option<SharedMutex>,
    debug: Option<DebugChannel>,
    modes: SessionModes,
    buffer_policy: OverflowPolicy,
    memory_policy: OverflowPolicy,
    stamp: u32,
}

impl<Io: SharedMemoryIo> DeviceMemManager<Io> {
    /// Set up `core` on `platform`.
    ///
    /// Slice and mutex addresses are physical and go through `io`. The
    /// diagnostic slot is written directly and needs the usable base of the
    /// platform; without it diagnostics are off.
    ///
    /// # Errors
    /// - `UnsupportedPolicy` if `memory_policy` is `Flush`
    /// - `InconsistentParameter` for an out-of-range core or a degenerate layout
    /// - `UninitializedParameter` if the platform has no base address
    /// - `Initialization` if the partition does not fit the platform
    pub fn new(
        core: u32,
        platform: &Platform,
        settings: &SessionSettings,
        io: Io,
    ) -> BarelogResult<Self> {
        if !settings
            .memory_policy
            .is_supported_on(PolicyLayer::SharedSlice)
        {
            return Err(BarelogError::UnsupportedPolicy {
                layer: PolicyLayer::SharedSlice,
                policy: settings.memory_policy,
            });
        }

        let layout = SharedLayout::new(settings)?;
        if core >= layout.cores() {
            return Err(BarelogError::InconsistentParameter {
                what: "core id out of range",
            });
        }

        let space = &platform.mem_space;
        if space.phy_base == 0 {
            return Err(BarelogError::UninitializedParameter {
                what: "platform has no base address",
            });
        }
        if layout.total_size() > space.length {
            return Err(BarelogError::Initialization {
                reason: format!(
                    "partition needs {} bytes, platform '{}' has {}",
                    layout.total_size(),
                    platform.name,
                    space.length
                ),
            });
        }

        let modes = layout.modes();
        let slice = SharedSliceCursor::new(
            space.phy_base + layout.slice_offset(core)?,
            layout.slice_bytes(),
        );
        let mutex = layout
            .has_mutexes()
            .then(|| SharedMutex::new(space.phy_base + layout.mutex_offset(core)));
        let debug = if modes.contains(SessionModes::DEBUG) {
            let channel = DebugChannel::new(space, layout.debug_offset(), core);
            if channel.is_none() {
                warn!(
                    "Core {}: debug slot not directly addressable, diagnostics disabled",
                    core
                );
            }
            channel
        } else {
            None
        };

        info!(
            "Device manager ready: core {}, slice {:#x} ({} events), modes {:?}",
            core,
            slice.base(),
            slice.capacity(),
            modes
        );

        Ok(Self {
            core,
            io,
            buffer: LocalBuffer::new(),
            slice,
            mutex,
            debug,
            modes,
            buffer_policy: settings.buffer_policy,
            memory_policy: settings.memory_policy,
            stamp: 0,
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Core this manager logs for.
    #[inline]
    pub fn core(&self) -> u32 {
        self.core
    }

    /// Session modes.
    #[inline]
    pub fn modes(&self) -> SessionModes {
        self.modes
    }

    /// Local buffer policy.
    #[inline]
    pub fn buffer_policy(&self) -> OverflowPolicy {
        self.buffer_policy
    }

    /// Shared slice policy.
    #[inline]
    pub fn memory_policy(&self) -> OverflowPolicy {
        self.memory_policy
    }

    /// `true` when the local buffer is full.
    #[inline]
    pub fn is_buffer_full(&self) -> bool {
        self.buffer.is_full()
    }

    /// Events in the local buffer.
    #[inline]
    pub fn occupancy(&self) -> usize {
        self.buffer.len()
    }

    /// Local buffer contents, oldest first.
    pub fn buffered(&self) -> impl Iterator<Item = &EventRecord> {
        self.buffer.iter()
    }

    /// The local buffer.
    pub fn buffer(&self) -> &LocalBuffer {
        &self.buffer
    }

    /// Slice cursor.
    #[inline]
    pub fn slice(&self) -> &SharedSliceCursor {
        &self.slice
    }

    /// Diagnostic channel, if the session has one.
    #[inline]
    pub fn debug_channel(&self) -> Option<&DebugChannel> {
        self.debug.as_ref()
    }

    /// The injected read/write primitives.
    pub fn io(&self) -> &Io {
        &self.io
    }

    /// The injected read/write primitives, mutably.
    pub fn io_mut(&mut self) -> &mut Io {
        &mut self.io
    }

    /// Record the latest clock reading; diagnostics are stamped with it.
    #[inline]
    pub fn set_timestamp(&mut self, stamp: u32) {
        self.stamp = stamp;
    }

    #[inline]
    fn checks(&self) -> bool {
        self.modes.contains(SessionModes::CHECK)
    }

    // ─── Operations ─────────────────────────────────────────────────

    /// Append `event` to the local buffer, stamped with this core's id.
    ///
    /// On a full buffer the local policy runs first:
    /// - `Skip` drops `event`
    /// - `Replace` evicts the oldest event
    /// - `Flush` drains the buffer to the slice and frees what was drained;
    ///   if the slice policy drained nothing, `event` is dropped
    /// - `Destroy` drains the buffer, then erases all of it
    ///
    /// A drain never pushes more events than the slice holds; on a slice
    /// smaller than the buffer only the oldest events go out.
    ///
    /// # Errors
    /// Errors of the drain, verbatim; the buffer is left as it was.
    pub fn write(&mut self, event: EventRecord) -> BarelogResult<()> {
        let result = self.write_event(event);
        self.report(result)
    }

    /// Erase the `n` oldest buffered events. Returns how many were erased.
    ///
    /// # Errors
    /// `InconsistentParameter` if checks are on and `n` is outside
    /// `[1, capacity]`.
    pub fn clear(&mut self, n: usize) -> BarelogResult<usize> {
        let result = self.buffer.clear(n, self.checks());
        self.report(result)
    }

    /// Erase every buffered event. Returns how many were erased.
    pub fn clear_all(&mut self) -> BarelogResult<usize> {
        Ok(self.buffer.clear_all())
    }

    /// Copy the `n` oldest buffered events to the slice.
    ///
    /// Returns the number of events written; zero when the buffer is empty
    /// or the slice policy skipped the flush. The buffer itself is not
    /// cleared.
    ///
    /// # Errors
    /// - `InconsistentParameter` if checks are on and `n` is outside
    ///   `[1, capacity]`, or if `n` exceeds the whole slice
    /// - `UnsupportedPolicy` for a `Flush` slice policy
    /// - `MutexTimeout`, `SharedMemoryWrite`, `SharedMemoryRead` from the
    ///   guarded write
    pub fn flush(&mut self, n: usize) -> BarelogResult<usize> {
        let result = self.flush_events(n);
        if let (Ok(written), Some(channel)) = (&result, &self.debug) {
            if *written > 0 {
                let at = Location::caller();
                channel.note(self.stamp, at.file(), at.line(), FLUSH_SUCCESS_MESSAGE);
            }
        }
        self.report(result)
    }

    /// Flush every buffered event.
    pub fn flush_all(&mut self) -> BarelogResult<usize> {
        match self.buffer.len() {
            0 => Ok(0),
            n => self.flush(n),
        }
    }

    /// Zero the whole slice under the mutex and rewind the cursor.
    pub fn clear_memory(&mut self) -> BarelogResult<()> {
        let result = self.zero_slice();
        self.report(result)
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn write_event(&mut self, event: EventRecord) -> BarelogResult<()> {
        if self.buffer.is_full() {
            match self.buffer_policy {
                OverflowPolicy::Skip => {
                    debug!("Core {}: local buffer full, skipping event", self.core);
                    return Ok(());
                }
                OverflowPolicy::Replace => self.buffer.evict_oldest(),
                OverflowPolicy::Flush => {
                    let written = self.flush_events(self.drain_count())?;
                    if written == 0 {
                        warn!(
                            "Core {}: buffer full and slice refused the drain, dropping event",
                            self.core
                        );
                        return Ok(());
                    }
                    self.buffer.clear(written, self.checks())?;
                }
                OverflowPolicy::Destroy => {
                    self.flush_events(self.drain_count())?;
                    self.buffer.reset();
                    debug!("Core {}: local buffer drained and destroyed", self.core);
                }
            }
        }
        self.buffer.push(self.core, event);
        Ok(())
    }

    /// Events a policy drain pushes in one go: the whole buffer, or as much
    /// of it as the slice can ever hold.
    #[inline]
    fn drain_count(&self) -> usize {
        self.buffer.len().min(self.slice.capacity())
    }

    fn flush_events(&mut self, n: usize) -> BarelogResult<usize> {
        if self.checks() && !(1..=LOCAL_EVENTS_PER_CORE).contains(&n) {
            return Err(BarelogError::InconsistentParameter {
                what: "flush count outside [1, local capacity]",
            });
        }
        let n = n.min(self.buffer.len());
        if n == 0 {
            return Ok(0);
        }

        if n > self.slice.remaining() {
            match self.memory_policy {
                OverflowPolicy::Skip => {
                    debug!(
                        "Core {}: slice has {} free slots for {} events, skipping flush",
                        self.core,
                        self.slice.remaining(),
                        n
                    );
                    return Ok(0);
                }
                OverflowPolicy::Replace => {
                    debug!("Core {}: slice full, rewinding cursor", self.core);
                    self.slice.rewind();
                }
                OverflowPolicy::Destroy => {
                    debug!("Core {}: slice full, destroying contents", self.core);
                    self.zero_slice()?;
                }
                policy @ OverflowPolicy::Flush => {
                    return Err(BarelogError::UnsupportedPolicy {
                        layer: PolicyLayer::SharedSlice,
                        policy,
                    });
                }
            }
            if n > self.slice.remaining() {
                return Err(BarelogError::InconsistentParameter {
                    what: "flush larger than the shared slice",
                });
            }
        }

        let (first, second) = self.buffer.oldest(n);
        let target = self.slice.slot_address(self.slice.position());
        let wrapped_target = target + first.len() * EVENT_MAX_SIZE;
        with_mutex(self.mutex, &mut self.io, |io| {
            io.write(target, EventRecord::as_bytes(first))?;
            if !second.is_empty() {
                io.write(wrapped_target, EventRecord::as_bytes(second))?;
            }
            Ok(())
        })?;

        self.slice.advance(n);
        debug!(
            "Core {}: flushed {} events, cursor {}/{}",
            self.core,
            n,
            self.slice.position(),
            self.slice.capacity()
        );
        Ok(n)
    }

    fn zero_slice(&mut self) -> BarelogResult<()> {
        let zeroes = EventRecord::as_bytes(&ZERO_CHUNK);
        let slice = self.slice;
        with_mutex(self.mutex, &mut self.io, |io| {
            let mut offset = 0;
            while offset < slice.byte_len() {
                let len = zeroes.len().min(slice.byte_len() - offset);
                io.write(slice.base() + offset, &zeroes[..len])?;
                offset += len;
            }
            Ok(())
        })?;
        self.slice.rewind();
        Ok(())
    }

    /// Send a failure to the diagnostic slot, tagged with the caller's
    /// location.
    #[track_caller]
    fn report<T>(&self, result: BarelogResult<T>) -> BarelogResult<T> {
        if let (Err(error), Some(channel)) = (&result, &self.debug) {
            let at = Location::caller();
            channel.report(self.stamp, at.file(), at.line(), error);
        }
        result
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
