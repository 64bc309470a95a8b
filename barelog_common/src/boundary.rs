//! Capabilities a platform binding supplies to barelog.
//!
//! The device side needs [`SharedRead`] + [`SharedWrite`]; the host side
//! additionally needs a [`MemoryMapper`]; a [`Clock`] timestamps events.
//! Concrete bindings (memory-mapped I/O, DMA, plain copies) live outside
//! this workspace, apart from the simulated platform in [`crate::platform`].

use crate::error::BarelogResult;
use crate::mem_space::Address;

/// Read bytes from shared memory.
pub trait SharedRead {
    /// Fill `buf` with `buf.len()` bytes starting at `address`.
    fn read(&mut self, address: Address, buf: &mut [u8]) -> BarelogResult<()>;
}

/// Write bytes into shared memory.
pub trait SharedWrite {
    /// Store `data` starting at `address`.
    fn write(&mut self, address: Address, data: &[u8]) -> BarelogResult<()>;
}

/// Both directions of shared-memory access.
pub trait SharedMemoryIo: SharedRead + SharedWrite {}

impl<T: SharedRead + SharedWrite> SharedMemoryIo for T {}

/// Maps physical shared-memory ranges into the host's address space.
///
/// # Safety
/// An address returned by [`MemoryMapper::init`] must stay valid for reads
/// and writes of the requested length until the matching
/// [`MemoryMapper::finalize`]. The host zeroes mapped regions and copies the
/// debug slot through it directly.
pub unsafe trait MemoryMapper {
    /// Per-region state kept between `init` and `finalize`.
    type Handle: Default;

    /// Map `size` bytes at physical `address`. `None` on failure.
    fn init(&mut self, address: Address, size: usize, handle: &mut Self::Handle)
    -> Option<Address>;

    /// Release a region mapped by `init`.
    fn finalize(&mut self, handle: &mut Self::Handle) -> BarelogResult<()>;
}

/// 32-bit monotonic counter (wraps) used for timestamps.
pub trait Clock {
    /// Current counter value.
    fn now(&mut self) -> u32;

    /// Reset the counter.
    fn init(&mut self) -> BarelogResult<()> {
        Ok(())
    }

    /// Start counting.
    fn start(&mut self) -> BarelogResult<()> {
        Ok(())
    }
}

/// Clock that always reads zero, used when the platform has no timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroClock;

impl Clock for ZeroClock {
    fn now(&mut self) -> u32 {
        0
    }
}

impl<T: SharedRead + ?Sized> SharedRead for &mut T {
    fn read(&mut self, address: Address, buf: &mut [u8]) -> BarelogResult<()> {
        (**self).read(address, buf)
    }
}

impl<T: SharedWrite + ?Sized> SharedWrite for &mut T {
    fn write(&mut self, address: Address, data: &[u8]) -> BarelogResult<()> {
        (**self).write(address, data)
    }
}
