//! Simulated shared segment backed by an anonymous memory mapping.
//!
//! ```text
//!   physical view (what the device sees)      usable view (host mapping)
//!   phy_base ─┐                               base ─┐
//!             ▼                                     ▼
//!             [──────────── length bytes ──────────]
//! ```
//!
//! [`DirectCopy`] accepts addresses from either view. [`SegmentMapper`] hands
//! out usable addresses for physical ranges, up to an optional limit of live
//! mappings so partial initialization can be exercised.

use crate::boundary::{MemoryMapper, SharedRead, SharedWrite};
use crate::error::{BarelogError, BarelogResult};
use crate::mem_space::{Address, MemSpace, Platform};
use memmap2::MmapMut;
use std::sync::Arc;
use tracing::debug;

/// Physical base the simulated segment pretends to live at.
pub const SIMULATED_PHY_BASE: Address = 0x8f00_0000;

/// Anonymous mapping standing in for the shared memory of a board.
///
/// Accesses go through raw copies. The logging protocol keeps the device and
/// the host in time-disjoint phases per slice; callers sharing a segment
/// across threads must do the same.
#[derive(Debug)]
pub struct MmapSegment {
    _map: MmapMut,
    base: Address,
    phy_base: Address,
    length: usize,
}

impl MmapSegment {
    /// Map `length` zeroed bytes at [`SIMULATED_PHY_BASE`].
    pub fn new(length: usize) -> BarelogResult<Self> {
        Self::with_phy_base(SIMULATED_PHY_BASE, length)
    }

    /// Map `length` zeroed bytes pretending to start at physical `phy_base`.
    pub fn with_phy_base(phy_base: Address, length: usize) -> BarelogResult<Self> {
        let mut map = MmapMut::map_anon(length).map_err(|e| BarelogError::Initialization {
            reason: format!("anonymous mapping of {length} bytes failed: {e}"),
        })?;
        let base = map.as_mut_ptr() as Address;
        debug!("Mapped simulated segment: {} bytes at {:#x}", length, phy_base);

        Ok(Self {
            _map: map,
            base,
            phy_base,
            length,
        })
    }

    /// Physical base address.
    #[inline]
    pub fn phy_base(&self) -> Address {
        self.phy_base
    }

    /// Usable base address of the mapping.
    #[inline]
    pub fn base(&self) -> Address {
        self.base
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// `true` for a zero-length segment.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Platform descriptor with only the physical view, as the host gets it.
    pub fn platform(&self, name: &str) -> BarelogResult<Platform> {
        Platform::new(name, MemSpace::new(self.phy_base, self.length))
    }

    /// Platform descriptor with the usable base filled in, as a device core
    /// with direct access gets it.
    ///
    /// # Safety
    /// The segment must outlive every use of the returned descriptor.
    pub unsafe fn mapped_platform(&self, name: &str) -> BarelogResult<Platform> {
        // SAFETY: forwarded to the caller.
        let space = unsafe { MemSpace::mapped(self.phy_base, self.base, self.length) };
        Platform::new(name, space)
    }

    fn offset_in(&self, start: Address, address: Address, len: usize) -> Option<usize> {
        let offset = address.checked_sub(start)?;
        let end = offset.checked_add(len)?;
        (end <= self.length).then_some(offset)
    }

    /// Usable pointer for `len` bytes at a physical or usable `address`.
    fn resolve(&self, address: Address, len: usize) -> Option<*mut u8> {
        self.offset_in(self.phy_base, address, len)
            .or_else(|| self.offset_in(self.base, address, len))
            .map(|offset| (self.base + offset) as *mut u8)
    }

    /// Usable address of a physical range, if it lies inside the segment.
    pub fn translate(&self, phy_address: Address, len: usize) -> Option<Address> {
        self.offset_in(self.phy_base, phy_address, len)
            .map(|offset| self.base + offset)
    }
}

/// Reference read/write primitives: plain copies on the simulated segment.
#[derive(Debug, Clone)]
pub struct DirectCopy {
    segment: Arc<MmapSegment>,
}

impl DirectCopy {
    /// Copy primitives over `segment`.
    pub fn new(segment: Arc<MmapSegment>) -> Self {
        Self { segment }
    }

    /// Segment this primitive copies into.
    pub fn segment(&self) -> &Arc<MmapSegment> {
        &self.segment
    }
}

impl SharedRead for DirectCopy {
    fn read(&mut self, address: Address, buf: &mut [u8]) -> BarelogResult<()> {
        let src = self
            .segment
            .resolve(address, buf.len())
            .ok_or(BarelogError::SharedMemoryRead {
                address,
                size: buf.len(),
            })?;
        // SAFETY: `resolve` bounds the range inside the live mapping, and
        // `buf` is a distinct Rust allocation.
        unsafe { core::ptr::copy_nonoverlapping(src, buf.as_mut_ptr(), buf.len()) };
        Ok(())
    }
}

impl SharedWrite for DirectCopy {
    fn write(&mut self, address: Address, data: &[u8]) -> BarelogResult<()> {
        let dst = self
            .segment
            .resolve(address, data.len())
            .ok_or(BarelogError::SharedMemoryWrite {
                address,
                size: data.len(),
            })?;
        // SAFETY: as for `read`.
        unsafe { core::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len()) };
        Ok(())
    }
}

/// Mapping record kept by the host for each region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHandle {
    /// Usable address and length, while mapped.
    pub range: Option<(Address, usize)>,
}

/// Mapper handing out usable addresses inside an [`MmapSegment`].
#[derive(Debug, Clone)]
pub struct SegmentMapper {
    segment: Arc<MmapSegment>,
    limit: Option<usize>,
    live: usize,
}

impl SegmentMapper {
    /// Mapper without a limit on live mappings.
    pub fn new(segment: Arc<MmapSegment>) -> Self {
        Self {
            segment,
            limit: None,
            live: 0,
        }
    }

    /// Mapper that refuses to map more than `limit` regions at once.
    pub fn with_limit(segment: Arc<MmapSegment>, limit: usize) -> Self {
        Self {
            segment,
            limit: Some(limit),
            live: 0,
        }
    }

    /// Regions currently mapped.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }
}

// SAFETY: returned addresses point into the mapping held alive by the `Arc`
// this mapper owns, and lie within the requested length.
unsafe impl MemoryMapper for SegmentMapper {
    type Handle = SegmentHandle;

    fn init(
        &mut self,
        address: Address,
        size: usize,
        handle: &mut Self::Handle,
    ) -> Option<Address> {
        if self.limit.is_some_and(|limit| self.live >= limit) {
            return None;
        }
        let usable = self.segment.translate(address, size)?;
        handle.range = Some((usable, size));
        self.live += 1;
        Some(usable)
    }

    fn finalize(&mut self, handle: &mut Self::Handle) -> BarelogResult<()> {
        handle
            .range
            .take()
            .ok_or(BarelogError::UninitializedParameter {
                what: "region is not mapped",
            })?;
        self.live -= 1;
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
