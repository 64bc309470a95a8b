//! Byte-exact partition of the shared segment.
//!
//! Host and device compute the same layout from the same settings:
//!
//! ```text
//! ┌──────────────────┬───────────────┬──────────┬──────────┬─────┬──────────┐
//! │ mutex bytes      │ debug slot    │ slice 0  │ slice 1  │ ... │ slice N-1│
//! │ 1/core, SAFE only│ 1 event, DEBUG│          │          │     │          │
//! └──────────────────┴───────────────┴──────────┴──────────┴─────┴──────────┘
//!                                     ▲ data_offset, slices contiguous, unpadded
//! ```
//!
//! Each slice is `shared_event_budget / cores` bytes and holds
//! `slice_bytes / EVENT_MAX_SIZE` events.

use crate::config::{SessionModes, SessionSettings};
use crate::consts::EVENT_MAX_SIZE;
use crate::error::{BarelogError, BarelogResult};

/// What a region of the partition is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// One mutex byte per core.
    Mutexes,
    /// Diagnostic slot holding the most recent error.
    Debug,
    /// Event slice of one core.
    Slice(u32),
}

/// One region of the partition, relative to the segment start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Purpose of the region.
    pub kind: RegionKind,
    /// Byte offset from the segment start.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
}

/// Layout of the shared segment for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedLayout {
    cores: u32,
    modes: SessionModes,
    mutex_bytes: usize,
    debug_bytes: usize,
    slice_bytes: usize,
}

impl SharedLayout {
    /// Compute the layout.
    ///
    /// # Errors
    /// `InconsistentParameter` if there are no cores or a slice cannot hold
    /// a single event.
    pub fn new(settings: &SessionSettings) -> BarelogResult<Self> {
        if settings.cores == 0 {
            return Err(BarelogError::InconsistentParameter {
                what: "session needs at least one core",
            });
        }
        let modes = settings.modes();
        let slice_bytes = settings.shared_event_budget / settings.cores as usize;
        if slice_bytes < EVENT_MAX_SIZE {
            return Err(BarelogError::InconsistentParameter {
                what: "shared slice smaller than one event",
            });
        }

        Ok(Self {
            cores: settings.cores,
            modes,
            mutex_bytes: if modes.contains(SessionModes::SAFE) {
                settings.cores as usize
            } else {
                0
            },
            debug_bytes: if modes.contains(SessionModes::DEBUG) {
                EVENT_MAX_SIZE
            } else {
                0
            },
            slice_bytes,
        })
    }

    /// Number of cores.
    #[inline]
    pub const fn cores(&self) -> u32 {
        self.cores
    }

    /// Resolved session modes.
    #[inline]
    pub const fn modes(&self) -> SessionModes {
        self.modes
    }

    /// Whether mutex bytes are reserved.
    #[inline]
    pub const fn has_mutexes(&self) -> bool {
        self.mutex_bytes != 0
    }

    /// Whether a debug slot is reserved.
    #[inline]
    pub const fn has_debug_slot(&self) -> bool {
        self.debug_bytes != 0
    }

    /// Offset of the mutex byte of `core`.
    #[inline]
    pub const fn mutex_offset(&self, core: u32) -> usize {
        core as usize
    }

    /// Offset of the debug slot.
    #[inline]
    pub const fn debug_offset(&self) -> usize {
        self.mutex_bytes
    }

    /// Offset of the first event slice.
    #[inline]
    pub const fn data_offset(&self) -> usize {
        self.mutex_bytes + self.debug_bytes
    }

    /// Bytes of one core's slice.
    #[inline]
    pub const fn slice_bytes(&self) -> usize {
        self.slice_bytes
    }

    /// Events one core's slice holds.
    #[inline]
    pub const fn slice_events(&self) -> usize {
        self.slice_bytes / EVENT_MAX_SIZE
    }

    /// Offset of the slice of `core`.
    ///
    /// # Errors
    /// `InconsistentParameter` if `core` is out of range.
    pub fn slice_offset(&self, core: u32) -> BarelogResult<usize> {
        if core >= self.cores {
            return Err(BarelogError::InconsistentParameter {
                what: "core id out of range",
            });
        }
        Ok(self.data_offset() + core as usize * self.slice_bytes)
    }

    /// Total bytes the partition occupies.
    #[inline]
    pub const fn total_size(&self) -> usize {
        self.data_offset() + self.cores as usize * self.slice_bytes
    }

    /// Number of regions the host maps.
    pub fn region_count(&self) -> usize {
        self.cores as usize + usize::from(self.has_mutexes()) + usize::from(self.has_debug_slot())
    }

    /// Regions in mapping order: mutexes, debug slot, then slices by core.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        let mutexes = self.has_mutexes().then_some(Region {
            kind: RegionKind::Mutexes,
            offset: 0,
            length: self.mutex_bytes,
        });
        let debug = self.has_debug_slot().then_some(Region {
            kind: RegionKind::Debug,
            offset: self.debug_offset(),
            length: self.debug_bytes,
        });
        let slices = (0..self.cores).map(move |core| Region {
            kind: RegionKind::Slice(core),
            offset: self.data_offset() + core as usize * self.slice_bytes,
            length: self.slice_bytes,
        });
        mutexes.into_iter().chain(debug).chain(slices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(cores: u32, budget: usize, safe: bool, debug: bool) -> SessionSettings {
        SessionSettings {
            cores,
            shared_event_budget: budget,
            safe_mode: safe,
            debug_mode: debug,
            ..Default::default()
        }
    }

    #[test]
    fn reference_platform_layout() {
        let layout = SharedLayout::new(&settings(16, 1_000_000, false, true)).unwrap();
        assert_eq!(layout.debug_offset(), 0);
        assert_eq!(layout.data_offset(), 100);
        assert_eq!(layout.slice_bytes(), 62_500);
        assert_eq!(layout.slice_events(), 625);
        assert_eq!(layout.total_size(), 1_000_100);
        assert_eq!(layout.region_count(), 17);
    }

    #[test]
    fn safe_mode_prefixes_mutex_bytes() {
        let layout = SharedLayout::new(&settings(4, 4000, true, true)).unwrap();
        assert_eq!(layout.mutex_offset(3), 3);
        assert_eq!(layout.debug_offset(), 4);
        assert_eq!(layout.data_offset(), 104);
        assert_eq!(layout.slice_offset(2).unwrap(), 104 + 2 * 1000);
        assert!(layout.slice_offset(4).is_err());
    }

    #[test]
    fn regions_are_contiguous_and_ordered() {
        let layout = SharedLayout::new(&settings(3, 3000, true, true)).unwrap();
        let regions: Vec<_> = layout.regions().collect();
        assert_eq!(regions.len(), layout.region_count());
        assert_eq!(regions[0].kind, RegionKind::Mutexes);
        assert_eq!(regions[1].kind, RegionKind::Debug);
        assert_eq!(regions[2].kind, RegionKind::Slice(0));

        let mut expected = 0;
        for r in &regions {
            assert_eq!(r.offset, expected);
            expected += r.length;
        }
        assert_eq!(expected, layout.total_size());
    }

    #[test]
    fn bare_layout_has_only_slices() {
        let layout = SharedLayout::new(&settings(2, 1000, false, false)).unwrap();
        assert_eq!(layout.data_offset(), 0);
        assert!(layout.regions().all(|r| matches!(r.kind, RegionKind::Slice(_))));
    }

    #[test]
    fn invalid_shapes_rejected() {
        assert!(SharedLayout::new(&settings(0, 1000, false, false)).is_err());
        assert!(SharedLayout::new(&settings(4, 399, false, false)).is_err());
    }
}
