//! Host memory partitioner: carves the shared segment and maps each region.
//!
//! Regions are mapped, zeroed and released in partition order: mutex bytes,
//! debug slot, then one slice per core. The order is part of the protocol
//! since a partial mapping reports how many regions made it.

use barelog::boundary::{MemoryMapper, SharedMemoryIo};
use barelog::config::{SessionConfig, SessionModes, SessionSettings};
use barelog::error::{BarelogError, BarelogResult};
use barelog::layout::{Region, RegionKind, SharedLayout};
use barelog::mem_space::{Address, Platform};
use tracing::{debug, info, warn};

/// Outcome of [`HostMemManager::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// Every region is mapped.
    Ready {
        /// Logged cores.
        cores: u32,
    },
    /// The mapper refused a region; the first `mapped` regions are mapped.
    Partial {
        /// Regions mapped before the refusal.
        mapped: usize,
    },
}

impl InitStatus {
    /// `true` when every region is mapped.
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Status as a non-negative count: the core count when ready, the number
    /// of mapped regions otherwise.
    pub fn count(&self) -> usize {
        match *self {
            Self::Ready { cores } => cores as usize,
            Self::Partial { mapped } => mapped,
        }
    }
}

/// Outcome of [`HostMemManager::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeStatus {
    /// Every region was released.
    Released {
        /// Regions released.
        regions: usize,
    },
    /// Releasing the region at `index` failed; earlier ones were released.
    Stopped {
        /// Position of the failing region among those still mapped.
        index: usize,
        /// Error of the mapper.
        error: BarelogError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Idle,
    Partial,
    Ready,
}

pub(crate) struct MappedRegion<H> {
    pub(crate) region: Region,
    pub(crate) base: Address,
    pub(crate) handle: H,
}

/// Host side of a logging session.
pub struct HostMemManager<Io: SharedMemoryIo, M: MemoryMapper> {
    pub(crate) io: Io,
    pub(crate) mapper: M,
    pub(crate) layout: SharedLayout,
    pub(crate) regions: Vec<MappedRegion<M::Handle>>,
    pub(crate) state: SessionState,
}

impl<Io: SharedMemoryIo, M: MemoryMapper> HostMemManager<Io, M> {
    /// Manager for a segment shaped by `settings`. Nothing is mapped yet.
    ///
    /// # Errors
    /// `InconsistentParameter` for zero cores or a slice smaller than one
    /// event.
    pub fn new(settings: &SessionSettings, io: Io, mapper: M) -> BarelogResult<Self> {
        let layout = SharedLayout::new(settings)?;
        Ok(Self {
            io,
            mapper,
            layout,
            regions: Vec::new(),
            state: SessionState::Idle,
        })
    }

    /// Manager for a validated configuration file.
    ///
    /// # Errors
    /// `Config` if validation fails, then as [`HostMemManager::new`].
    pub fn from_config(config: &SessionConfig, io: Io, mapper: M) -> BarelogResult<Self> {
        config.validate()?;
        Self::new(&config.session, io, mapper)
    }

    /// Partition of the segment.
    #[inline]
    pub fn layout(&self) -> &SharedLayout {
        &self.layout
    }

    /// Session modes.
    #[inline]
    pub fn modes(&self) -> SessionModes {
        self.layout.modes()
    }

    /// `true` after a complete [`HostMemManager::init`].
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Number of regions currently mapped.
    #[inline]
    pub fn mapped_regions(&self) -> usize {
        self.regions.len()
    }

    /// The injected mapper.
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// The injected read/write primitives.
    pub fn io_mut(&mut self) -> &mut Io {
        &mut self.io
    }

    /// Map and zero every region of the partition.
    ///
    /// If the mapper refuses a region, the regions mapped so far stay mapped
    /// so [`HostMemManager::finalize`] can release them, and the count is
    /// returned as [`InitStatus::Partial`].
    ///
    /// # Errors
    /// - `UninitializedParameter` if a session is already set up or the
    ///   platform has no base address
    /// - `Initialization` if the partition is larger than the platform
    pub fn init(&mut self, platform: &Platform) -> BarelogResult<InitStatus> {
        if self.state != SessionState::Idle {
            return Err(BarelogError::UninitializedParameter {
                what: "host session already initialized",
            });
        }
        let space = &platform.mem_space;
        if space.phy_base == 0 {
            return Err(BarelogError::UninitializedParameter {
                what: "platform has no base address",
            });
        }
        if self.layout.total_size() > space.length {
            return Err(BarelogError::Initialization {
                reason: format!(
                    "partition needs {} bytes, platform '{}' has {}",
                    self.layout.total_size(),
                    platform.name,
                    space.length
                ),
            });
        }

        self.regions.reserve_exact(self.layout.region_count());
        for region in self.layout.regions() {
            let mut handle = M::Handle::default();
            let physical = space.phy_base + region.offset;
            let Some(base) = self.mapper.init(physical, region.length, &mut handle) else {
                warn!(
                    "Mapping {:?} at {:#x} ({} bytes) failed, {} of {} regions mapped",
                    region.kind,
                    physical,
                    region.length,
                    self.regions.len(),
                    self.layout.region_count()
                );
                self.state = SessionState::Partial;
                return Ok(InitStatus::Partial {
                    mapped: self.regions.len(),
                });
            };

            // SAFETY: the mapper contract makes `base` valid for writes of
            // `region.length` bytes until finalized.
            unsafe { core::ptr::write_bytes(base as *mut u8, 0, region.length) };
            debug!("Mapped {:?} at {:#x} -> {:#x}", region.kind, physical, base);
            self.regions.push(MappedRegion {
                region,
                base,
                handle,
            });
        }

        self.state = SessionState::Ready;
        info!(
            "Host session ready on '{}': {} cores, {} bytes partitioned",
            platform.name,
            self.layout.cores(),
            self.layout.total_size()
        );
        Ok(InitStatus::Ready {
            cores: self.layout.cores(),
        })
    }

    /// Release every mapped region, in order.
    ///
    /// Stops at the first region the mapper fails to release; regions before
    /// it are forgotten, the rest stay mapped for another attempt.
    ///
    /// # Errors
    /// `UninitializedParameter` if nothing was initialized.
    pub fn finalize(&mut self) -> BarelogResult<FinalizeStatus> {
        if self.state == SessionState::Idle {
            return Err(BarelogError::UninitializedParameter {
                what: "host session not initialized",
            });
        }

        for index in 0..self.regions.len() {
            if let Err(error) = self.mapper.finalize(&mut self.regions[index].handle) {
                warn!(
                    "Releasing {:?} failed: {}",
                    self.regions[index].region.kind, error
                );
                self.regions.drain(..index);
                self.state = SessionState::Partial;
                return Ok(FinalizeStatus::Stopped { index, error });
            }
        }

        let regions = self.regions.len();
        self.regions.clear();
        self.state = SessionState::Idle;
        info!("Host session finalized: {} regions released", regions);
        Ok(FinalizeStatus::Released { regions })
    }

    /// Usable base of a mapped region.
    pub(crate) fn region_base(&self, kind: RegionKind) -> Option<Address> {
        self.regions
            .iter()
            .find(|r| r.region.kind == kind)
            .map(|r| r.base)
    }

    pub(crate) fn ensure_initialized(&self) -> BarelogResult<()> {
        if self.state == SessionState::Idle {
            return Err(BarelogError::UninitializedParameter {
                what: "host session not initialized",
            });
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
