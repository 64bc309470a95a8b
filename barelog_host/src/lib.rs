//! # barelog host side
//!
//! Partitions the shared segment of a many-core platform, maps each region
//! through the injected [`barelog::boundary::MemoryMapper`], and reads the
//! per-core event history back once the device cores are done.
//!
//! ## Session lifecycle
//!
//! ```text
//!   new ──► init ──► (device cores run and flush) ──► read_core ... ──► finalize
//!            │                                                            ▲
//!            └── Partial { mapped } ──────────────────────────────────────┘
//! ```
//!
//! The host must wait for the device cores to finish before reading; there
//! is no in-band completion signal.
//!
//! ## Usage
//!
//! ```rust
//! use barelog::config::SessionSettings;
//! use barelog::platform::{DirectCopy, MmapSegment, SegmentMapper};
//! use barelog_host::HostMemManager;
//! use std::sync::Arc;
//!
//! # fn main() -> barelog::BarelogResult<()> {
//! let settings = SessionSettings { cores: 2, shared_event_budget: 2000, ..Default::default() };
//! let segment = Arc::new(MmapSegment::new(2100)?);
//! let mut host = HostMemManager::new(
//!     &settings,
//!     DirectCopy::new(Arc::clone(&segment)),
//!     SegmentMapper::new(Arc::clone(&segment)),
//! )?;
//!
//! assert!(host.init(&segment.platform("SIMULATED")?)?.is_ready());
//! let events = host.read_core(0)?;
//! assert!(events.is_empty());
//! host.finalize()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod reader;

pub use manager::{FinalizeStatus, HostMemManager, InitStatus};
