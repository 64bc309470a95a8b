//! Logger front end of one device core.
//!
//! Wraps a [`DeviceMemManager`] with a clock and a runtime level threshold.
//! Messages are formatted straight into a fixed-size record; nothing is
//! allocated.
//!
//! # Usage
//!
//! ```rust
//! use barelog::config::{LogLevel, SessionSettings};
//! use barelog::platform::{DirectCopy, MmapSegment};
//! use barelog::boundary::ZeroClock;
//! use barelog_device::{DeviceMemManager, Logger, log_event};
//! use std::sync::Arc;
//!
//! # fn main() -> barelog::BarelogResult<()> {
//! let settings = SessionSettings { cores: 2, shared_event_budget: 2000, ..Default::default() };
//! let segment = Arc::new(MmapSegment::new(2100)?);
//! let platform = segment.platform("SIMULATED")?;
//! let manager = DeviceMemManager::new(1, &platform, &settings, DirectCopy::new(segment))?;
//!
//! let mut logger = Logger::new(manager, ZeroClock);
//! logger.start()?;
//! log_event!(logger, LogLevel::Info, "sample {} ready", 7)?;
//! logger.flush_all()?;
//! # Ok(())
//! # }
//! ```

use crate::manager::DeviceMemManager;
use barelog::boundary::{Clock, SharedMemoryIo};
use barelog::config::LogLevel;
use barelog::error::BarelogResult;
use barelog::event::EventRecord;
use core::fmt;

/// Log a formatted message through a [`Logger`].
///
/// Expands to `logger.log(level, format_args!(...))`.
#[macro_export]
macro_rules! log_event {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format_args!($($arg)+))
    };
}

/// Device logger: clock, level filter, and the memory manager.
#[derive(Debug)]
pub struct Logger<Io: SharedMemoryIo, C: Clock> {
    manager: DeviceMemManager<Io>,
    clock: C,
    level: LogLevel,
}

impl<Io: SharedMemoryIo, C: Clock> Logger<Io, C> {
    /// Logger recording every level.
    pub fn new(manager: DeviceMemManager<Io>, clock: C) -> Self {
        Self {
            manager,
            clock,
            level: LogLevel::Trace,
        }
    }

    /// Initialize, then start the clock.
    ///
    /// Both steps run even if the first fails; the first error is returned.
    pub fn start(&mut self) -> BarelogResult<()> {
        let init = self.clock.init();
        let start = self.clock.start();
        init.and(start)
    }

    /// Set the threshold; less severe messages are not recorded.
    #[inline]
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    /// Current threshold.
    #[inline]
    pub fn log_level(&self) -> LogLevel {
        self.level
    }

    /// Record a message at `level`.
    ///
    /// Returns `false` if the message was filtered out by the threshold. The
    /// payload is cut at capacity.
    pub fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>) -> BarelogResult<bool> {
        if level < self.level {
            return Ok(false);
        }
        let now = self.stamp();
        self.manager.write(EventRecord::from_fmt(now, args))?;
        Ok(true)
    }

    /// Record a message and push it to the slice at once: log, flush one,
    /// clear one.
    pub fn immediate_log(
        &mut self,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> BarelogResult<bool> {
        if !self.log(level, args)? {
            return Ok(false);
        }
        self.stamp();
        self.manager.flush(1)?;
        self.manager.clear(1)?;
        Ok(true)
    }

    /// Read the clock and hand the reading to the manager, so diagnostics
    /// carry the time of the operation that raised them.
    fn stamp(&mut self) -> u32 {
        let now = self.clock.now();
        self.manager.set_timestamp(now);
        now
    }

    /// See [`DeviceMemManager::clear`].
    pub fn clear(&mut self, n: usize) -> BarelogResult<usize> {
        self.stamp();
        self.manager.clear(n)
    }

    /// See [`DeviceMemManager::clear_all`].
    pub fn clear_all(&mut self) -> BarelogResult<usize> {
        self.stamp();
        self.manager.clear_all()
    }

    /// See [`DeviceMemManager::flush`].
    pub fn flush(&mut self, n: usize) -> BarelogResult<usize> {
        self.stamp();
        self.manager.flush(n)
    }

    /// See [`DeviceMemManager::flush_all`].
    pub fn flush_all(&mut self) -> BarelogResult<usize> {
        self.stamp();
        self.manager.flush_all()
    }

    /// See [`DeviceMemManager::clear_memory`].
    pub fn clear_memory(&mut self) -> BarelogResult<()> {
        self.stamp();
        self.manager.clear_memory()
    }

    /// `true` when the local buffer is full.
    pub fn is_buffer_full(&self) -> bool {
        self.manager.is_buffer_full()
    }

    /// The wrapped manager.
    pub fn manager(&self) -> &DeviceMemManager<Io> {
        &self.manager
    }

    /// The wrapped manager, mutably.
    pub fn manager_mut(&mut self) -> &mut DeviceMemManager<Io> {
        &mut self.manager
    }

    /// Give back the manager and the clock.
    pub fn into_parts(self) -> (DeviceMemManager<Io>, C) {
        (self.manager, self.clock)
    }
}
