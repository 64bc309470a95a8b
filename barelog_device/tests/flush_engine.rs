//! Flush engine against the simulated shared segment

use barelog::platform::{DirectCopy, MmapSegment};
use barelog::prelude::*;
use barelog_device::{DeviceMemManager, Logger};
use std::sync::Arc;

const C: usize = LOCAL_EVENTS_PER_CORE;

struct Session {
    segment: Arc<MmapSegment>,
    layout: SharedLayout,
    settings: SessionSettings,
}

impl Session {
    fn new(cores: u32, slice_events: usize, memory_policy: OverflowPolicy) -> BarelogResult<Self> {
        let settings = SessionSettings {
            cores,
            shared_event_budget: cores as usize * slice_events * EVENT_MAX_SIZE,
            safe_mode: true,
            debug_mode: true,
            check_mode: true,
            buffer_policy: OverflowPolicy::Replace,
            memory_policy,
        };
        let layout = SharedLayout::new(&settings)?;
        let segment = Arc::new(MmapSegment::new(layout.total_size())?);
        Ok(Self {
            segment,
            layout,
            settings,
        })
    }

    fn device<Io: SharedMemoryIo>(
        &self,
        core: u32,
        io: Io,
    ) -> BarelogResult<DeviceMemManager<Io>> {
        // SAFETY: the session owns the segment for the whole test.
        let platform = unsafe { self.segment.mapped_platform("TEST")? };
        DeviceMemManager::new(core, &platform, &self.settings, io)
    }

    fn io(&self) -> DirectCopy {
        DirectCopy::new(Arc::clone(&self.segment))
    }

    fn slice(&self, core: u32) -> BarelogResult<Vec<EventRecord>> {
        let mut events = vec![EventRecord::ZERO; self.layout.slice_events()];
        let address = self.segment.phy_base() + self.layout.slice_offset(core)?;
        self.io().read(address, EventRecord::as_bytes_mut(&mut events))?;
        Ok(events)
    }

    fn mutex_byte(&self, core: u32) -> BarelogResult<u8> {
        let mut byte = [0u8; 1];
        self.io()
            .read(self.segment.phy_base() + self.layout.mutex_offset(core), &mut byte)?;
        Ok(byte[0])
    }

    fn set_mutex_byte(&self, core: u32, value: u8) -> BarelogResult<()> {
        self.io()
            .write(self.segment.phy_base() + self.layout.mutex_offset(core), &[value])
    }

    fn debug_slot(&self) -> BarelogResult<EventRecord> {
        let mut record = EventRecord::ZERO;
        self.io().read(
            self.segment.phy_base() + self.layout.debug_offset(),
            EventRecord::as_bytes_mut(std::slice::from_mut(&mut record)),
        )?;
        Ok(record)
    }
}

/// Copy primitives that refuse writes inside one address range.
struct FailingWrites {
    inner: DirectCopy,
    from: Address,
    to: Address,
}

impl SharedRead for FailingWrites {
    fn read(&mut self, address: Address, buf: &mut [u8]) -> BarelogResult<()> {
        self.inner.read(address, buf)
    }
}

impl SharedWrite for FailingWrites {
    fn write(&mut self, address: Address, data: &[u8]) -> BarelogResult<()> {
        if (self.from..self.to).contains(&address) {
            return Err(BarelogError::SharedMemoryWrite {
                address,
                size: data.len(),
            });
        }
        self.inner.write(address, data)
    }
}

fn event(i: usize) -> EventRecord {
    EventRecord::from_fmt(i as u32, format_args!("E{i}"))
}

fn payloads(events: &[EventRecord]) -> Vec<String> {
    events
        .iter()
        .map(|e| e.payload_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_replace_wraparound_lands_last_c_in_order() -> BarelogResult<()> {
    let session = Session::new(2, 2 * C, OverflowPolicy::Replace)?;
    let mut device = session.device(1, session.io())?;
    for i in 0..2 * C {
        device.write(event(i))?;
    }
    assert_eq!(device.flush(C)?, C);

    let slice = session.slice(1)?;
    let expected: Vec<String> = (C..2 * C).map(|i| format!("E{i}")).collect();
    assert_eq!(payloads(&slice[..C]), expected);
    assert!(slice[C..].iter().all(EventRecord::is_zero));
    assert!(slice.iter().take(C).all(|e| e.core == 1));
    // The other core's slice is untouched.
    assert!(session.slice(0)?.iter().all(EventRecord::is_zero));
    Ok(())
}

#[test]
fn test_skip_with_one_free_slot_writes_nothing() -> BarelogResult<()> {
    let session = Session::new(1, 5, OverflowPolicy::Skip)?;
    let mut device = session.device(0, session.io())?;
    for i in 0..4 {
        device.write(event(i))?;
    }
    device.flush_all()?;
    device.clear_all()?;
    assert_eq!(device.slice().position(), 4);

    for i in 4..7 {
        device.write(event(i))?;
    }
    let before = session.slice(0)?;
    assert_eq!(device.flush(3)?, 0);
    assert_eq!(device.slice().position(), 4);
    assert_eq!(session.slice(0)?, before);
    Ok(())
}

#[test]
fn test_mutex_held_times_out_and_reports() -> BarelogResult<()> {
    let session = Session::new(2, 20, OverflowPolicy::Replace)?;
    let mut device = session.device(0, session.io())?;
    device.write(event(0))?;

    session.set_mutex_byte(0, 1)?;
    let err = device.flush(1).unwrap_err();
    assert_eq!(
        err,
        BarelogError::MutexTimeout {
            address: session.segment.phy_base(),
            attempts: MUTEX_TRY_MAX,
        }
    );
    assert_eq!(device.slice().position(), 0);
    assert!(session.slice(0)?.iter().all(EventRecord::is_zero));

    let slot = session.debug_slot()?;
    let diag = Diagnostic::parse(&slot).expect("diagnostic entry");
    assert_eq!(diag.code, -6);

    // Once released, the same flush goes through.
    session.set_mutex_byte(0, 0)?;
    assert_eq!(device.flush(1)?, 1);
    let diag_slot = session.debug_slot()?;
    let diag = Diagnostic::parse(&diag_slot).expect("diagnostic entry");
    assert_eq!(diag.code, STATUS_SUCCESS);
    Ok(())
}

#[test]
fn test_failed_write_releases_mutex() -> BarelogResult<()> {
    let session = Session::new(2, 20, OverflowPolicy::Replace)?;
    let slice = session.segment.phy_base() + session.layout.slice_offset(1)?;
    let io = FailingWrites {
        inner: session.io(),
        from: slice,
        to: slice + session.layout.slice_bytes(),
    };
    let mut device = session.device(1, io)?;
    device.write(event(0))?;

    let err = device.flush(1).unwrap_err();
    assert_eq!(err.code(), -4);
    assert_eq!(session.mutex_byte(1)?, 0);
    assert_eq!(device.slice().position(), 0);
    assert_eq!(device.occupancy(), 1);
    Ok(())
}

#[test]
fn test_flush_policy_full_buffer_propagates_inner_error() -> BarelogResult<()> {
    let mut session = Session::new(1, 20, OverflowPolicy::Replace)?;
    session.settings.buffer_policy = OverflowPolicy::Flush;
    let mut device = session.device(0, session.io())?;
    for i in 0..C {
        device.write(event(i))?;
    }

    session.set_mutex_byte(0, 1)?;
    let err = device.write(event(C)).unwrap_err();
    assert!(matches!(err, BarelogError::MutexTimeout { .. }));
    // Nothing changed locally.
    assert!(device.is_buffer_full());
    assert_eq!(device.buffered().next().map(|e| e.payload().to_vec()), Some(b"E0".to_vec()));
    Ok(())
}

#[test]
fn test_destroy_slice_zeroes_before_rewrite() -> BarelogResult<()> {
    let session = Session::new(1, 12, OverflowPolicy::Destroy)?;
    let mut device = session.device(0, session.io())?;
    for i in 0..C {
        device.write(event(i))?;
    }
    device.flush_all()?;
    device.clear_all()?;

    for i in C..C + 3 {
        device.write(event(i))?;
    }
    device.flush_all()?;

    let slice = session.slice(0)?;
    assert_eq!(payloads(&slice[..3]), vec!["E10", "E11", "E12"]);
    assert!(slice[3..].iter().all(EventRecord::is_zero));
    Ok(())
}

#[test]
fn test_clear_memory_under_mutex() -> BarelogResult<()> {
    let session = Session::new(1, 20, OverflowPolicy::Replace)?;
    let mut device = session.device(0, session.io())?;
    for i in 0..5 {
        device.write(event(i))?;
    }
    device.flush_all()?;
    device.clear_memory()?;
    assert_eq!(device.slice().position(), 0);
    assert!(session.slice(0)?.iter().all(EventRecord::is_zero));
    assert_eq!(session.mutex_byte(0)?, 0);

    session.set_mutex_byte(0, 1)?;
    assert_eq!(device.clear_memory().unwrap_err().code(), -6);
    Ok(())
}

#[test]
fn test_logger_on_simulated_segment() -> BarelogResult<()> {
    let session = Session::new(1, 20, OverflowPolicy::Replace)?;
    let device = session.device(0, session.io())?;
    let mut logger = Logger::new(device, ZeroClock);
    logger.start()?;
    logger.set_log_level(LogLevel::Info);

    barelog_device::log_event!(logger, LogLevel::Debug, "hidden")?;
    barelog_device::log_event!(logger, LogLevel::Warn, "temp {}C", 81)?;
    logger.immediate_log(LogLevel::Error, format_args!("fault"))?;

    // The immediate flush pushes the oldest buffered event and frees it.
    let slice = session.slice(0)?;
    assert_eq!(payloads(&slice[..2]), vec!["temp 81C", ""]);
    assert_eq!(logger.manager().occupancy(), 1);
    assert_eq!(
        logger.manager().buffered().next().map(|e| e.payload().to_vec()),
        Some(b"fault".to_vec())
    );
    Ok(())
}
