//! Local ring buffer behavior under each overflow policy

use barelog::platform::{DirectCopy, MmapSegment};
use barelog::prelude::*;
use barelog_device::DeviceMemManager;
use proptest::prelude::*;
use std::sync::Arc;

const C: usize = LOCAL_EVENTS_PER_CORE;

fn manager(buffer_policy: OverflowPolicy) -> BarelogResult<DeviceMemManager<DirectCopy>> {
    let settings = SessionSettings {
        cores: 1,
        shared_event_budget: 4 * C * EVENT_MAX_SIZE,
        safe_mode: true,
        debug_mode: false,
        check_mode: true,
        buffer_policy,
        memory_policy: OverflowPolicy::Replace,
    };
    let layout = SharedLayout::new(&settings)?;
    let segment = Arc::new(MmapSegment::new(layout.total_size())?);
    let platform = segment.platform("TEST")?;
    DeviceMemManager::new(0, &platform, &settings, DirectCopy::new(segment))
}

fn event(i: usize) -> EventRecord {
    EventRecord::from_fmt(i as u32, format_args!("E{i}"))
}

fn buffered(m: &DeviceMemManager<DirectCopy>) -> Vec<String> {
    m.buffered()
        .map(|e| e.payload_str().unwrap_or_default().to_string())
        .collect()
}

fn any_policy() -> impl Strategy<Value = OverflowPolicy> {
    prop_oneof![
        Just(OverflowPolicy::Skip),
        Just(OverflowPolicy::Replace),
        Just(OverflowPolicy::Flush),
        Just(OverflowPolicy::Destroy),
    ]
}

#[test]
fn test_replace_keeps_newest_ten() -> BarelogResult<()> {
    let mut m = manager(OverflowPolicy::Replace)?;
    for i in 0..12 {
        m.write(event(i))?;
    }
    let expected: Vec<String> = (2..12).map(|i| format!("E{i}")).collect();
    assert_eq!(buffered(&m), expected);
    assert_eq!(m.occupancy(), 10);
    assert!(m.is_buffer_full());
    Ok(())
}

#[test]
fn test_core_id_is_stamped_by_buffer() -> BarelogResult<()> {
    let mut m = manager(OverflowPolicy::Replace)?;
    let mut e = event(0);
    e.core = 42;
    m.write(e)?;
    assert_eq!(m.buffered().next().map(|e| e.core), Some(0));
    Ok(())
}

#[test]
fn test_clear_all_empties_full_buffer() -> BarelogResult<()> {
    let mut m = manager(OverflowPolicy::Replace)?;
    for i in 0..15 {
        m.write(event(i))?;
    }
    assert_eq!(m.clear_all()?, C);
    assert_eq!(m.occupancy(), 0);
    assert!(!m.is_buffer_full());
    assert_eq!(m.clear_all()?, 0);
    Ok(())
}

#[test]
fn test_clear_count_out_of_range() -> BarelogResult<()> {
    let mut m = manager(OverflowPolicy::Replace)?;
    m.write(event(0))?;
    assert!(matches!(
        m.clear(0),
        Err(BarelogError::InconsistentParameter { .. })
    ));
    assert!(m.clear(C + 1).is_err());
    assert_eq!(m.occupancy(), 1);
    Ok(())
}

proptest! {
    #[test]
    fn prop_skip_on_full_is_identity(extra in 1usize..20) {
        let mut m = manager(OverflowPolicy::Skip).unwrap();
        for i in 0..C {
            m.write(event(i)).unwrap();
        }
        let before = *m.buffer().slots();
        for i in 0..extra {
            prop_assert!(m.write(event(100 + i)).is_ok());
        }
        prop_assert_eq!(*m.buffer().slots(), before);
    }

    #[test]
    fn prop_occupancy_after_writes_and_clear(
        policy in prop_oneof![Just(OverflowPolicy::Skip), Just(OverflowPolicy::Replace)],
        k in 0usize..40,
        n in 1usize..=C,
    ) {
        let mut m = manager(policy).unwrap();
        for i in 0..k {
            m.write(event(i)).unwrap();
        }
        prop_assert_eq!(m.occupancy(), k.min(C));

        let before = m.occupancy();
        m.clear(n).unwrap();
        prop_assert_eq!(m.occupancy(), before.saturating_sub(n));
    }

    #[test]
    fn prop_flush_then_clear_empties(policy in any_policy(), k in 1usize..40) {
        let mut m = manager(policy).unwrap();
        for i in 0..k {
            m.write(event(i)).unwrap();
        }
        let n = m.occupancy();
        prop_assume!(n > 0);
        prop_assert_eq!(m.flush(n).unwrap(), n);
        m.clear(n).unwrap();
        prop_assert_eq!(m.occupancy(), 0);
        prop_assert_eq!(m.buffered().count(), 0);
    }

    #[test]
    fn prop_replace_preserves_order(k in 1usize..50) {
        let mut m = manager(OverflowPolicy::Replace).unwrap();
        for i in 0..k {
            m.write(event(i)).unwrap();
        }
        let expected: Vec<String> = (k.saturating_sub(C)..k).map(|i| format!("E{i}")).collect();
        prop_assert_eq!(buffered(&m), expected);
    }
}
