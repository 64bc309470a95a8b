//! Compile-time budgets for the barelog workspace.
//!
//! These are hardware budgets of the logged platform (size of one event,
//! private memory per core) and protocol constants. They size fixed arrays
//! on the device side, so they cannot move into the runtime configuration.
//! Everything that only shapes the shared segment lives in
//! [`crate::config::SessionSettings`] instead.

/// Maximum size of one event record in bytes (header + payload).
pub const EVENT_MAX_SIZE: usize = 100;

/// Size of the fixed record header: 4-byte timestamp + 4-byte core id.
pub const EVENT_HEADER_SIZE: usize = 2 * core::mem::size_of::<u32>();

/// Payload capacity of one event record.
pub const EVENT_PAYLOAD_SIZE: usize = EVENT_MAX_SIZE - EVENT_HEADER_SIZE;

/// Capacity of the string produced when rendering one event.
pub const EVENT_STRING_SIZE: usize = EVENT_MAX_SIZE * 2;

/// Bytes of private memory each core reserves for its local ring buffer.
pub const LOCAL_MEM_PER_CORE: usize = 1000;

/// Number of events the local ring buffer of a core can hold.
pub const LOCAL_EVENTS_PER_CORE: usize = LOCAL_MEM_PER_CORE / EVENT_MAX_SIZE;

/// Number of polls made on a mutex byte before giving up.
pub const MUTEX_TRY_MAX: u32 = 5;

/// Maximum length of a platform name.
pub const PLATFORM_NAME_LENGTH: usize = 20;

/// Default number of logged cores.
pub const DEFAULT_CORES: u32 = 16;

/// Default byte budget for events in the shared segment (all cores).
pub const DEFAULT_SHARED_EVENT_BUDGET: usize = 1_000_000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/barelog/session.toml";
