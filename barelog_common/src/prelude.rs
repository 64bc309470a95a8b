//! Prelude module for common re-exports.
//!
//! ```rust
//! use barelog_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, SessionConfig, SessionModes, SessionSettings, SharedConfig,
};
pub use crate::policy::{OverflowPolicy, PolicyLayer};

// ─── Budgets ────────────────────────────────────────────────────────
pub use crate::consts::{
    EVENT_MAX_SIZE, EVENT_PAYLOAD_SIZE, EVENT_STRING_SIZE, LOCAL_EVENTS_PER_CORE, MUTEX_TRY_MAX,
};

// ─── Events & errors ────────────────────────────────────────────────
pub use crate::error::{BarelogError, BarelogResult, STATUS_SUCCESS, status_code};
pub use crate::diagnostic::Diagnostic;
pub use crate::event::{EventRecord, EventString, events_to_strings};

// ─── Shared segment ─────────────────────────────────────────────────
pub use crate::boundary::{Clock, MemoryMapper, SharedMemoryIo, SharedRead, SharedWrite, ZeroClock};
pub use crate::layout::{Region, RegionKind, SharedLayout};
pub use crate::mem_space::{Address, MemSpace, Platform};
pub use crate::sync::SharedMutex;
