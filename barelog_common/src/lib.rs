//! # barelog common library
//!
//! Types both sides of a barelog session agree on: the fixed-size event
//! record, the partition of the shared segment, overflow policies, status
//! codes, and the capabilities a platform binding injects.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐         ┌──────────────────┐        ┌──────────────────┐
//! │ device core k        │  flush  │ shared segment   │  read  │ host             │
//! │ local ring buffer ───┼────────►│ [mutex|dbg|slice]├───────►│ HostMemManager   │
//! │ (barelog_device)     │ write() │ (layout)         │ read() │ (barelog_host)   │
//! └──────────────────────┘         └──────────────────┘        └──────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`consts`] - compile-time budgets
//! - [`config`] - TOML session configuration
//! - [`error`] - error enum and status codes
//! - [`event`] - event record and rendering
//! - [`diagnostic`] - text format of the diagnostic slot
//! - [`layout`] - partition of the shared segment
//! - [`boundary`] - injected read/write/map/clock capabilities
//! - [`sync`] - cooperative mutex bytes
//! - [`platform`] - simulated memory-mapped platform
//! - [`prelude`] - common re-exports

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod config;
pub mod consts;
pub mod diagnostic;
pub mod error;
pub mod event;
pub mod layout;
pub mod mem_space;
pub mod platform;
pub mod policy;
pub mod prelude;
pub mod sync;

pub use error::{BarelogError, BarelogResult};

/// Install the fmt tracing subscriber, filtered by `RUST_LOG`.
///
/// A second call keeps the first subscriber.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
