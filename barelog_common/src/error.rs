//! Error and status types shared by the device and host sides.
//!
//! Errors map one-to-one onto the small signed status codes that the
//! diagnostic slot records (see [`BarelogError::code`]).

use crate::config::ConfigError;
use crate::policy::{OverflowPolicy, PolicyLayer};
use thiserror::Error;

/// Status code of a successful operation.
pub const STATUS_SUCCESS: i8 = 0;

/// Errors that can occur during barelog operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarelogError {
    /// Unspecified failure
    #[error("Generic failure")]
    Generic,

    /// A parameter was missing or the manager is in the wrong init state
    #[error("Uninitialized parameter: {what}")]
    UninitializedParameter {
        /// What was missing
        what: &'static str,
    },

    /// A parameter was out of range (event count, core id, ...)
    #[error("Inconsistent parameter: {what}")]
    InconsistentParameter {
        /// What was wrong
        what: &'static str,
    },

    /// The injected write primitive failed
    #[error("Shared memory write failed at {address:#x} ({size} bytes)")]
    SharedMemoryWrite {
        /// Target address
        address: usize,
        /// Bytes requested
        size: usize,
    },

    /// The injected read primitive failed
    #[error("Shared memory read failed at {address:#x} ({size} bytes)")]
    SharedMemoryRead {
        /// Source address
        address: usize,
        /// Bytes requested
        size: usize,
    },

    /// Mutex byte stayed taken for the whole retry budget
    #[error("Mutex at {address:#x} still held after {attempts} attempts")]
    MutexTimeout {
        /// Mutex byte address
        address: usize,
        /// Polls made
        attempts: u32,
    },

    /// An event could not be rendered as a string
    #[error("Event conversion failed at index {index}")]
    EventConversion {
        /// Index of the offending event
        index: usize,
    },

    /// Shared segment could not be partitioned or mapped
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Failure description
        reason: String,
    },

    /// Policy has no meaning at the layer it was configured for
    #[error("Policy {policy:?} is not supported for the {layer:?} layer")]
    UnsupportedPolicy {
        /// Buffering layer
        layer: PolicyLayer,
        /// Rejected policy
        policy: OverflowPolicy,
    },

    /// Session configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BarelogError {
    /// Signed status code for this error.
    ///
    /// Configuration problems share the initialization code.
    pub const fn code(&self) -> i8 {
        match self {
            Self::Generic => -1,
            Self::UninitializedParameter { .. } => -2,
            Self::InconsistentParameter { .. } => -3,
            Self::SharedMemoryWrite { .. } => -4,
            Self::SharedMemoryRead { .. } => -5,
            Self::MutexTimeout { .. } => -6,
            Self::EventConversion { .. } => -7,
            Self::Initialization { .. } | Self::UnsupportedPolicy { .. } | Self::Config(_) => -8,
        }
    }
}

/// Result type for barelog operations
pub type BarelogResult<T> = Result<T, BarelogError>;

/// Collapse a result into its status code.
pub fn status_code<T>(result: &BarelogResult<T>) -> i8 {
    match result {
        Ok(_) => STATUS_SUCCESS,
        Err(e) => e.code(),
    }
}
