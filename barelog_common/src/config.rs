//! Configuration loading traits and types.
//!
//! This module provides the TOML configuration of a logging session. The
//! shape of the shared segment and both overflow policies are resolved once
//! from it when a manager is constructed; nothing here is re-read at runtime.
//!
//! # Usage
//!
//! ```rust,no_run
//! use barelog_common::config::{ConfigLoader, SessionConfig, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = SessionConfig::load(Path::new("session.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{DEFAULT_CORES, DEFAULT_SHARED_EVENT_BUDGET, EVENT_MAX_SIZE};
use crate::policy::{OverflowPolicy, PolicyLayer};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging and for the device logger threshold.
///
/// Ordered by severity: `Trace < Debug < Info < Warn < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

/// Common configuration fields shared across barelog programs.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "barelog-host"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

bitflags! {
    /// Optional behaviors of a session, resolved once at construction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SessionModes: u8 {
        /// Guard shared slices with one mutex byte per core.
        const SAFE = 0b0000_0001;
        /// Reserve a diagnostic slot holding the most recent error.
        const DEBUG = 0b0000_0010;
        /// Validate operation parameters.
        const CHECK = 0b0000_0100;
    }
}

/// Shape of the shared segment and the overflow policies of a session.
///
/// # TOML Example
///
/// ```toml
/// [session]
/// cores = 16
/// shared_event_budget = 1000000
/// safe_mode = false
/// debug_mode = true
/// check_mode = true
/// buffer_policy = "replace"
/// memory_policy = "skip"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Number of logged cores.
    pub cores: u32,
    /// Bytes of the shared segment given to events, split evenly per core.
    pub shared_event_budget: usize,
    /// Host/device mutex bytes in front of the segment.
    pub safe_mode: bool,
    /// Diagnostic slot after the mutex bytes.
    pub debug_mode: bool,
    /// Defensive parameter checks.
    pub check_mode: bool,
    /// Policy of the local ring buffer.
    pub buffer_policy: OverflowPolicy,
    /// Policy of the shared slice.
    pub memory_policy: OverflowPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cores: DEFAULT_CORES,
            shared_event_budget: DEFAULT_SHARED_EVENT_BUDGET,
            safe_mode: false,
            debug_mode: true,
            check_mode: true,
            buffer_policy: OverflowPolicy::Replace,
            memory_policy: OverflowPolicy::Replace,
        }
    }
}

impl SessionSettings {
    /// Resolve the mode switches into flags.
    pub fn modes(&self) -> SessionModes {
        let mut modes = SessionModes::empty();
        modes.set(SessionModes::SAFE, self.safe_mode);
        modes.set(SessionModes::DEBUG, self.debug_mode);
        modes.set(SessionModes::CHECK, self.check_mode);
        modes
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `cores` is zero
    /// - a per-core slice cannot hold a single event
    /// - `memory_policy` is `flush`, which has no meaning for a shared slice
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cores == 0 {
            return Err(ConfigError::ValidationError(
                "cores must be at least 1".to_string(),
            ));
        }
        if self.shared_event_budget / self.cores as usize / EVENT_MAX_SIZE == 0 {
            return Err(ConfigError::ValidationError(format!(
                "shared_event_budget {} leaves less than one {}-byte event per core",
                self.shared_event_budget, EVENT_MAX_SIZE
            )));
        }
        if !self.memory_policy.is_supported_on(PolicyLayer::SharedSlice) {
            return Err(ConfigError::ValidationError(format!(
                "memory_policy {:?} is not supported for shared slices",
                self.memory_policy
            )));
        }
        Ok(())
    }
}

/// Full configuration file of a logging session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Common fields.
    pub shared: SharedConfig,
    /// Segment shape and policies.
    #[serde(default)]
    pub session: SessionSettings,
}

impl SessionConfig {
    /// Validate both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.session.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_defaults_match_reference_platform() {
        let s = SessionSettings::default();
        assert_eq!(s.cores, 16);
        assert_eq!(s.shared_event_budget, 1_000_000);
        assert_eq!(s.modes(), SessionModes::DEBUG | SessionModes::CHECK);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_flush_memory_policy_rejected() {
        let s = SessionSettings {
            memory_policy: OverflowPolicy::Flush,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_cores_rejected() {
        let s = SessionSettings {
            cores: 0,
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_tiny_budget_rejected() {
        let s = SessionSettings {
            cores: 4,
            shared_event_budget: 399,
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_load_session_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[shared]
log_level = "debug"
service_name = "barelog-test"

[session]
cores = 4
safe_mode = true
memory_policy = "skip"
"#
        )
        .unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.session.cores, 4);
        assert_eq!(config.session.memory_policy, OverflowPolicy::Skip);
        assert_eq!(config.session.buffer_policy, OverflowPolicy::Replace);
        assert!(config.session.modes().contains(SessionModes::SAFE));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let result = SessionConfig::load(Path::new("/nonexistent/barelog.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[shared\nservice_name = ").unwrap();
        let result = SessionConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_empty_service_name_rejected() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: String::new(),
        };
        assert!(config.validate().is_err());
    }
}
