//! Text format of the diagnostic slot.
//!
//! The slot holds one ordinary [`EventRecord`] whose payload reads
//! `"<file>:<line>:<code>: <message>"`, cut at the payload capacity.

use crate::error::{BarelogError, STATUS_SUCCESS};
use crate::event::EventRecord;

/// Message recorded after a successful flush.
pub const FLUSH_SUCCESS_MESSAGE: &str = "flushing success";

/// Build the diagnostic record for `code` raised at `file:line`.
pub fn diagnostic_record(
    timestamp: u32,
    core: u32,
    file: &str,
    line: u32,
    code: i8,
    message: &str,
) -> EventRecord {
    let mut record =
        EventRecord::from_fmt(timestamp, format_args!("{file}:{line}:{code}: {message}"));
    record.core = core;
    record
}

/// Diagnostic record describing `error`.
pub fn error_record(
    timestamp: u32,
    core: u32,
    file: &str,
    line: u32,
    error: &BarelogError,
) -> EventRecord {
    let mut record = EventRecord::from_fmt(
        timestamp,
        format_args!("{file}:{line}:{}: {error}", error.code()),
    );
    record.core = core;
    record
}

/// A diagnostic record split back into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic<'a> {
    /// Source file of the report.
    pub file: &'a str,
    /// Source line of the report.
    pub line: u32,
    /// Status code; zero for success entries.
    pub code: i8,
    /// Free text, possibly truncated.
    pub message: &'a str,
}

impl<'a> Diagnostic<'a> {
    /// Parse a diagnostic record. `None` for an empty slot or a payload
    /// that does not follow the format.
    pub fn parse(record: &'a EventRecord) -> Option<Self> {
        let mut fields = record.payload_str()?.splitn(4, ':');
        let file = fields.next()?;
        let line = fields.next()?.parse().ok()?;
        let code = fields.next()?.parse().ok()?;
        let rest = fields.next()?;
        let message = rest.strip_prefix(' ').unwrap_or(rest);
        Some(Self {
            file,
            line,
            code,
            message,
        })
    }

    /// `true` when the entry reports a failure.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.code != STATUS_SUCCESS
    }
}
