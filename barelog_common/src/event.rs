//! Event records: the unit of data moved from device cores to the host.
//!
//! ## Binary layout
//!
//! ```text
//! offset  size  field
//! 0       4     timestamp   (u32, native endian)
//! 4       4     core id     (u32, native endian)
//! 8       92    payload     (NUL-terminated when shorter than 92 bytes)
//! ```
//!
//! The record is `#[repr(C)]` with no padding, so a slice of records is a
//! contiguous byte range that can be handed directly to the write primitive.
//! The all-zero record (timestamp 0, core 0, empty payload) means "no event".

use crate::consts::{EVENT_MAX_SIZE, EVENT_PAYLOAD_SIZE, EVENT_STRING_SIZE};
use crate::error::{BarelogError, BarelogResult};
use core::fmt::{self, Write as _};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use static_assertions::const_assert_eq;

/// Fixed-capacity buffer an event is rendered into.
pub type EventString = heapless::String<EVENT_STRING_SIZE>;

/// One logged event.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct EventRecord {
    /// Clock reading of the producer when the event was logged.
    pub timestamp: u32,
    /// Producing core, stamped by the local buffer.
    pub core: u32,
    data: [u8; EVENT_PAYLOAD_SIZE],
}

const_assert_eq!(core::mem::size_of::<EventRecord>(), EVENT_MAX_SIZE);
const_assert_eq!(core::mem::align_of::<EventRecord>(), 4);

impl EventRecord {
    /// The "no event" record.
    pub const ZERO: Self = Self {
        timestamp: 0,
        core: 0,
        data: [0; EVENT_PAYLOAD_SIZE],
    };

    /// Build a record with the given payload.
    ///
    /// # Errors
    /// `InconsistentParameter` if the payload exceeds [`EVENT_PAYLOAD_SIZE`].
    pub fn new(timestamp: u32, payload: &str) -> BarelogResult<Self> {
        let bytes = payload.as_bytes();
        if bytes.len() > EVENT_PAYLOAD_SIZE {
            return Err(BarelogError::InconsistentParameter {
                what: "event payload exceeds capacity",
            });
        }
        let mut event = Self::ZERO;
        event.timestamp = timestamp;
        event.data[..bytes.len()].copy_from_slice(bytes);
        Ok(event)
    }

    /// Build a record, cutting the payload at capacity.
    pub fn truncated(timestamp: u32, payload: &[u8]) -> Self {
        let len = payload.len().min(EVENT_PAYLOAD_SIZE);
        let mut event = Self::ZERO;
        event.timestamp = timestamp;
        event.data[..len].copy_from_slice(&payload[..len]);
        event
    }

    /// Build a record from formatting arguments, cutting the payload at
    /// capacity. Never allocates.
    pub fn from_fmt(timestamp: u32, args: fmt::Arguments<'_>) -> Self {
        let mut event = Self::ZERO;
        event.timestamp = timestamp;
        let mut writer = PayloadWriter {
            data: &mut event.data,
            len: 0,
        };
        // The writer never reports an error; it drops what does not fit.
        let _ = writer.write_fmt(args);
        event
    }

    /// Payload bytes, up to the first NUL.
    pub fn payload(&self) -> &[u8] {
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(EVENT_PAYLOAD_SIZE);
        &self.data[..end]
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(self.payload()).ok()
    }

    /// `true` when the payload is the empty string.
    ///
    /// This is what the host reader treats as end of stream.
    #[inline]
    pub fn has_empty_payload(&self) -> bool {
        self.data[0] == 0
    }

    /// `true` for the all-zero "no event" record.
    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Render as `"<timestamp> <core> <payload>"` into `out`.
    ///
    /// Returns the rendered length. Invalid UTF-8 in the payload is rendered
    /// as replacement characters.
    ///
    /// # Errors
    /// `InconsistentParameter` if `check` is set and the payload cannot fit
    /// the conversion capacity, or if the rendered text overflows `out`.
    pub fn render(&self, out: &mut EventString, check: bool) -> BarelogResult<usize> {
        const OVERFLOW: BarelogError = BarelogError::InconsistentParameter {
            what: "rendered event exceeds conversion capacity",
        };

        if check && self.payload().len() > EVENT_STRING_SIZE {
            return Err(OVERFLOW);
        }

        out.clear();
        write!(out, "{} {} ", self.timestamp, self.core).map_err(|_| OVERFLOW)?;
        for chunk in self.payload().utf8_chunks() {
            out.push_str(chunk.valid()).map_err(|_| OVERFLOW)?;
            if !chunk.invalid().is_empty() {
                out.push(char::REPLACEMENT_CHARACTER).map_err(|_| OVERFLOW)?;
            }
        }
        Ok(out.len())
    }

    /// Slice of records viewed as its raw bytes.
    pub fn as_bytes(records: &[Self]) -> &[u8] {
        // SAFETY: `EventRecord` is `repr(C)`, made of `u32`s and bytes, and
        // asserted above to have no padding, so every byte is initialized.
        unsafe {
            core::slice::from_raw_parts(
                records.as_ptr().cast::<u8>(),
                core::mem::size_of_val(records),
            )
        }
    }

    /// Slice of records viewed as mutable raw bytes.
    pub fn as_bytes_mut(records: &mut [Self]) -> &mut [u8] {
        // SAFETY: as for `as_bytes`; any bit pattern is a valid record.
        unsafe {
            core::slice::from_raw_parts_mut(
                records.as_mut_ptr().cast::<u8>(),
                core::mem::size_of_val(records),
            )
        }
    }
}

/// Truncating `fmt::Write` sink over a payload array.
struct PayloadWriter<'a> {
    data: &'a mut [u8; EVENT_PAYLOAD_SIZE],
    len: usize,
}

impl fmt::Write for PayloadWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = EVENT_PAYLOAD_SIZE - self.len;
        let mut take = s.len().min(room);
        // Keep the payload valid UTF-8 when cutting.
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.data[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

impl Default for EventRecord {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRecord")
            .field("timestamp", &self.timestamp)
            .field("core", &self.core)
            .field("payload", &String::from_utf8_lossy(self.payload()))
            .finish()
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp,
            self.core,
            String::from_utf8_lossy(self.payload())
        )
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("EventRecord", 3)?;
        s.serialize_field("timestamp", &self.timestamp)?;
        s.serialize_field("core", &self.core)?;
        s.serialize_field("payload", &String::from_utf8_lossy(self.payload()))?;
        s.end()
    }
}

/// Render every record into its own string.
///
/// # Errors
/// - `Generic` if the output vector cannot be allocated
/// - `EventConversion` (with the failing index) if any record fails to render
pub fn events_to_strings(events: &[EventRecord], check: bool) -> BarelogResult<Vec<String>> {
    let mut out = Vec::new();
    out.try_reserve_exact(events.len())
        .map_err(|_| BarelogError::Generic)?;

    let mut buffer = EventString::new();
    for (index, event) in events.iter().enumerate() {
        event
            .render(&mut buffer, check)
            .map_err(|_| BarelogError::EventConversion { index })?;
        out.push(buffer.as_str().to_owned());
    }
    Ok(out)
}
