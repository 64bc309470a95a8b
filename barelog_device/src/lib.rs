//! # barelog device side
//!
//! What runs on each compute core: a fixed-size ring buffer in private
//! memory, a flush engine that drains it into the core's slice of the shared
//! segment, a direct-write diagnostic slot and a small logger front end.
//!
//! Each core owns one [`DeviceMemManager`]; there is no process-wide state.
//! The injected [`barelog::boundary::SharedMemoryIo`] carries every access to
//! the slices and mutex bytes.
//!
//! ## Policies
//!
//! | situation               | `Skip`      | `Replace`      | `Flush`            | `Destroy`              |
//! |-------------------------|-------------|----------------|--------------------|------------------------|
//! | local buffer full       | drop event  | evict oldest   | drain, free slots  | drain, erase buffer    |
//! | slice lacks room        | no write    | rewind cursor  | configuration error| zero slice, rewind     |

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug;
pub mod logger;
pub mod manager;
pub mod ring_buffer;
pub mod slice;

pub use debug::DebugChannel;
pub use logger::Logger;
pub use manager::{DeviceMemManager, LocalBuffer};
pub use ring_buffer::{RingBuffer, wrap};
pub use slice::SharedSliceCursor;
