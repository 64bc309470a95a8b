//! Platform bindings.
//!
//! Only the simulated platform lives here: an anonymous mapping standing in
//! for the shared DRAM of a many-core board, with the reference copy
//! primitives and mapper on top. Hardware bindings implement the traits of
//! [`crate::boundary`] out of tree.

pub mod mmap;

pub use mmap::{DirectCopy, MmapSegment, SegmentHandle, SegmentMapper};
