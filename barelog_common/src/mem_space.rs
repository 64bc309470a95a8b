//! Memory spaces and the platform descriptor.
//!
//! A [`MemSpace`] describes one chunk of the shared memory: where it lives in
//! the physical address space of the interconnect and, once mapped, where the
//! current side can touch it directly.

use crate::consts::PLATFORM_NAME_LENGTH;
use crate::error::{BarelogError, BarelogResult};

/// Address in the shared address space (physical or mapped).
pub type Address = usize;

/// Word size hint: single bytes.
pub const WORD_SIZE_BYTE: u8 = 0;
/// Word size hint: one machine word.
pub const WORD_SIZE_WORD: u8 = 1;
/// Word size hint: two machine words.
pub const WORD_SIZE_DOUBLE_WORD: u8 = 2;

/// One chunk of shared memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemSpace {
    /// Physical base address, as seen by the interconnect.
    pub phy_base: Address,
    base: Option<Address>,
    /// Length in bytes.
    pub length: usize,
    /// Preferred alignment of data in this space (hint only).
    pub alignment: u8,
    /// Word size of this space (hint only).
    pub word_size: u8,
}

impl MemSpace {
    /// Describe a space by its physical range. It has no usable base until
    /// mapped.
    pub const fn new(phy_base: Address, length: usize) -> Self {
        Self {
            phy_base,
            base: None,
            length,
            alignment: 1,
            word_size: WORD_SIZE_WORD,
        }
    }

    /// Describe a space that is already directly addressable at `base`.
    ///
    /// # Safety
    /// `base` must be valid for reads and writes of `length` bytes for as
    /// long as this space (or any copy of it) is used.
    pub const unsafe fn mapped(phy_base: Address, base: Address, length: usize) -> Self {
        Self {
            phy_base,
            base: Some(base),
            length,
            alignment: 1,
            word_size: WORD_SIZE_WORD,
        }
    }

    /// Set the alignment and word size hints.
    pub const fn with_hints(mut self, alignment: u8, word_size: u8) -> Self {
        self.alignment = alignment;
        self.word_size = word_size;
        self
    }

    /// Usable base address, if this space is mapped.
    #[inline]
    pub const fn base(&self) -> Option<Address> {
        self.base
    }

    /// Sub-space starting `offset` bytes in, `length` bytes long.
    ///
    /// Hints and the mapping carry over.
    pub fn sub_space(&self, offset: usize, length: usize) -> BarelogResult<Self> {
        if offset.checked_add(length).is_none_or(|end| end > self.length) {
            return Err(BarelogError::InconsistentParameter {
                what: "sub-space outside its parent space",
            });
        }
        Ok(Self {
            phy_base: self.phy_base + offset,
            base: self.base.map(|b| b + offset),
            length,
            alignment: self.alignment,
            word_size: self.word_size,
        })
    }
}

/// Platform a session logs on: a name and the whole shared region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Human-readable platform name.
    pub name: heapless::String<PLATFORM_NAME_LENGTH>,
    /// Shared region available to the session.
    pub mem_space: MemSpace,
}

impl Platform {
    /// Build a platform descriptor.
    ///
    /// # Errors
    /// `InconsistentParameter` if `name` is longer than
    /// [`PLATFORM_NAME_LENGTH`] bytes.
    pub fn new(name: &str, mem_space: MemSpace) -> BarelogResult<Self> {
        let mut owned = heapless::String::new();
        owned
            .push_str(name)
            .map_err(|_| BarelogError::InconsistentParameter {
                what: "platform name too long",
            })?;
        Ok(Self {
            name: owned,
            mem_space,
        })
    }
}
