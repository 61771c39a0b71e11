//! Element indices and buffer cursors.

use crate::error::{Error, Result};

/// A bounded element index that never moves past the last element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementIndex {
    index: u64,
    count: u64,
}

impl ElementIndex {
    /// An index at element 0 of `count` elements.
    #[must_use]
    pub fn new(count: u64) -> Self {
        Self { index: 0, count }
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.index
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Move to the next element if one exists.
    ///
    /// Returns `false`, leaving the index on the last element, when the
    /// index is already at the end.
    pub fn try_advance(&mut self) -> bool {
        match self.index.checked_add(1) {
            Some(next) if next < self.count => {
                self.index = next;
                true
            }
            _ => false,
        }
    }
}

/// Read/write position within a buffer of fixed-stride elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    index: ElementIndex,
    stride_octets: usize,
    base_offset_octets: usize,
}

impl Cursor {
    /// A cursor over `count` elements of `stride_octets`, the first at `base_offset_octets`.
    #[must_use]
    pub fn new(count: u64, stride_octets: usize, base_offset_octets: usize) -> Self {
        Self {
            index: ElementIndex::new(count),
            stride_octets,
            base_offset_octets,
        }
    }

    #[must_use]
    pub fn index(&self) -> ElementIndex {
        self.index
    }

    #[must_use]
    pub fn stride_octets(&self) -> usize {
        self.stride_octets
    }

    /// Byte offset of the current element.
    pub fn offset_octets(&self) -> Result<usize> {
        usize::try_from(self.index.get())
            .ok()
            .and_then(|index| index.checked_mul(self.stride_octets))
            .and_then(|base| base.checked_add(self.base_offset_octets))
            .ok_or(Error::ArithmeticOverflow {
                context: "cursor offset",
            })
    }

    /// See [`ElementIndex::try_advance`].
    pub fn try_advance(&mut self) -> bool {
        self.index.try_advance()
    }
}
