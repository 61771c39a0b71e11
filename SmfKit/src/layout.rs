//! Byte layout of interleaved vertex records.
//!
//! A [`PackingLayout`] assigns each attribute a byte offset inside one vertex
//! record, in declaration order with no padding, and derives the vertex stride.
//!
//! ```
//! use smfkit::layout::PackingLayout;
//! use smfkit::model::Attribute;
//!
//! let layout = PackingLayout::new([
//!     Attribute::float("POSITION", 3, 32)?,
//!     Attribute::unsigned("COLOR", 4, 8)?,
//! ])?;
//! assert_eq!(layout.vertex_stride_octets(), 16);
//! assert_eq!(layout.packed("COLOR").map(|p| p.offset_octets()), Some(12));
//! # Ok::<(), smfkit::Error>(())
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::model::{Attribute, AttributeName, Header};

/// An attribute placed at a fixed offset within a vertex record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedAttribute {
    attribute: Attribute,
    order: usize,
    offset_octets: usize,
}

impl PackedAttribute {
    #[must_use]
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Zero-based declaration index.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    #[must_use]
    pub fn offset_octets(&self) -> usize {
        self.offset_octets
    }
}

/// Offsets and stride for an ordered set of attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingLayout {
    packed: Vec<PackedAttribute>,
    by_offset: BTreeMap<usize, usize>,
    by_name: HashMap<AttributeName, usize>,
    vertex_stride_octets: usize,
}

impl PackingLayout {
    /// Lay out `attributes` in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArithmeticOverflow`] if the stride does not fit in
    /// `usize`, and [`Error::DuplicateAttributeName`] or
    /// [`Error::DuplicateAttributeOffset`] if the result is not unique.
    pub fn new(attributes: impl IntoIterator<Item = Attribute>) -> Result<Self> {
        let mut packed = Vec::new();
        let mut offset: usize = 0;
        for (order, attribute) in attributes.into_iter().enumerate() {
            let size = attribute.size_octets();
            packed.push(PackedAttribute {
                attribute,
                order,
                offset_octets: offset,
            });
            offset = offset
                .checked_add(size)
                .ok_or(Error::ArithmeticOverflow {
                    context: "vertex stride",
                })?;
        }

        let mut by_offset = BTreeMap::new();
        let mut by_name = HashMap::with_capacity(packed.len());
        for (index, entry) in packed.iter().enumerate() {
            if by_offset.insert(entry.offset_octets, index).is_some() {
                return Err(Error::DuplicateAttributeOffset(entry.offset_octets));
            }
            if by_name
                .insert(entry.attribute.name().clone(), index)
                .is_some()
            {
                return Err(Error::DuplicateAttributeName(
                    entry.attribute.name().to_string(),
                ));
            }
        }

        Ok(Self {
            packed,
            by_offset,
            by_name,
            vertex_stride_octets: offset,
        })
    }

    /// Lay out every attribute of a header, in header order.
    pub fn from_header(header: &Header) -> Result<Self> {
        Self::new(header.attributes().cloned())
    }

    /// Lay out a subset of a header's attributes, in the order given by `names`.
    pub fn from_header_subset<'a>(
        header: &Header,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let attributes = names
            .into_iter()
            .map(|name| {
                header
                    .attribute(name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(attributes)
    }

    /// Packed attributes in layout order.
    #[must_use]
    pub fn packed_attributes(&self) -> &[PackedAttribute] {
        &self.packed
    }

    #[must_use]
    pub fn packed(&self, name: &str) -> Option<&PackedAttribute> {
        self.by_name.get(name).map(|&index| &self.packed[index])
    }

    #[must_use]
    pub fn packed_at_offset(&self, offset_octets: usize) -> Option<&PackedAttribute> {
        self.by_offset
            .get(&offset_octets)
            .map(|&index| &self.packed[index])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[must_use]
    pub fn vertex_stride_octets(&self) -> usize {
        self.vertex_stride_octets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packed.is_empty()
    }

    /// Absolute byte offset of `name` within vertex `vertex`.
    pub fn offset_octets_for(&self, name: &str, vertex: u64) -> Result<usize> {
        let packed = self
            .packed(name)
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))?;
        usize::try_from(vertex)
            .ok()
            .and_then(|v| v.checked_mul(self.vertex_stride_octets))
            .and_then(|base| base.checked_add(packed.offset_octets))
            .ok_or(Error::ArithmeticOverflow {
                context: "vertex offset",
            })
    }

    /// Size of a buffer holding `vertex_count` records.
    pub fn buffer_size_octets(&self, vertex_count: u64) -> Result<u64> {
        vertex_count
            .checked_mul(self.vertex_stride_octets as u64)
            .ok_or(Error::ArithmeticOverflow {
                context: "vertex buffer size",
            })
    }
}
