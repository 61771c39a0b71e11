//! Mesh headers.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::attribute::Attribute;
use super::coords::CoordinateSystem;
use super::names::{AttributeName, SchemaName};
use crate::error::{Error, Result};

/// Byte order of vertex and triangle payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl DataByteOrder {
    /// The byte order of the host.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::LittleEndian
        } else {
            Self::BigEndian
        }
    }

    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::BigEndian),
            1 => Ok(Self::LittleEndian),
            other => Err(Error::InvalidByteOrder(other)),
        }
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::BigEndian => 0,
            Self::LittleEndian => 1,
        }
    }
}

/// A schema name with a version, used to tag meshes and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SchemaIdentifier {
    pub name: SchemaName,
    pub version_major: u32,
    pub version_minor: u32,
}

impl SchemaIdentifier {
    pub fn new(name: &str, version_major: u32, version_minor: u32) -> Result<Self> {
        Ok(Self {
            name: SchemaName::new(name)?,
            version_major,
            version_minor,
        })
    }
}

impl fmt::Display for SchemaIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.name, self.version_major, self.version_minor)
    }
}

/// Triangle count and index width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Triangles {
    count: u64,
    index_size_bits: u32,
}

impl Triangles {
    /// Create a triangle descriptor; the index size must be 8, 16, 32 or 64.
    pub fn new(count: u64, index_size_bits: u32) -> Result<Self> {
        if !matches!(index_size_bits, 8 | 16 | 32 | 64) {
            return Err(Error::InvalidTriangleIndexSize(index_size_bits));
        }
        Ok(Self {
            count,
            index_size_bits,
        })
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn index_size_bits(&self) -> u32 {
        self.index_size_bits
    }

    /// Octets per index.
    #[must_use]
    pub fn index_size_octets(&self) -> u64 {
        u64::from(self.index_size_bits / 8)
    }

    /// Octets per triangle (three indices).
    #[must_use]
    pub fn triangle_size_octets(&self) -> u64 {
        self.index_size_octets() * 3
    }
}

impl Default for Triangles {
    fn default() -> Self {
        Self {
            count: 0,
            index_size_bits: 32,
        }
    }
}

/// An immutable mesh header.
///
/// Built once, then consumed read-only by layouts, packers, parsers and
/// serializers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    schema_identifier: Option<SchemaIdentifier>,
    coordinate_system: CoordinateSystem,
    vertex_count: u64,
    triangles: Triangles,
    data_byte_order: DataByteOrder,
    attributes: IndexMap<AttributeName, Attribute>,
}

impl Header {
    #[must_use]
    pub fn builder() -> HeaderBuilder {
        HeaderBuilder::default()
    }

    #[must_use]
    pub fn schema_identifier(&self) -> Option<&SchemaIdentifier> {
        self.schema_identifier.as_ref()
    }

    #[must_use]
    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }

    #[must_use]
    pub fn vertex_count(&self) -> u64 {
        self.vertex_count
    }

    #[must_use]
    pub fn triangles(&self) -> Triangles {
        self.triangles
    }

    #[must_use]
    pub fn data_byte_order(&self) -> DataByteOrder {
        self.data_byte_order
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> impl ExactSizeIterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Position of an attribute in declaration order.
    #[must_use]
    pub fn attribute_index(&self, name: &AttributeName) -> Option<usize> {
        self.attributes.get_index_of(name)
    }

    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Start a builder seeded with this header's fields.
    #[must_use]
    pub fn to_builder(&self) -> HeaderBuilder {
        HeaderBuilder {
            schema_identifier: self.schema_identifier.clone(),
            coordinate_system: self.coordinate_system,
            vertex_count: self.vertex_count,
            triangle_count: self.triangles.count,
            triangle_index_size_bits: self.triangles.index_size_bits,
            data_byte_order: self.data_byte_order,
            attributes: self.attributes.values().cloned().collect(),
        }
    }
}

/// Incremental [`Header`] construction.
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    schema_identifier: Option<SchemaIdentifier>,
    coordinate_system: CoordinateSystem,
    vertex_count: u64,
    triangle_count: u64,
    triangle_index_size_bits: u32,
    data_byte_order: DataByteOrder,
    attributes: Vec<Attribute>,
}

impl Default for HeaderBuilder {
    fn default() -> Self {
        Self {
            schema_identifier: None,
            coordinate_system: CoordinateSystem::default(),
            vertex_count: 0,
            triangle_count: 0,
            triangle_index_size_bits: 32,
            data_byte_order: DataByteOrder::default(),
            attributes: Vec::new(),
        }
    }
}

impl HeaderBuilder {
    #[must_use]
    pub fn with_schema_identifier(mut self, schema: Option<SchemaIdentifier>) -> Self {
        self.schema_identifier = schema;
        self
    }

    #[must_use]
    pub fn with_coordinate_system(mut self, system: CoordinateSystem) -> Self {
        self.coordinate_system = system;
        self
    }

    #[must_use]
    pub fn with_vertex_count(mut self, count: u64) -> Self {
        self.vertex_count = count;
        self
    }

    #[must_use]
    pub fn with_triangles(mut self, count: u64, index_size_bits: u32) -> Self {
        self.triangle_count = count;
        self.triangle_index_size_bits = index_size_bits;
        self
    }

    #[must_use]
    pub fn with_data_byte_order(mut self, order: DataByteOrder) -> Self {
        self.data_byte_order = order;
        self
    }

    /// Append an attribute; order of calls is declaration order.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Freeze the header, rejecting duplicate attribute names and bad triangle widths.
    pub fn build(self) -> Result<Header> {
        let triangles = Triangles::new(self.triangle_count, self.triangle_index_size_bits)?;

        let mut attributes = IndexMap::with_capacity(self.attributes.len());
        for attribute in self.attributes {
            let name = attribute.name().clone();
            if attributes.contains_key(&name) {
                return Err(Error::DuplicateAttributeName(name.to_string()));
            }
            attributes.insert(name, attribute);
        }

        Ok(Header {
            schema_identifier: self.schema_identifier,
            coordinate_system: self.coordinate_system,
            vertex_count: self.vertex_count,
            triangles,
            data_byte_order: self.data_byte_order,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_preserves_order() {
        let header = Header::builder()
            .with_vertex_count(4)
            .with_attribute(Attribute::float("POSITION", 3, 32).unwrap())
            .with_attribute(Attribute::float("NORMAL", 3, 32).unwrap())
            .with_attribute(Attribute::unsigned("COLOR", 4, 8).unwrap())
            .build()
            .unwrap();

        let names: Vec<&str> = header.attributes().map(|a| a.name().as_str()).collect();
        assert_eq!(names, ["POSITION", "NORMAL", "COLOR"]);
        assert_eq!(header.attribute("COLOR").unwrap().size_octets(), 4);
        assert_eq!(header.triangles().index_size_bits(), 32);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = Header::builder()
            .with_attribute(Attribute::float("POSITION", 3, 32).unwrap())
            .with_attribute(Attribute::signed("POSITION", 1, 8).unwrap())
            .build();
        assert!(matches!(result, Err(Error::DuplicateAttributeName(name)) if name == "POSITION"));
    }

    #[test]
    fn test_bad_triangle_width_rejected() {
        let result = Header::builder().with_triangles(1, 12).build();
        assert!(matches!(result, Err(Error::InvalidTriangleIndexSize(12))));
    }

    #[test]
    fn test_triangle_sizes() {
        let triangles = Triangles::new(5, 16).unwrap();
        assert_eq!(triangles.triangle_size_octets(), 6);
    }
}
