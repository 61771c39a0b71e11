//! Whole-mesh reading and writing.
//!
//! [`MemoryMesh`] keeps every attribute as a flat array of widened values,
//! which is convenient for tools and tests but not for rendering; use
//! [`PackedMeshLoader`](crate::packer::PackedMeshLoader) for that.

use std::io::{Read, Write};

use indexmap::IndexMap;
use serde::Serialize;

use crate::binary::{BinaryParser, BinarySerializer};
use crate::error::{Error, ParseError, ParseWarning, Result};
use crate::events::{
    AttributeValueEvents, BodyEvents, ErrorEvents, HeaderEvents, MetadataEvents,
    NonInterleavedEvents, ParserEvents, Receive, TriangleEvents,
};
use crate::model::{
    Attribute, AttributeName, ComponentType, FormatVersion, Header, SchemaIdentifier,
};

/// Flattened component values of one attribute, `vertex_count × component_count` long.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "kebab-case")]
pub enum AttributeValues {
    Floating(Vec<f64>),
    Signed(Vec<i64>),
    Unsigned(Vec<u64>),
}

impl AttributeValues {
    /// An empty array matching the attribute's component type.
    #[must_use]
    pub fn for_attribute(attribute: &Attribute) -> Self {
        match attribute.component_type() {
            ComponentType::Float => Self::Floating(Vec::new()),
            ComponentType::SignedInteger => Self::Signed(Vec::new()),
            ComponentType::UnsignedInteger => Self::Unsigned(Vec::new()),
        }
    }

    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Floating(_) => ComponentType::Float,
            Self::Signed(_) => ComponentType::SignedInteger,
            Self::Unsigned(_) => ComponentType::UnsignedInteger,
        }
    }

    /// Number of components stored.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Floating(v) => v.len(),
            Self::Signed(v) => v.len(),
            Self::Unsigned(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fully decoded mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryMesh {
    header: Header,
    attributes: IndexMap<AttributeName, AttributeValues>,
    triangles: Vec<[u64; 3]>,
    metadata: Vec<(SchemaIdentifier, Vec<u8>)>,
}

impl MemoryMesh {
    /// An empty mesh for `header`. Values must be supplied before writing.
    #[must_use]
    pub fn new(header: Header) -> Self {
        Self {
            header,
            attributes: IndexMap::new(),
            triangles: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Parse a complete stream.
    pub fn read<R: Read>(reader: R) -> std::result::Result<Self, Vec<ParseError>> {
        let mut producer = MemoryMeshProducer::default();
        BinaryParser::new(reader).parse(&mut producer);
        producer.into_mesh()
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn attribute_values(&self, name: &str) -> Option<&AttributeValues> {
        self.attributes.get(name)
    }

    /// Decoded attributes in stream order.
    pub fn attributes(&self) -> impl Iterator<Item = (&AttributeName, &AttributeValues)> {
        self.attributes.iter()
    }

    #[must_use]
    pub fn triangles(&self) -> &[[u64; 3]] {
        &self.triangles
    }

    #[must_use]
    pub fn metadata(&self) -> &[(SchemaIdentifier, Vec<u8>)] {
        &self.metadata
    }

    /// Set the values of a header attribute.
    ///
    /// The array must match the attribute's component type and hold exactly
    /// `vertex_count × component_count` components.
    pub fn set_attribute(&mut self, name: &str, values: AttributeValues) -> Result<()> {
        let attribute = self
            .header
            .attribute(name)
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))?;
        if values.component_type() != attribute.component_type() {
            return Err(Error::IncorrectType {
                attribute: name.to_string(),
                expected: attribute.shape(),
                received: values.component_type().name().to_string(),
            });
        }

        let count = u64::from(attribute.component_count());
        let expected = self.header.vertex_count();
        let received = values.len() as u64 / count;
        if values.len() as u64 % count != 0 || received < expected {
            return Err(Error::TooFewVertices {
                attribute: name.to_string(),
                expected,
                received,
            });
        }
        if received > expected {
            return Err(Error::TooManyVertices {
                attribute: name.to_string(),
                expected,
            });
        }

        self.attributes.insert(attribute.name().clone(), values);
        Ok(())
    }

    pub fn set_triangles(&mut self, triangles: Vec<[u64; 3]>) -> Result<()> {
        let expected = self.header.triangles().count();
        let received = triangles.len() as u64;
        if received > expected {
            return Err(Error::TooManyTriangles { expected });
        }
        if received < expected {
            return Err(Error::TooFewTriangles { expected, received });
        }
        self.triangles = triangles;
        Ok(())
    }

    pub fn add_metadata(&mut self, schema: SchemaIdentifier, data: Vec<u8>) {
        self.metadata.push((schema, data));
    }

    /// Write the mesh as one complete stream and return the writer.
    pub fn write_to<W: Write>(&self, mut serializer: BinarySerializer<W>) -> Result<W> {
        serializer.serialize_header(&self.header)?;

        if self.header.vertex_count() != 0 && self.header.attribute_count() != 0 {
            let mut vertices = serializer.serialize_vertices_non_interleaved()?;
            for attribute in self.header.attributes() {
                let name = attribute.name().as_str();
                let values = self.attributes.get(name).ok_or_else(|| Error::TooFewVertices {
                    attribute: name.to_string(),
                    expected: self.header.vertex_count(),
                    received: 0,
                })?;
                let count = attribute.component_count() as usize;
                let mut writer = vertices.attribute(name)?;
                match values {
                    AttributeValues::Floating(v) => {
                        v.chunks(count).try_for_each(|c| writer.write_slice(c))?;
                    }
                    AttributeValues::Signed(v) => {
                        v.chunks(count).try_for_each(|c| writer.write_slice(c))?;
                    }
                    AttributeValues::Unsigned(v) => {
                        v.chunks(count).try_for_each(|c| writer.write_slice(c))?;
                    }
                }
                writer.finish()?;
            }
            vertices.finish()?;
        }

        if self.header.triangles().count() != 0 {
            let mut writer = serializer.serialize_triangles()?;
            for &[v0, v1, v2] in &self.triangles {
                writer.triangle(v0, v1, v2)?;
            }
            writer.finish()?;
        }

        for (schema, data) in &self.metadata {
            serializer.serialize_metadata(schema, data)?;
        }

        serializer.finish()
    }
}

/// Receiver that decodes a stream into a [`MemoryMesh`].
#[derive(Debug, Default)]
pub struct MemoryMeshProducer {
    version: Option<FormatVersion>,
    mesh: Option<MemoryMesh>,
    current: Option<(AttributeName, AttributeValues)>,
    errors: Vec<ParseError>,
    warnings: Vec<ParseWarning>,
}

impl MemoryMeshProducer {
    #[must_use]
    pub fn version(&self) -> Option<FormatVersion> {
        self.version
    }

    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    #[must_use]
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// The decoded mesh, or every error reported while parsing.
    pub fn into_mesh(self) -> std::result::Result<MemoryMesh, Vec<ParseError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        self.mesh.ok_or_else(|| {
            vec![ParseError::unpositioned(Error::SerializerState(
                "no header was parsed",
            ))]
        })
    }

    fn push<T>(&mut self, values: &[T], select: fn(&mut AttributeValues) -> Option<&mut Vec<T>>)
    where
        T: Copy,
    {
        if let Some((_, array)) = &mut self.current {
            if let Some(target) = select(array) {
                target.extend_from_slice(values);
            }
        }
    }
}

impl ErrorEvents for MemoryMeshProducer {
    fn on_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn on_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }
}

impl ParserEvents for MemoryMeshProducer {
    fn on_version_received(&mut self, version: FormatVersion) -> Receive<&mut dyn HeaderEvents> {
        self.version = Some(version);
        Receive::Accepted(self)
    }
}

impl HeaderEvents for MemoryMeshProducer {
    fn on_header_parsed(&mut self, header: &Header) -> Receive<&mut dyn BodyEvents> {
        self.mesh = Some(MemoryMesh::new(header.clone()));
        Receive::Accepted(self)
    }
}

impl BodyEvents for MemoryMeshProducer {
    fn on_vertices_non_interleaved(&mut self) -> Receive<&mut dyn NonInterleavedEvents> {
        Receive::Accepted(self)
    }

    fn on_triangles(&mut self) -> Receive<&mut dyn TriangleEvents> {
        Receive::Accepted(self)
    }

    fn on_metadata(
        &mut self,
        _schema: &SchemaIdentifier,
        _size: u64,
    ) -> Receive<&mut dyn MetadataEvents> {
        Receive::Accepted(self)
    }
}

impl NonInterleavedEvents for MemoryMeshProducer {
    fn on_attribute_start(
        &mut self,
        attribute: &Attribute,
    ) -> Receive<&mut dyn AttributeValueEvents> {
        self.current = Some((
            attribute.name().clone(),
            AttributeValues::for_attribute(attribute),
        ));
        Receive::Accepted(self)
    }
}

impl AttributeValueEvents for MemoryMeshProducer {
    fn on_float(&mut self, values: &[f64]) {
        self.push(values, |a| match a {
            AttributeValues::Floating(v) => Some(v),
            _ => None,
        });
    }

    fn on_signed(&mut self, values: &[i64]) {
        self.push(values, |a| match a {
            AttributeValues::Signed(v) => Some(v),
            _ => None,
        });
    }

    fn on_unsigned(&mut self, values: &[u64]) {
        self.push(values, |a| match a {
            AttributeValues::Unsigned(v) => Some(v),
            _ => None,
        });
    }

    fn on_attribute_finish(&mut self) {
        if let (Some((name, values)), Some(mesh)) = (self.current.take(), &mut self.mesh) {
            mesh.attributes.insert(name, values);
        }
    }
}

impl TriangleEvents for MemoryMeshProducer {
    fn on_triangle(&mut self, v0: u64, v1: u64, v2: u64) {
        if let Some(mesh) = &mut self.mesh {
            mesh.triangles.push([v0, v1, v2]);
        }
    }
}

impl MetadataEvents for MemoryMeshProducer {
    fn on_metadata_data(&mut self, schema: &SchemaIdentifier, data: Vec<u8>) {
        if let Some(mesh) = &mut self.mesh {
            mesh.metadata.push((schema.clone(), data));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header() -> Header {
        Header::builder()
            .with_vertex_count(3)
            .with_triangles(1, 8)
            .with_attribute(Attribute::float("POSITION", 2, 32).unwrap())
            .with_attribute(Attribute::signed("OFFSET", 1, 16).unwrap())
            .build()
            .unwrap()
    }

    fn mesh() -> MemoryMesh {
        let mut mesh = MemoryMesh::new(header());
        mesh.set_attribute(
            "POSITION",
            AttributeValues::Floating(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
        )
        .unwrap();
        mesh.set_attribute("OFFSET", AttributeValues::Signed(vec![-1, 0, 300]))
            .unwrap();
        mesh.set_triangles(vec![[0, 1, 2]]).unwrap();
        mesh
    }

    #[test]
    fn test_round_trip() {
        let mut mesh = mesh();
        mesh.add_metadata(
            SchemaIdentifier::new("com.example.tag", 1, 0).unwrap(),
            b"hello".to_vec(),
        );
        let bytes = mesh.write_to(BinarySerializer::new(Vec::new())).unwrap();
        let decoded = MemoryMesh::read(bytes.as_slice()).unwrap();
        assert_eq!(decoded, mesh);
    }

    #[test]
    fn test_set_attribute_checks_shape() {
        let mut mesh = MemoryMesh::new(header());
        assert!(matches!(
            mesh.set_attribute("POSITION", AttributeValues::Signed(vec![0; 6])),
            Err(Error::IncorrectType { .. })
        ));
        assert!(matches!(
            mesh.set_attribute("POSITION", AttributeValues::Floating(vec![0.0; 4])),
            Err(Error::TooFewVertices { received: 2, .. })
        ));
        assert!(matches!(
            mesh.set_attribute("POSITION", AttributeValues::Floating(vec![0.0; 8])),
            Err(Error::TooManyVertices { .. })
        ));
        assert!(matches!(
            mesh.set_attribute("NORMAL", AttributeValues::Floating(Vec::new())),
            Err(Error::UnknownAttribute(_))
        ));
    }

    #[test]
    fn test_missing_values_fail_to_write() {
        let mut mesh = MemoryMesh::new(header());
        mesh.set_triangles(vec![[0, 1, 2]]).unwrap();
        assert!(matches!(
            mesh.write_to(BinarySerializer::new(Vec::new())),
            Err(Error::TooFewVertices { .. })
        ));
    }

    #[test]
    fn test_triangle_count_is_checked() {
        let mut mesh = MemoryMesh::new(header());
        assert!(matches!(
            mesh.set_triangles(Vec::new()),
            Err(Error::TooFewTriangles { .. })
        ));
        assert!(matches!(
            mesh.set_triangles(vec![[0, 1, 2], [2, 1, 0]]),
            Err(Error::TooManyTriangles { expected: 1 })
        ));
    }
}
