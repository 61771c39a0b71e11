//! Binary stream serializer.
//!
//! Sections are written in call order: the header first, then at most one
//! vertex section and one triangle section, then any number of metadata
//! sections, and finally the end section from [`BinarySerializer::finish`].
//! Values are checked against the header as they are written.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use tracing::debug;

use super::body::{METADATA_RECORD_SIZE, attribute_block_size};
use super::header_codec::{HeaderCodec, write_schema_id};
use super::section::{finish_section, write_section, write_section_header};
use super::stream::StreamWriter;
use super::{
    MAGIC, SECTION_ALIGNMENT, SECTION_END, SECTION_HEADER, SECTION_METADATA, SECTION_TRIANGLES,
    SECTION_VERTICES_NON_INTERLEAVED,
};
use crate::cursor::{ComponentValue, CursorCodec, IntegerWidth};
use crate::error::{Error, Result};
use crate::model::{FormatVersion, Header, SchemaIdentifier};

#[derive(Debug, Default, Clone, Copy)]
struct Written {
    vertices: bool,
    triangles: bool,
}

/// Writes one mesh as an SMF binary stream.
#[derive(Debug)]
pub struct BinarySerializer<W: Write> {
    writer: StreamWriter<W>,
    version: FormatVersion,
    codec: HeaderCodec,
    header: Option<Header>,
    written: Written,
}

impl<W: Write> BinarySerializer<W> {
    /// A serializer producing format version 1.0.
    pub fn new(writer: W) -> Self {
        Self {
            writer: StreamWriter::new(writer),
            version: FormatVersion::V1_0,
            codec: HeaderCodec::V1,
            header: None,
            written: Written::default(),
        }
    }

    /// Select the output format version.
    pub fn with_version(mut self, version: FormatVersion) -> Result<Self> {
        self.codec = HeaderCodec::for_writing(version).ok_or(Error::UnsupportedVersion {
            major: version.major,
            minor: version.minor,
        })?;
        self.version = version;
        Ok(self)
    }

    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Octets written so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.writer.position()
    }

    /// Write the format tag, version and header section.
    pub fn serialize_header(&mut self, header: &Header) -> Result<()> {
        if self.header.is_some() {
            return Err(Error::SerializerState("header already written"));
        }
        let payload = self.codec.encode(header)?;

        self.writer.write_all(&MAGIC)?;
        self.writer.write_u32::<BigEndian>(self.version.major)?;
        self.writer.write_u32::<BigEndian>(self.version.minor)?;
        write_section(&mut self.writer, SECTION_HEADER, &payload)?;
        debug!(
            "Wrote SMF {} header: {} attributes",
            self.version,
            header.attribute_count()
        );

        self.header = Some(header.clone());
        Ok(())
    }

    /// Start the non-interleaved vertex section.
    pub fn serialize_vertices_non_interleaved(&mut self) -> Result<VertexWriter<'_, W>> {
        let header = self
            .header
            .as_ref()
            .ok_or(Error::SerializerState("header not written"))?;
        if self.written.vertices {
            return Err(Error::SerializerState("vertex data already written"));
        }

        let mut size: u64 = 0;
        for attribute in header.attributes() {
            size = size
                .checked_add(attribute_block_size(header.vertex_count(), attribute)?)
                .ok_or(Error::ArithmeticOverflow {
                    context: "vertex section size",
                })?;
        }
        write_section_header(&mut self.writer, SECTION_VERTICES_NON_INTERLEAVED, size)?;
        debug!("Writing vertex section of {} octets", size);
        self.written.vertices = true;

        Ok(VertexWriter {
            writer: &mut self.writer,
            header,
            next: 0,
        })
    }

    /// Start the triangle section.
    pub fn serialize_triangles(&mut self) -> Result<TriangleWriter<'_, W>> {
        let header = self
            .header
            .as_ref()
            .ok_or(Error::SerializerState("header not written"))?;
        if self.written.triangles {
            return Err(Error::SerializerState("triangles already written"));
        }

        let triangles = header.triangles();
        let size = triangles
            .count()
            .checked_mul(triangles.triangle_size_octets())
            .ok_or(Error::ArithmeticOverflow {
                context: "triangle section size",
            })?;
        let codec = CursorCodec::for_triangles(triangles, header.data_byte_order())?;
        let width = IntegerWidth::from_bits(triangles.index_size_bits())
            .ok_or(Error::InvalidTriangleIndexSize(triangles.index_size_bits()))?;

        write_section_header(&mut self.writer, SECTION_TRIANGLES, size)?;
        debug!("Writing triangle section of {} octets", size);
        self.written.triangles = true;

        Ok(TriangleWriter {
            writer: &mut self.writer,
            scratch: vec![0u8; codec.size_octets()],
            codec,
            max_index: width.max_unsigned(),
            bits: triangles.index_size_bits(),
            expected: triangles.count(),
            written: 0,
        })
    }

    /// Write one metadata section.
    pub fn serialize_metadata(&mut self, schema: &SchemaIdentifier, data: &[u8]) -> Result<()> {
        if self.header.is_none() {
            return Err(Error::SerializerState("header not written"));
        }
        let size = u32::try_from(data.len()).map_err(|_| Error::ArithmeticOverflow {
            context: "metadata size",
        })?;

        let mut record = Vec::with_capacity(METADATA_RECORD_SIZE);
        write_schema_id(&mut record, Some(schema))?;
        record.write_u32::<BigEndian>(size)?;

        write_section_header(
            &mut self.writer,
            SECTION_METADATA,
            (METADATA_RECORD_SIZE + data.len()) as u64,
        )?;
        self.writer.write_all(&record)?;
        self.writer.pad_to_alignment(SECTION_ALIGNMENT)?;
        self.writer.write_all(data)?;
        finish_section(&mut self.writer)?;
        debug!("Wrote metadata {} ({} octets)", schema, size);
        Ok(())
    }

    /// Write the end section and return the underlying writer.
    ///
    /// Fails if the header declares vertex data or triangles that were never written.
    pub fn finish(mut self) -> Result<W> {
        let header = self
            .header
            .as_ref()
            .ok_or(Error::SerializerState("header not written"))?;
        let declares_vertices = header.vertex_count() != 0 && header.attribute_count() != 0;
        if declares_vertices && !self.written.vertices {
            return Err(Error::MissingVertices(header.vertex_count()));
        }
        if header.triangles().count() != 0 && !self.written.triangles {
            return Err(Error::MissingTriangles(header.triangles().count()));
        }

        write_section_header(&mut self.writer, SECTION_END, 0)?;
        self.writer.flush()?;
        debug!("Finished SMF stream at {} octets", self.writer.position());
        Ok(self.writer.into_inner())
    }
}

/// Writes the attributes of a vertex section, in header order.
#[derive(Debug)]
pub struct VertexWriter<'a, W: Write> {
    writer: &'a mut StreamWriter<W>,
    header: &'a Header,
    next: usize,
}

impl<W: Write> VertexWriter<'_, W> {
    /// Start writing the values of `name`, which must be the next attribute in header order.
    pub fn attribute(&mut self, name: &str) -> Result<AttributeWriter<'_, W>> {
        let header = self.header;
        let attribute = header
            .attribute(name)
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))?;
        let expected = header
            .attributes()
            .nth(self.next)
            .ok_or_else(|| Error::AttributeOutOfOrder {
                expected: "<none>".to_string(),
                received: name.to_string(),
            })?;
        if expected.name() != attribute.name() {
            return Err(Error::AttributeOutOfOrder {
                expected: expected.name().to_string(),
                received: name.to_string(),
            });
        }

        let codec = CursorCodec::for_attribute(attribute, header.data_byte_order())?;
        Ok(AttributeWriter {
            writer: &mut *self.writer,
            completed: &mut self.next,
            name: attribute.name().to_string(),
            scratch: vec![0u8; codec.size_octets()],
            codec,
            expected: header.vertex_count(),
            written: 0,
        })
    }

    /// End the vertex section. Every attribute must have been written.
    pub fn finish(self) -> Result<()> {
        if let Some(missing) = self.header.attributes().nth(self.next) {
            return Err(Error::TooFewVertices {
                attribute: missing.name().to_string(),
                expected: self.header.vertex_count(),
                received: 0,
            });
        }
        finish_section(self.writer)
    }
}

/// Writes the values of one attribute, one vertex per call.
#[derive(Debug)]
pub struct AttributeWriter<'a, W: Write> {
    writer: &'a mut StreamWriter<W>,
    completed: &'a mut usize,
    name: String,
    codec: CursorCodec,
    scratch: Vec<u8>,
    expected: u64,
    written: u64,
}

impl<W: Write> AttributeWriter<'_, W> {
    /// Write the next vertex's value as a fixed-size array.
    pub fn write<T: ComponentValue, const N: usize>(&mut self, values: [T; N]) -> Result<()> {
        self.write_slice(&values)
    }

    /// Write the next vertex's value as a slice of components.
    pub fn write_slice<T: ComponentValue>(&mut self, values: &[T]) -> Result<()> {
        if self.written >= self.expected {
            return Err(Error::TooManyVertices {
                attribute: self.name.clone(),
                expected: self.expected,
            });
        }
        self.codec.write_slice(&mut self.scratch, 0, values)?;
        self.writer.write_all(&self.scratch)?;
        self.written += 1;
        Ok(())
    }

    /// Vertices still to be written.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.expected - self.written
    }

    /// End the attribute, padding its block to the section alignment.
    pub fn finish(self) -> Result<()> {
        if self.written < self.expected {
            return Err(Error::TooFewVertices {
                attribute: self.name,
                expected: self.expected,
                received: self.written,
            });
        }
        finish_section(self.writer)?;
        *self.completed += 1;
        Ok(())
    }
}

/// Writes triangles, one index triple per call.
#[derive(Debug)]
pub struct TriangleWriter<'a, W: Write> {
    writer: &'a mut StreamWriter<W>,
    codec: CursorCodec,
    scratch: Vec<u8>,
    max_index: u64,
    bits: u32,
    expected: u64,
    written: u64,
}

impl<W: Write> TriangleWriter<'_, W> {
    pub fn triangle(&mut self, v0: u64, v1: u64, v2: u64) -> Result<()> {
        if self.written >= self.expected {
            return Err(Error::TooManyTriangles {
                expected: self.expected,
            });
        }
        if let Some(&index) = [v0, v1, v2].iter().find(|&&i| i > self.max_index) {
            return Err(Error::TriangleIndexTooLarge {
                index,
                bits: self.bits,
            });
        }
        self.codec.write(&mut self.scratch, 0, [v0, v1, v2])?;
        self.writer.write_all(&self.scratch)?;
        self.written += 1;
        Ok(())
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.expected - self.written
    }

    /// End the triangle section.
    pub fn finish(self) -> Result<()> {
        if self.written < self.expected {
            return Err(Error::TooFewTriangles {
                expected: self.expected,
                received: self.written,
            });
        }
        finish_section(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attribute;

    fn header() -> Header {
        Header::builder()
            .with_vertex_count(2)
            .with_triangles(1, 16)
            .with_attribute(Attribute::float("POSITION", 3, 32).unwrap())
            .with_attribute(Attribute::unsigned("ID", 1, 8).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_sections_stay_aligned() {
        let mut serializer = BinarySerializer::new(Vec::new());
        serializer.serialize_header(&header()).unwrap();
        assert_eq!(serializer.position() % SECTION_ALIGNMENT, 0);

        {
            let mut vertices = serializer.serialize_vertices_non_interleaved().unwrap();
            let mut position = vertices.attribute("POSITION").unwrap();
            position.write([1.0, 2.0, 3.0]).unwrap();
            position.write([4.0, 5.0, 6.0]).unwrap();
            position.finish().unwrap();
            let mut id = vertices.attribute("ID").unwrap();
            id.write([7u64]).unwrap();
            id.write([8u64]).unwrap();
            id.finish().unwrap();
            vertices.finish().unwrap();
        }
        assert_eq!(serializer.position() % SECTION_ALIGNMENT, 0);

        {
            let mut triangles = serializer.serialize_triangles().unwrap();
            triangles.triangle(0, 1, 0).unwrap();
            triangles.finish().unwrap();
        }
        assert_eq!(serializer.position() % SECTION_ALIGNMENT, 0);

        let bytes = serializer.finish().unwrap();
        assert_eq!(bytes.len() % 16, 0);
        assert_eq!(&bytes[bytes.len() - 16..bytes.len() - 8], b"SMF_END!");
    }

    #[test]
    fn test_count_mismatches() {
        let mut serializer = BinarySerializer::new(Vec::new());
        serializer.serialize_header(&header()).unwrap();
        let mut vertices = serializer.serialize_vertices_non_interleaved().unwrap();

        assert!(matches!(
            vertices.attribute("ID"),
            Err(Error::AttributeOutOfOrder { .. })
        ));

        let mut position = vertices.attribute("POSITION").unwrap();
        assert!(matches!(
            position.write([1.0, 2.0]),
            Err(Error::IncorrectType { .. })
        ));
        position.write([1.0, 2.0, 3.0]).unwrap();
        position.write([1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            position.write([1.0, 2.0, 3.0]),
            Err(Error::TooManyVertices { expected: 2, .. })
        ));
        position.finish().unwrap();

        let mut id = vertices.attribute("ID").unwrap();
        id.write([1u64]).unwrap();
        assert!(matches!(
            id.finish(),
            Err(Error::TooFewVertices {
                expected: 2,
                received: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_triangle_checks() {
        let mut serializer = BinarySerializer::new(Vec::new());
        serializer.serialize_header(&header()).unwrap();
        let mut triangles = serializer.serialize_triangles().unwrap();
        assert!(matches!(
            triangles.triangle(0, 70_000, 1),
            Err(Error::TriangleIndexTooLarge {
                index: 70_000,
                bits: 16
            })
        ));
        triangles.triangle(0, 1, 0).unwrap();
        assert!(matches!(
            triangles.triangle(0, 1, 0),
            Err(Error::TooManyTriangles { expected: 1 })
        ));
    }

    #[test]
    fn test_finish_requires_declared_data() {
        let mut serializer = BinarySerializer::new(Vec::new());
        serializer.serialize_header(&header()).unwrap();
        assert!(matches!(
            serializer.finish(),
            Err(Error::MissingVertices(2))
        ));
    }

    #[test]
    fn test_only_known_versions_are_writable() {
        assert!(
            BinarySerializer::new(Vec::new())
                .with_version(FormatVersion::new(1, 1))
                .is_err()
        );
        assert!(
            BinarySerializer::new(Vec::new())
                .with_version(FormatVersion::new(2, 0))
                .is_err()
        );
    }

    #[test]
    fn test_out_of_order_calls() {
        let mut serializer = BinarySerializer::new(Vec::new());
        assert!(matches!(
            serializer.serialize_triangles(),
            Err(Error::SerializerState(_))
        ));
        serializer.serialize_header(&header()).unwrap();
        assert!(matches!(
            serializer.serialize_header(&header()),
            Err(Error::SerializerState(_))
        ));
    }
}
