//! Header section encoding.
//!
//! Version 1.0 fixed struct (128 octets, big-endian):
//!
//! | offset | field |
//! |--------|-------|
//! | 0      | attribute count (u32) |
//! | 4      | fields size (u32) |
//! | 8      | triangle count (u64) |
//! | 16     | triangle index size in bits (u32) |
//! | 20     | reserved (u32) |
//! | 24     | vertex count (u64) |
//! | 32     | coordinate system: right, up, forward, winding (u8 each) |
//! | 36     | schema identifier record (76 octets) |
//! | 112    | attribute table offset from struct start (u32) |
//! | 116    | data byte order (u32) |
//! | 120    | reserved (8 octets) |
//!
//! The attribute table holds `attribute count` records of 80 octets:
//! name length (u32), name (64 octets), kind (u32), count (u32), size in bits (u32).
//!
//! Readers locate the attribute table through the offset field only, so later
//! minor versions can grow the fixed struct without breaking older readers.

use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::stream::BoundedReader;
use crate::error::{Error, Result};
use crate::model::{
    Attribute, AttributeName, ComponentType, CoordinateSystem, DataByteOrder, FormatVersion,
    Header, NAME_MAX_LENGTH, SchemaIdentifier,
};

/// Capacity of every fixed name field, in octets.
pub const NAME_CAPACITY: usize = NAME_MAX_LENGTH;

/// Size of a schema identifier record.
pub const SCHEMA_ID_RECORD_SIZE: usize = 4 + NAME_CAPACITY + 4 + 4;

/// Size of one attribute record.
pub const ATTRIBUTE_RECORD_SIZE: usize = 4 + NAME_CAPACITY + 4 + 4 + 4;

/// Size of the version 1.0 fixed header struct.
pub const V1_FIXED_SIZE: usize = 128;

/// Header layouts by format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCodec {
    V1,
}

impl HeaderCodec {
    /// Codec able to read headers of `version`.
    #[must_use]
    pub fn for_reading(version: FormatVersion) -> Option<Self> {
        match (version.major, version.minor) {
            (1, _) => Some(Self::V1),
            _ => None,
        }
    }

    /// Codec able to write headers of exactly `version`.
    #[must_use]
    pub fn for_writing(version: FormatVersion) -> Option<Self> {
        match (version.major, version.minor) {
            (1, 0) => Some(Self::V1),
            _ => None,
        }
    }

    /// Smallest header section this codec accepts.
    #[must_use]
    pub fn required_size(self) -> u64 {
        match self {
            Self::V1 => V1_FIXED_SIZE as u64,
        }
    }

    /// Decode a header section payload.
    pub fn decode<R: Read>(
        self,
        version: FormatVersion,
        reader: &mut BoundedReader<'_, R>,
        size_of_data: u64,
    ) -> Result<Header> {
        let required = self.required_size();
        if size_of_data < required {
            return Err(Error::SectionTooSmall {
                major: version.major,
                minor: version.minor,
                required,
                received: size_of_data,
            });
        }
        match self {
            Self::V1 => decode_v1(version, reader, size_of_data),
        }
    }

    /// Encode a header section payload.
    pub fn encode(self, header: &Header) -> Result<Vec<u8>> {
        match self {
            Self::V1 => encode_v1(header),
        }
    }
}

fn decode_v1<R: Read>(
    version: FormatVersion,
    reader: &mut BoundedReader<'_, R>,
    size_of_data: u64,
) -> Result<Header> {
    let struct_start = reader.position();
    let mut fixed = [0u8; V1_FIXED_SIZE];
    reader.fill(&mut fixed)?;

    let mut cursor = Cursor::new(&fixed[..]);
    let attribute_count = cursor.read_u32::<BigEndian>()?;
    let fields_size = cursor.read_u32::<BigEndian>()?;
    let triangle_count = cursor.read_u64::<BigEndian>()?;
    let triangle_index_size_bits = cursor.read_u32::<BigEndian>()?;
    let _reserved = cursor.read_u32::<BigEndian>()?;
    let vertex_count = cursor.read_u64::<BigEndian>()?;
    let mut packed_coords = [0u8; 4];
    cursor.read_exact(&mut packed_coords)?;
    let schema = read_schema_id(&mut cursor)?;
    let table_offset = cursor.read_u32::<BigEndian>()?;
    let data_byte_order = DataByteOrder::from_code(cursor.read_u32::<BigEndian>()?)?;

    if (fields_size as usize) < V1_FIXED_SIZE {
        return Err(Error::HeaderFieldsTooSmall {
            declared: fields_size,
            fixed: V1_FIXED_SIZE as u32,
        });
    }
    if (table_offset as usize) < V1_FIXED_SIZE {
        return Err(Error::AttributeTableOverlap {
            offset: table_offset,
            fixed: V1_FIXED_SIZE as u32,
        });
    }

    let table_size = u64::from(attribute_count) * ATTRIBUTE_RECORD_SIZE as u64;
    let required = u64::from(table_offset) + table_size;
    if size_of_data < required {
        return Err(Error::SectionTooSmall {
            major: version.major,
            minor: version.minor,
            required,
            received: size_of_data,
        });
    }

    reader.skip_to(struct_start + u64::from(table_offset))?;

    let mut attributes = Vec::with_capacity(attribute_count.min(1024) as usize);
    let mut record = [0u8; ATTRIBUTE_RECORD_SIZE];
    for _ in 0..attribute_count {
        reader.fill(&mut record)?;
        attributes.push(decode_attribute(&record)?);
    }

    Header::builder()
        .with_schema_identifier(schema)
        .with_coordinate_system(CoordinateSystem::unpack(packed_coords)?)
        .with_vertex_count(vertex_count)
        .with_triangles(triangle_count, triangle_index_size_bits)
        .with_data_byte_order(data_byte_order)
        .with_attributes(attributes)
        .build()
}

fn decode_attribute(record: &[u8; ATTRIBUTE_RECORD_SIZE]) -> Result<Attribute> {
    let mut cursor = Cursor::new(&record[..]);
    let name = read_name(&mut cursor)?;
    let kind = ComponentType::from_code(cursor.read_u32::<BigEndian>()?)?;
    let count = cursor.read_u32::<BigEndian>()?;
    let bits = cursor.read_u32::<BigEndian>()?;
    Attribute::new(AttributeName::new(name)?, kind, count, bits)
}

fn encode_v1(header: &Header) -> Result<Vec<u8>> {
    let attribute_count =
        u32::try_from(header.attribute_count()).map_err(|_| Error::ArithmeticOverflow {
            context: "attribute count",
        })?;
    let mut out =
        Vec::with_capacity(V1_FIXED_SIZE + header.attribute_count() * ATTRIBUTE_RECORD_SIZE);

    out.write_u32::<BigEndian>(attribute_count)?;
    out.write_u32::<BigEndian>(V1_FIXED_SIZE as u32)?;
    out.write_u64::<BigEndian>(header.triangles().count())?;
    out.write_u32::<BigEndian>(header.triangles().index_size_bits())?;
    out.write_u32::<BigEndian>(0)?;
    out.write_u64::<BigEndian>(header.vertex_count())?;
    out.write_all(&header.coordinate_system().pack())?;
    write_schema_id(&mut out, header.schema_identifier())?;
    out.write_u32::<BigEndian>(V1_FIXED_SIZE as u32)?;
    out.write_u32::<BigEndian>(header.data_byte_order().code())?;
    out.write_all(&[0u8; 8])?;
    debug_assert_eq!(out.len(), V1_FIXED_SIZE);

    for attribute in header.attributes() {
        write_name(&mut out, attribute.name().as_str())?;
        out.write_u32::<BigEndian>(attribute.component_type().code())?;
        out.write_u32::<BigEndian>(attribute.component_count())?;
        out.write_u32::<BigEndian>(attribute.component_size_bits())?;
    }
    Ok(out)
}

/// Write a length-prefixed, zero-padded name field. Over-long names are rejected.
pub(crate) fn write_name<W: Write>(out: &mut W, name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    if bytes.len() > NAME_CAPACITY {
        return Err(Error::NameTooLong {
            name: name.to_string(),
            length: bytes.len(),
            capacity: NAME_CAPACITY,
        });
    }
    let mut field = [0u8; NAME_CAPACITY];
    field[..bytes.len()].copy_from_slice(bytes);
    out.write_u32::<BigEndian>(bytes.len() as u32)?;
    out.write_all(&field)?;
    Ok(())
}

pub(crate) fn read_name<R: Read>(input: &mut R) -> Result<String> {
    let length = input.read_u32::<BigEndian>()?;
    let mut field = [0u8; NAME_CAPACITY];
    input.read_exact(&mut field)?;
    let invalid = || Error::InvalidEncodedName {
        length,
        capacity: NAME_CAPACITY,
    };
    let bytes = field.get(..length as usize).ok_or_else(invalid)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| invalid())
}

/// Write a schema identifier record; `None` is an empty name with version 0.0.
pub(crate) fn write_schema_id<W: Write>(
    out: &mut W,
    schema: Option<&SchemaIdentifier>,
) -> Result<()> {
    match schema {
        Some(schema) => {
            write_name(out, schema.name.as_str())?;
            out.write_u32::<BigEndian>(schema.version_major)?;
            out.write_u32::<BigEndian>(schema.version_minor)?;
        }
        None => {
            write_name(out, "")?;
            out.write_u32::<BigEndian>(0)?;
            out.write_u32::<BigEndian>(0)?;
        }
    }
    Ok(())
}

pub(crate) fn read_schema_id<R: Read>(input: &mut R) -> Result<Option<SchemaIdentifier>> {
    let name = read_name(input)?;
    let major = input.read_u32::<BigEndian>()?;
    let minor = input.read_u32::<BigEndian>()?;
    if name.is_empty() {
        return Ok(None);
    }
    SchemaIdentifier::new(&name, major, minor).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::stream::StreamReader;
    use crate::model::{Axis, AxisSystem, WindingOrder};
    use pretty_assertions::assert_eq;

    fn sample_header() -> Header {
        Header::builder()
            .with_schema_identifier(Some(SchemaIdentifier::new("com.example.mesh", 2, 1).unwrap()))
            .with_coordinate_system(CoordinateSystem {
                axes: AxisSystem::new(Axis::PositiveX, Axis::PositiveZ, Axis::NegativeY).unwrap(),
                winding: WindingOrder::Clockwise,
            })
            .with_vertex_count(100)
            .with_triangles(40, 16)
            .with_data_byte_order(DataByteOrder::LittleEndian)
            .with_attribute(Attribute::float("POSITION", 3, 32).unwrap())
            .with_attribute(Attribute::unsigned("COLOR", 4, 8).unwrap())
            .build()
            .unwrap()
    }

    fn decode_payload(payload: &[u8]) -> Result<Header> {
        let mut reader = StreamReader::new(payload);
        let mut section = reader.bounded(payload.len() as u64)?;
        HeaderCodec::V1.decode(FormatVersion::V1_0, &mut section, payload.len() as u64)
    }

    #[test]
    fn test_encode_decode() {
        let header = sample_header();
        let payload = HeaderCodec::V1.encode(&header).unwrap();
        assert_eq!(payload.len(), V1_FIXED_SIZE + 2 * ATTRIBUTE_RECORD_SIZE);
        assert_eq!(decode_payload(&payload).unwrap(), header);
    }

    #[test]
    fn test_field_positions() {
        let payload = HeaderCodec::V1.encode(&sample_header()).unwrap();
        assert_eq!(&payload[0..4], &2u32.to_be_bytes());
        assert_eq!(&payload[8..16], &40u64.to_be_bytes());
        assert_eq!(&payload[16..20], &16u32.to_be_bytes());
        assert_eq!(&payload[24..32], &100u64.to_be_bytes());
        assert_eq!(&payload[32..36], &[0, 2, 4, 0]);
        assert_eq!(&payload[112..116], &128u32.to_be_bytes());
        assert_eq!(&payload[116..120], &1u32.to_be_bytes());
    }

    #[test]
    fn test_attribute_table_found_through_offset() {
        let header = sample_header();
        let payload = HeaderCodec::V1.encode(&header).unwrap();

        // A later minor version with 32 extra fixed octets.
        let mut extended = payload[..V1_FIXED_SIZE].to_vec();
        extended[112..116].copy_from_slice(&160u32.to_be_bytes());
        extended.extend_from_slice(&[0xAA; 32]);
        extended.extend_from_slice(&payload[V1_FIXED_SIZE..]);

        let mut reader = StreamReader::new(extended.as_slice());
        let mut section = reader.bounded(extended.len() as u64).unwrap();
        let decoded = HeaderCodec::V1
            .decode(FormatVersion::new(1, 1), &mut section, extended.len() as u64)
            .unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_too_small() {
        let payload = [0u8; 64];
        assert!(matches!(
            decode_payload(&payload),
            Err(Error::SectionTooSmall {
                required: 128,
                received: 64,
                ..
            })
        ));
    }

    #[test]
    fn test_overlapping_table_offset() {
        let mut payload = HeaderCodec::V1.encode(&sample_header()).unwrap();
        payload[112..116].copy_from_slice(&64u32.to_be_bytes());
        assert!(matches!(
            decode_payload(&payload),
            Err(Error::AttributeTableOverlap { offset: 64, .. })
        ));
    }

    #[test]
    fn test_short_fields_size_rejected() {
        let mut payload = HeaderCodec::V1.encode(&sample_header()).unwrap();
        assert_eq!(&payload[4..8], &128u32.to_be_bytes());
        payload[4..8].copy_from_slice(&96u32.to_be_bytes());
        assert!(matches!(
            decode_payload(&payload),
            Err(Error::HeaderFieldsTooSmall {
                declared: 96,
                fixed: 128
            })
        ));
    }

    #[test]
    fn test_over_long_name_rejected() {
        let mut out = Vec::new();
        let name = "é".repeat(40);
        assert!(matches!(
            write_name(&mut out, &name),
            Err(Error::NameTooLong {
                length: 80,
                capacity: 64,
                ..
            })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_duplicate_attributes_rejected() {
        let mut payload = HeaderCodec::V1.encode(&sample_header()).unwrap();
        let (first, second) = payload[V1_FIXED_SIZE..].split_at_mut(ATTRIBUTE_RECORD_SIZE);
        second[..4 + NAME_CAPACITY].copy_from_slice(&first[..4 + NAME_CAPACITY]);
        assert!(matches!(
            decode_payload(&payload),
            Err(Error::DuplicateAttributeName(name)) if name == "POSITION"
        ));
    }
}
