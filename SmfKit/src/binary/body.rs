//! Body section sub-parsers.
//!
//! Each sub-parser receives a reader bounded to its section payload and
//! reports problems through the receiver it was handed. None of them abort the
//! enclosing parse: the caller resynchronises on the next section afterwards.
//! They return `false` when any error was reported.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use tracing::trace;

use super::header_codec::{SCHEMA_ID_RECORD_SIZE, read_schema_id};
use super::stream::BoundedReader;
use super::{SECTION_ALIGNMENT, align_next};
use crate::cursor::CursorCodec;
use crate::error::{Error, ParseError, Result};
use crate::events::{AttributeValueEvents, BodyEvents, Receive, TriangleEvents};
use crate::model::{Attribute, ComponentType, Header, SchemaIdentifier};

/// Size of the metadata record preceding the data: schema id plus `u32` size.
pub(crate) const METADATA_RECORD_SIZE: usize = SCHEMA_ID_RECORD_SIZE + 4;

/// Octets occupied by one attribute's block, including alignment padding.
pub(crate) fn attribute_block_size(vertex_count: u64, attribute: &Attribute) -> Result<u64> {
    vertex_count
        .checked_mul(attribute.size_octets() as u64)
        .and_then(|size| align_next(size, SECTION_ALIGNMENT))
        .ok_or(Error::ArithmeticOverflow {
            context: "attribute block size",
        })
}

pub(crate) fn parse_vertices_non_interleaved<R: Read>(
    header: &Header,
    reader: &mut BoundedReader<'_, R>,
    body: &mut dyn BodyEvents,
) -> bool {
    let Receive::Accepted(vertices) = body.on_vertices_non_interleaved() else {
        return true;
    };

    let mut ok = true;
    for attribute in header.attributes() {
        let start = reader.position();
        let end = match attribute_block_size(header.vertex_count(), attribute).and_then(|size| {
            start.checked_add(size).ok_or(Error::ArithmeticOverflow {
                context: "attribute block end",
            })
        }) {
            Ok(end) => end,
            Err(e) => {
                vertices.on_error(ParseError::at(start, e));
                ok = false;
                break;
            }
        };

        if let Receive::Accepted(values) = vertices.on_attribute_start(attribute) {
            trace!("Decoding attribute {} at {}", attribute, start);
            if let Err(e) = decode_attribute(header, attribute, reader, values) {
                values.on_error(ParseError::at(reader.position(), e));
                ok = false;
            }
            values.on_attribute_finish();
        }

        if let Err(e) = reader.skip_to(end) {
            vertices.on_error(ParseError::at(reader.position(), e));
            ok = false;
            break;
        }
    }

    vertices.on_vertices_finish();
    ok
}

fn decode_attribute<R: Read>(
    header: &Header,
    attribute: &Attribute,
    reader: &mut BoundedReader<'_, R>,
    values: &mut dyn AttributeValueEvents,
) -> Result<()> {
    let codec = CursorCodec::for_attribute(attribute, header.data_byte_order())?;
    let count = codec.component_count();
    let mut raw = vec![0u8; codec.size_octets()];

    let mut floats = [0f64; 4];
    let mut signed = [0i64; 4];
    let mut unsigned = [0u64; 4];

    for _ in 0..header.vertex_count() {
        reader.fill(&mut raw)?;
        match attribute.component_type() {
            ComponentType::Float => {
                codec.read_into(&raw, 0, &mut floats[..count])?;
                values.on_float(&floats[..count]);
            }
            ComponentType::SignedInteger => {
                codec.read_into(&raw, 0, &mut signed[..count])?;
                values.on_signed(&signed[..count]);
            }
            ComponentType::UnsignedInteger => {
                codec.read_into(&raw, 0, &mut unsigned[..count])?;
                values.on_unsigned(&unsigned[..count]);
            }
        }
    }
    Ok(())
}

pub(crate) fn parse_triangles<R: Read>(
    header: &Header,
    reader: &mut BoundedReader<'_, R>,
    body: &mut dyn BodyEvents,
) -> bool {
    let Receive::Accepted(triangles) = body.on_triangles() else {
        return true;
    };

    let ok = match decode_triangles(header, reader, triangles) {
        Ok(()) => true,
        Err(e) => {
            triangles.on_error(ParseError::at(reader.position(), e));
            false
        }
    };
    triangles.on_triangles_finish();
    ok
}

fn decode_triangles<R: Read>(
    header: &Header,
    reader: &mut BoundedReader<'_, R>,
    triangles: &mut dyn TriangleEvents,
) -> Result<()> {
    let codec = CursorCodec::for_triangles(header.triangles(), header.data_byte_order())?;
    let mut raw = vec![0u8; codec.size_octets()];
    for _ in 0..header.triangles().count() {
        reader.fill(&mut raw)?;
        let [v0, v1, v2] = codec.read::<u64, 3>(&raw, 0)?;
        triangles.on_triangle(v0, v1, v2);
    }
    Ok(())
}

pub(crate) fn parse_metadata<R: Read>(
    reader: &mut BoundedReader<'_, R>,
    body: &mut dyn BodyEvents,
) -> bool {
    let start = reader.position();
    let (schema, size) = match read_metadata_record(reader) {
        Ok(record) => record,
        Err(e) => {
            body.on_error(ParseError::at(start, e));
            return false;
        }
    };

    let available = reader.remaining();
    if u64::from(size) > available {
        let declared = u64::from(size);
        body.on_error(ParseError::at(
            reader.position(),
            Error::MetadataTruncated {
                declared,
                available,
                shortfall: declared - available,
            },
        ));
        return false;
    }

    let Receive::Accepted(metadata) = body.on_metadata(&schema, u64::from(size)) else {
        return true;
    };
    match reader.read_vec(u64::from(size)) {
        Ok(data) => {
            metadata.on_metadata_data(&schema, data);
            true
        }
        Err(e) => {
            metadata.on_error(ParseError::at(reader.position(), e));
            false
        }
    }
}

fn read_metadata_record<R: Read>(
    reader: &mut BoundedReader<'_, R>,
) -> Result<(SchemaIdentifier, u32)> {
    let mut record = [0u8; METADATA_RECORD_SIZE];
    reader.fill(&mut record)?;
    let mut cursor = Cursor::new(&record[..]);
    let schema = read_schema_id(&mut cursor)?.ok_or(Error::InvalidSchemaName {
        name: String::new(),
        reason: "metadata requires a schema identifier",
    })?;
    let size = cursor.read_u32::<BigEndian>()?;
    reader.skip_to_alignment(SECTION_ALIGNMENT)?;
    Ok((schema, size))
}
