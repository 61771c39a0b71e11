//! Section framing.
//!
//! Every section is a 16-octet record `{magic: u64, sizeOfData: u64}`
//! (big-endian), the payload, and zero padding to the next 16-octet
//! boundary. `sizeOfData` never counts the padding.

use std::fmt;
use std::io::{Read, Write};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::stream::{StreamReader, StreamWriter};
use super::{
    SECTION_ALIGNMENT, SECTION_END, SECTION_HEADER, SECTION_METADATA, SECTION_TRIANGLES,
    SECTION_VERTICES_NON_INTERLEAVED, align_next,
};
use crate::error::{Error, Result};

/// Size of the framing record preceding every payload.
pub const SECTION_HEADER_SIZE: u64 = 16;

/// Section kinds known to this version of the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    VerticesNonInterleaved,
    Triangles,
    Metadata,
    End,
    /// A magic this reader does not understand.
    Unknown(u64),
}

impl SectionKind {
    #[must_use]
    pub fn from_magic(magic: u64) -> Self {
        match magic {
            SECTION_HEADER => Self::Header,
            SECTION_VERTICES_NON_INTERLEAVED => Self::VerticesNonInterleaved,
            SECTION_TRIANGLES => Self::Triangles,
            SECTION_METADATA => Self::Metadata,
            SECTION_END => Self::End,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub fn magic(self) -> u64 {
        match self {
            Self::Header => SECTION_HEADER,
            Self::VerticesNonInterleaved => SECTION_VERTICES_NON_INTERLEAVED,
            Self::Triangles => SECTION_TRIANGLES,
            Self::Metadata => SECTION_METADATA,
            Self::End => SECTION_END,
            Self::Unknown(magic) => magic,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(magic) => write!(f, "unknown section {magic:#018x}"),
            known => {
                let bytes = known.magic().to_be_bytes();
                f.write_str(&String::from_utf8_lossy(&bytes))
            }
        }
    }
}

/// The framing record of one section, with its absolute stream offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub magic: u64,
    pub size_of_data: u64,
    pub offset: u64,
}

impl SectionHeader {
    /// Read a framing record at the reader's current position.
    pub fn read<R: Read>(reader: &mut StreamReader<R>) -> Result<Self> {
        let offset = reader.position();
        let mut record = [0u8; SECTION_HEADER_SIZE as usize];
        reader.fill(&mut record)?;
        Ok(Self {
            magic: BigEndian::read_u64(&record[0..8]),
            size_of_data: BigEndian::read_u64(&record[8..16]),
            offset,
        })
    }

    #[must_use]
    pub fn kind(&self) -> SectionKind {
        SectionKind::from_magic(self.magic)
    }

    /// Absolute offset of the first payload octet.
    #[must_use]
    pub fn payload_offset(&self) -> u64 {
        self.offset + SECTION_HEADER_SIZE
    }

    /// Absolute offset of the following section: the payload rounded up to 16.
    pub fn next_section_offset(&self) -> Result<u64> {
        align_next(self.size_of_data, SECTION_ALIGNMENT)
            .and_then(|padded| self.payload_offset().checked_add(padded))
            .ok_or(Error::ArithmeticOverflow {
                context: "next section offset",
            })
    }
}

/// Start a section. The writer must be 16-octet aligned.
pub fn write_section_header<W: Write>(
    writer: &mut StreamWriter<W>,
    magic: u64,
    size_of_data: u64,
) -> Result<()> {
    writer.check_alignment(SECTION_ALIGNMENT)?;
    writer.write_u64::<BigEndian>(magic)?;
    writer.write_u64::<BigEndian>(size_of_data)?;
    Ok(())
}

/// Pad the current section out to the alignment boundary.
pub fn finish_section<W: Write>(writer: &mut StreamWriter<W>) -> Result<()> {
    writer.pad_to_alignment(SECTION_ALIGNMENT)
}

/// Write a complete section whose payload is already in memory.
pub fn write_section<W: Write>(
    writer: &mut StreamWriter<W>,
    magic: u64,
    payload: &[u8],
) -> Result<()> {
    write_section_header(writer, magic, payload.len() as u64)?;
    writer.write_all(payload)?;
    finish_section(writer)
}
