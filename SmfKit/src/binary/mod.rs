//! SMF binary container.
//!
//! A stream is the 8-octet format tag, a big-endian `u32` major and minor
//! version, then a sequence of 16-octet aligned sections ending with an
//! `SMF_END!` section of size 0:
//!
//! ```text
//! 89 'S' 'M' 'F' 0D 0A 1A 0A | major u32 | minor u32
//! SMF_HEAD  header (required, first)
//! SMF_VDNI  non-interleaved vertex data
//! SMF_TRIS  triangles
//! SMF_META  metadata (any number)
//! SMF_END!  end
//! ```

mod body;
pub mod header_codec;
pub mod parser;
pub mod section;
pub mod serializer;
pub mod stream;

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::model::FormatVersion;

pub use header_codec::HeaderCodec;
pub use parser::{BinaryParser, ParserState};
pub use section::{SectionHeader, SectionKind};
pub use serializer::{AttributeWriter, BinarySerializer, TriangleWriter, VertexWriter};
pub use stream::{BoundedReader, StreamReader, StreamWriter};

/// The format tag every SMF binary stream begins with.
pub const MAGIC: [u8; 8] = [0x89, b'S', b'M', b'F', 0x0D, 0x0A, 0x1A, 0x0A];

/// Alignment of every section, in octets.
pub const SECTION_ALIGNMENT: u64 = 16;

/// `SMF_HEAD`
pub const SECTION_HEADER: u64 = 0x534D_465F_4845_4144;
/// `SMF_VDNI`
pub const SECTION_VERTICES_NON_INTERLEAVED: u64 = 0x534D_465F_5644_4E49;
/// `SMF_TRIS`
pub const SECTION_TRIANGLES: u64 = 0x534D_465F_5452_4953;
/// `SMF_META`
pub const SECTION_METADATA: u64 = 0x534D_465F_4D45_5441;
/// `SMF_END!`
pub const SECTION_END: u64 = 0x534D_465F_454E_4421;

/// Round `value` up to the next multiple of `alignment`, or `None` on overflow.
#[must_use]
pub fn align_next(value: u64, alignment: u64) -> Option<u64> {
    value
        .checked_add(alignment - 1)
        .map(|v| v / alignment * alignment)
}

/// Read the format tag and version from the start of a stream.
pub fn probe<R: Read>(mut reader: R) -> Result<FormatVersion> {
    read_preamble(&mut reader)
}

pub(crate) fn read_preamble<R: Read>(reader: &mut R) -> Result<FormatVersion> {
    let mut found = [0u8; 8];
    reader.read_exact(&mut found)?;
    if found != MAGIC {
        return Err(Error::InvalidMagic {
            expected: MAGIC,
            found,
        });
    }
    let major = reader.read_u32::<BigEndian>()?;
    let minor = reader.read_u32::<BigEndian>()?;
    Ok(FormatVersion::new(major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_next() {
        assert_eq!(align_next(0, 16), Some(0));
        assert_eq!(align_next(1, 16), Some(16));
        assert_eq!(align_next(16, 16), Some(16));
        assert_eq!(align_next(6, 16), Some(16));
        assert_eq!(align_next(33, 16), Some(48));
        assert_eq!(align_next(u64::MAX, 16), None);
    }

    #[test]
    fn test_magic_constants_spell_names() {
        assert_eq!(&SECTION_HEADER.to_be_bytes(), b"SMF_HEAD");
        assert_eq!(&SECTION_VERTICES_NON_INTERLEAVED.to_be_bytes(), b"SMF_VDNI");
        assert_eq!(&SECTION_TRIANGLES.to_be_bytes(), b"SMF_TRIS");
        assert_eq!(&SECTION_METADATA.to_be_bytes(), b"SMF_META");
        assert_eq!(&SECTION_END.to_be_bytes(), b"SMF_END!");
    }

    #[test]
    fn test_probe() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        assert_eq!(probe(data.as_slice()).unwrap(), FormatVersion::V1_0);

        data[1] = b'X';
        assert!(matches!(
            probe(data.as_slice()),
            Err(Error::InvalidMagic { .. })
        ));
    }
}
