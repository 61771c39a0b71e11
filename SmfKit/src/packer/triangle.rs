//! Push-style triangle packing.

use crate::cursor::{Cursor, CursorCodec, ElementIndex};
use crate::error::Result;
use crate::model::{DataByteOrder, Triangles};

/// Writes successive index triples into a triangle buffer.
///
/// The buffer holds `count × 3 × index size` octets with no padding. Like
/// [`AttributePacker`](super::AttributePacker), writes past the last
/// triangle overwrite it.
#[derive(Debug)]
pub struct TrianglePacker<B> {
    buffer: B,
    codec: CursorCodec,
    cursor: Cursor,
}

impl<B: AsMut<[u8]>> TrianglePacker<B> {
    pub fn new(buffer: B, triangles: Triangles, order: DataByteOrder) -> Result<Self> {
        let codec = CursorCodec::for_triangles(triangles, order)?;
        let stride = codec.size_octets();
        Ok(Self {
            buffer,
            codec,
            cursor: Cursor::new(triangles.count(), stride, 0),
        })
    }

    #[must_use]
    pub fn index(&self) -> ElementIndex {
        self.cursor.index()
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }

    pub fn triangle(&mut self, v0: u64, v1: u64, v2: u64) -> Result<()> {
        if self.cursor.index().count() == 0 {
            return Ok(());
        }
        let offset = self.cursor.offset_octets()?;
        self.codec.write(self.buffer.as_mut(), offset, [v0, v1, v2])?;
        self.cursor.try_advance();
        Ok(())
    }
}
