//! Push-style attribute packing.

use crate::cursor::{ComponentValue, Cursor, CursorCodec, ElementIndex};
use crate::error::{Error, Result};
use crate::layout::PackingLayout;
use crate::model::DataByteOrder;

/// Where one attribute's values land in an interleaved buffer.
///
/// Resolving a target does not touch any buffer, so a failure leaves the
/// caller's storage where it was.
#[derive(Debug)]
pub struct PackTarget {
    codec: CursorCodec,
    cursor: Cursor,
}

impl PackTarget {
    /// Target for attribute `name` of `layout` over `vertex_count` records.
    pub fn resolve(
        layout: &PackingLayout,
        name: &str,
        vertex_count: u64,
        order: DataByteOrder,
    ) -> Result<Self> {
        let packed = layout
            .packed(name)
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))?;
        Ok(Self {
            codec: CursorCodec::for_attribute(packed.attribute(), order)?,
            cursor: Cursor::new(
                vertex_count,
                layout.vertex_stride_octets(),
                packed.offset_octets(),
            ),
        })
    }
}

/// Writes successive vertex values of one attribute into an interleaved buffer.
///
/// Each write goes to the current vertex, then the cursor advances. Once the
/// last vertex is reached further writes overwrite it; callers that need
/// strict counts must track them.
#[derive(Debug)]
pub struct AttributePacker<B> {
    buffer: B,
    codec: CursorCodec,
    cursor: Cursor,
}

impl<B: AsMut<[u8]>> AttributePacker<B> {
    /// Pack attribute `name` of `layout` into `buffer`, which holds `vertex_count` records.
    pub fn new(
        buffer: B,
        layout: &PackingLayout,
        name: &str,
        vertex_count: u64,
        order: DataByteOrder,
    ) -> Result<Self> {
        let target = PackTarget::resolve(layout, name, vertex_count, order)?;
        Ok(Self::with_target(buffer, target))
    }

    #[must_use]
    pub fn with_target(buffer: B, target: PackTarget) -> Self {
        Self {
            buffer,
            codec: target.codec,
            cursor: target.cursor,
        }
    }

    /// Position of the next write.
    #[must_use]
    pub fn index(&self) -> ElementIndex {
        self.cursor.index()
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }

    /// Write a value given as a slice of components.
    pub fn put_slice<T: ComponentValue>(&mut self, values: &[T]) -> Result<()> {
        if self.cursor.index().count() == 0 {
            return Ok(());
        }
        let offset = self.cursor.offset_octets()?;
        self.codec.write_slice(self.buffer.as_mut(), offset, values)?;
        self.cursor.try_advance();
        Ok(())
    }

    pub fn put<T: ComponentValue, const N: usize>(&mut self, values: [T; N]) -> Result<()> {
        self.put_slice(&values)
    }

    pub fn float1(&mut self, x: f64) -> Result<()> {
        self.put([x])
    }

    pub fn float2(&mut self, x: f64, y: f64) -> Result<()> {
        self.put([x, y])
    }

    pub fn float3(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        self.put([x, y, z])
    }

    pub fn float4(&mut self, x: f64, y: f64, z: f64, w: f64) -> Result<()> {
        self.put([x, y, z, w])
    }

    pub fn signed1(&mut self, x: i64) -> Result<()> {
        self.put([x])
    }

    pub fn signed2(&mut self, x: i64, y: i64) -> Result<()> {
        self.put([x, y])
    }

    pub fn signed3(&mut self, x: i64, y: i64, z: i64) -> Result<()> {
        self.put([x, y, z])
    }

    pub fn signed4(&mut self, x: i64, y: i64, z: i64, w: i64) -> Result<()> {
        self.put([x, y, z, w])
    }

    pub fn unsigned1(&mut self, x: u64) -> Result<()> {
        self.put([x])
    }

    pub fn unsigned2(&mut self, x: u64, y: u64) -> Result<()> {
        self.put([x, y])
    }

    pub fn unsigned3(&mut self, x: u64, y: u64, z: u64) -> Result<()> {
        self.put([x, y, z])
    }

    pub fn unsigned4(&mut self, x: u64, y: u64, z: u64, w: u64) -> Result<()> {
        self.put([x, y, z, w])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attribute;
    use pretty_assertions::assert_eq;

    fn layout() -> PackingLayout {
        PackingLayout::new([
            Attribute::float("POSITION", 3, 32).unwrap(),
            Attribute::unsigned("ID", 1, 16).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_clamps_at_last_vertex() {
        let layout = layout();
        let mut buffer = vec![0u8; 3 * layout.vertex_stride_octets()];
        let mut packer =
            AttributePacker::new(&mut buffer[..], &layout, "ID", 3, DataByteOrder::BigEndian)
                .unwrap();
        for id in [10, 20, 30, 40] {
            packer.unsigned1(id).unwrap();
        }
        assert_eq!(packer.index().get(), 2);

        let codec = CursorCodec::for_attribute(
            layout.packed("ID").unwrap().attribute(),
            DataByteOrder::BigEndian,
        )
        .unwrap();
        let stride = layout.vertex_stride_octets();
        let read = |v: usize| codec.read::<u64, 1>(&buffer, v * stride + 12).unwrap()[0];
        assert_eq!([read(0), read(1), read(2)], [10, 20, 40]);
    }

    #[test]
    fn test_interleaves_with_stride() {
        let layout = layout();
        let mut buffer = vec![0u8; 2 * layout.vertex_stride_octets()];
        let mut packer = AttributePacker::new(
            &mut buffer[..],
            &layout,
            "POSITION",
            2,
            DataByteOrder::LittleEndian,
        )
        .unwrap();
        packer.float3(1.0, 2.0, 3.0).unwrap();
        packer.float3(4.0, 5.0, 6.0).unwrap();

        assert_eq!(&buffer[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&buffer[14..18], &4.0f32.to_le_bytes());
        assert_eq!(&buffer[22..26], &6.0f32.to_le_bytes());
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let layout = layout();
        let mut packer = AttributePacker::new(
            vec![0u8; layout.vertex_stride_octets()],
            &layout,
            "POSITION",
            1,
            DataByteOrder::BigEndian,
        )
        .unwrap();
        assert!(matches!(
            packer.float2(1.0, 2.0),
            Err(Error::IncorrectType { .. })
        ));
        assert!(matches!(
            packer.signed3(1, 2, 3),
            Err(Error::IncorrectType { .. })
        ));
        assert_eq!(packer.index().get(), 0);
    }

    #[test]
    fn test_unknown_attribute_target() {
        assert!(matches!(
            PackTarget::resolve(&layout(), "NORMAL", 2, DataByteOrder::BigEndian),
            Err(Error::UnknownAttribute(name)) if name == "NORMAL"
        ));
    }

    #[test]
    fn test_zero_vertices_ignores_writes() {
        let layout = layout();
        let mut packer =
            AttributePacker::new(Vec::new(), &layout, "ID", 0, DataByteOrder::BigEndian).unwrap();
        packer.unsigned1(5).unwrap();
        assert!(packer.into_inner().is_empty());
    }
}
