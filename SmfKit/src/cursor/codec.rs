//! Typed component codecs.
//!
//! A [`CursorCodec`] reads and writes one attribute value (one to four
//! components) at a caller-supplied byte offset inside a raw buffer. The
//! logical value type at the API boundary is `f64` for floats, `i64` for
//! signed integers and `u64` for unsigned integers; storage width and byte
//! order come from the attribute and header.
//!
//! Conversions:
//!
//! - float16: round to nearest on write, exact on read
//! - float32: narrowed on write, widened on read
//! - signed: wrapping truncation on write, sign extension on read
//! - unsigned: low bits stored on write, zero extension on read

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use half::f16;

use crate::error::{Error, Result};
use crate::model::attribute::shape_name;
use crate::model::{Attribute, ComponentType, DataByteOrder, Triangles};

/// Storage width of an integer component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntegerWidth {
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::W8),
            16 => Some(Self::W16),
            32 => Some(Self::W32),
            64 => Some(Self::W64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    #[must_use]
    pub const fn size_octets(self) -> usize {
        self.bits() as usize / 8
    }

    /// Largest unsigned value the width holds.
    #[must_use]
    pub const fn max_unsigned(self) -> u64 {
        match self {
            Self::W8 => u8::MAX as u64,
            Self::W16 => u16::MAX as u64,
            Self::W32 => u32::MAX as u64,
            Self::W64 => u64::MAX,
        }
    }

    fn write_signed<B: ByteOrder>(self, out: &mut [u8], value: i64) {
        match self {
            Self::W8 => out[0] = value as i8 as u8,
            Self::W16 => B::write_i16(out, value as i16),
            Self::W32 => B::write_i32(out, value as i32),
            Self::W64 => B::write_i64(out, value),
        }
    }

    fn read_signed<B: ByteOrder>(self, src: &[u8]) -> i64 {
        match self {
            Self::W8 => i64::from(src[0] as i8),
            Self::W16 => i64::from(B::read_i16(src)),
            Self::W32 => i64::from(B::read_i32(src)),
            Self::W64 => B::read_i64(src),
        }
    }

    fn write_unsigned<B: ByteOrder>(self, out: &mut [u8], value: u64) {
        match self {
            Self::W8 => out[0] = value as u8,
            Self::W16 => B::write_u16(out, value as u16),
            Self::W32 => B::write_u32(out, value as u32),
            Self::W64 => B::write_u64(out, value),
        }
    }

    fn read_unsigned<B: ByteOrder>(self, src: &[u8]) -> u64 {
        match self {
            Self::W8 => u64::from(src[0]),
            Self::W16 => u64::from(B::read_u16(src)),
            Self::W32 => u64::from(B::read_u32(src)),
            Self::W64 => B::read_u64(src),
        }
    }
}

/// Storage width of a float component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F16,
    F32,
    F64,
}

impl FloatWidth {
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(Self::F16),
            32 => Some(Self::F32),
            64 => Some(Self::F64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::F16 => 16,
            Self::F32 => 32,
            Self::F64 => 64,
        }
    }

    #[must_use]
    pub const fn size_octets(self) -> usize {
        self.bits() as usize / 8
    }

    fn write<B: ByteOrder>(self, out: &mut [u8], value: f64) {
        match self {
            Self::F16 => B::write_u16(out, f16::from_f64(value).to_bits()),
            Self::F32 => B::write_f32(out, value as f32),
            Self::F64 => B::write_f64(out, value),
        }
    }

    fn read<B: ByteOrder>(self, src: &[u8]) -> f64 {
        match self {
            Self::F16 => f16::from_bits(B::read_u16(src)).to_f64(),
            Self::F32 => f64::from(B::read_f32(src)),
            Self::F64 => B::read_f64(src),
        }
    }
}

/// Domain plus storage width of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentCodec {
    Signed(IntegerWidth),
    Unsigned(IntegerWidth),
    Float(FloatWidth),
}

impl ComponentCodec {
    /// Select the codec for a component kind and size.
    pub fn select(kind: ComponentType, bits: u32) -> Result<Self> {
        let codec = match kind {
            ComponentType::SignedInteger => IntegerWidth::from_bits(bits).map(Self::Signed),
            ComponentType::UnsignedInteger => IntegerWidth::from_bits(bits).map(Self::Unsigned),
            ComponentType::Float => FloatWidth::from_bits(bits).map(Self::Float),
        };
        codec.ok_or(Error::InvalidComponentSize {
            kind: kind.name(),
            bits,
        })
    }

    #[must_use]
    pub const fn kind(self) -> ComponentType {
        match self {
            Self::Signed(_) => ComponentType::SignedInteger,
            Self::Unsigned(_) => ComponentType::UnsignedInteger,
            Self::Float(_) => ComponentType::Float,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Signed(width) | Self::Unsigned(width) => width.bits(),
            Self::Float(width) => width.bits(),
        }
    }

    #[must_use]
    pub const fn size_octets(self) -> usize {
        self.bits() as usize / 8
    }
}

/// A logical component value type: `f64`, `i64` or `u64`.
///
/// `encode` and `decode` panic when handed a codec of another domain;
/// [`CursorCodec`] checks the shape before calling them.
pub trait ComponentValue: Copy + Default + std::fmt::Debug {
    /// The component domain this value type belongs to.
    const KIND: ComponentType;

    #[doc(hidden)]
    fn encode<B: ByteOrder>(codec: ComponentCodec, out: &mut [u8], value: Self);

    #[doc(hidden)]
    fn decode<B: ByteOrder>(codec: ComponentCodec, src: &[u8]) -> Self;
}

impl ComponentValue for f64 {
    const KIND: ComponentType = ComponentType::Float;

    fn encode<B: ByteOrder>(codec: ComponentCodec, out: &mut [u8], value: Self) {
        match codec {
            ComponentCodec::Float(width) => width.write::<B>(out, value),
            other => unreachable!("f64 value encoded with {other:?} codec"),
        }
    }

    fn decode<B: ByteOrder>(codec: ComponentCodec, src: &[u8]) -> Self {
        match codec {
            ComponentCodec::Float(width) => width.read::<B>(src),
            other => unreachable!("f64 value decoded with {other:?} codec"),
        }
    }
}

impl ComponentValue for i64 {
    const KIND: ComponentType = ComponentType::SignedInteger;

    fn encode<B: ByteOrder>(codec: ComponentCodec, out: &mut [u8], value: Self) {
        match codec {
            ComponentCodec::Signed(width) => width.write_signed::<B>(out, value),
            other => unreachable!("i64 value encoded with {other:?} codec"),
        }
    }

    fn decode<B: ByteOrder>(codec: ComponentCodec, src: &[u8]) -> Self {
        match codec {
            ComponentCodec::Signed(width) => width.read_signed::<B>(src),
            other => unreachable!("i64 value decoded with {other:?} codec"),
        }
    }
}

impl ComponentValue for u64 {
    const KIND: ComponentType = ComponentType::UnsignedInteger;

    fn encode<B: ByteOrder>(codec: ComponentCodec, out: &mut [u8], value: Self) {
        match codec {
            ComponentCodec::Unsigned(width) => width.write_unsigned::<B>(out, value),
            other => unreachable!("u64 value encoded with {other:?} codec"),
        }
    }

    fn decode<B: ByteOrder>(codec: ComponentCodec, src: &[u8]) -> Self {
        match codec {
            ComponentCodec::Unsigned(width) => width.read_unsigned::<B>(src),
            other => unreachable!("u64 value decoded with {other:?} codec"),
        }
    }
}

/// Reads and writes complete attribute values at arbitrary buffer offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorCodec {
    label: String,
    component: ComponentCodec,
    count: usize,
    order: DataByteOrder,
}

impl CursorCodec {
    /// Codec for `count` components of kind `component`, labelled for error messages.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        component: ComponentCodec,
        count: usize,
        order: DataByteOrder,
    ) -> Self {
        Self {
            label: label.into(),
            component,
            count,
            order,
        }
    }

    /// Codec for values of `attribute`.
    pub fn for_attribute(attribute: &Attribute, order: DataByteOrder) -> Result<Self> {
        let component =
            ComponentCodec::select(attribute.component_type(), attribute.component_size_bits())?;
        Ok(Self::new(
            attribute.name().as_str(),
            component,
            attribute.component_count() as usize,
            order,
        ))
    }

    /// Codec for one triangle (three unsigned indices).
    pub fn for_triangles(triangles: Triangles, order: DataByteOrder) -> Result<Self> {
        let width = IntegerWidth::from_bits(triangles.index_size_bits())
            .ok_or(Error::InvalidTriangleIndexSize(triangles.index_size_bits()))?;
        Ok(Self::new(
            "triangles",
            ComponentCodec::Unsigned(width),
            3,
            order,
        ))
    }

    #[must_use]
    pub fn component(&self) -> ComponentCodec {
        self.component
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn byte_order(&self) -> DataByteOrder {
        self.order
    }

    /// Octets occupied by one value.
    #[must_use]
    pub fn size_octets(&self) -> usize {
        self.component.size_octets() * self.count
    }

    /// Write `values` at `offset`; `N` must equal the component count.
    pub fn write<T: ComponentValue, const N: usize>(
        &self,
        buffer: &mut [u8],
        offset: usize,
        values: [T; N],
    ) -> Result<()> {
        self.write_slice(buffer, offset, &values)
    }

    /// Read a value at `offset`; `N` must equal the component count.
    pub fn read<T: ComponentValue, const N: usize>(
        &self,
        buffer: &[u8],
        offset: usize,
    ) -> Result<[T; N]> {
        let mut values = [T::default(); N];
        self.read_into(buffer, offset, &mut values)?;
        Ok(values)
    }

    /// Write a value given as a slice of components.
    pub fn write_slice<T: ComponentValue>(
        &self,
        buffer: &mut [u8],
        offset: usize,
        values: &[T],
    ) -> Result<()> {
        self.check_shape::<T>(values.len())?;
        let size = self.size_octets();
        let capacity = buffer.len();
        let slot = offset
            .checked_add(size)
            .and_then(|end| buffer.get_mut(offset..end))
            .ok_or(Error::BufferOverrun {
                offset,
                length: size,
                capacity,
            })?;

        let width = self.component.size_octets();
        for (chunk, &value) in slot.chunks_exact_mut(width).zip(values) {
            match self.order {
                DataByteOrder::BigEndian => T::encode::<BigEndian>(self.component, chunk, value),
                DataByteOrder::LittleEndian => {
                    T::encode::<LittleEndian>(self.component, chunk, value);
                }
            }
        }
        Ok(())
    }

    /// Read a value into a slice of components.
    pub fn read_into<T: ComponentValue>(
        &self,
        buffer: &[u8],
        offset: usize,
        values: &mut [T],
    ) -> Result<()> {
        self.check_shape::<T>(values.len())?;
        let size = self.size_octets();
        let slot = offset
            .checked_add(size)
            .and_then(|end| buffer.get(offset..end))
            .ok_or(Error::BufferOverrun {
                offset,
                length: size,
                capacity: buffer.len(),
            })?;

        let width = self.component.size_octets();
        for (chunk, value) in slot.chunks_exact(width).zip(values.iter_mut()) {
            *value = match self.order {
                DataByteOrder::BigEndian => T::decode::<BigEndian>(self.component, chunk),
                DataByteOrder::LittleEndian => T::decode::<LittleEndian>(self.component, chunk),
            };
        }
        Ok(())
    }

    fn check_shape<T: ComponentValue>(&self, count: usize) -> Result<()> {
        if T::KIND == self.component.kind() && count == self.count {
            return Ok(());
        }
        Err(Error::IncorrectType {
            attribute: self.label.clone(),
            expected: shape_name(self.component.kind(), self.component.bits(), self.count as u32),
            received: shape_name(T::KIND, self.component.bits(), count as u32),
        })
    }
}
