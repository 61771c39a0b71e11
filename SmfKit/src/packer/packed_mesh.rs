//! Loading a stream straight into packed buffers.
//!
//! [`PackedMeshLoader`] is a ready-made receiver: it asks a
//! [`PackedMeshConfig`] which interleaved layouts to build, requests exactly
//! sized buffers through [`PackedMeshConfig::allocate`], and fans every parsed
//! attribute value out to each layout that contains the attribute.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::mem;

use tracing::debug;

use super::{AttributePacker, PackTarget, TrianglePacker};
use crate::binary::BinaryParser;
use crate::cursor::ComponentValue;
use crate::error::{Error, ParseError, ParseWarning, Result};
use crate::events::{
    AttributeValueEvents, BodyEvents, ErrorEvents, HeaderEvents, MetadataEvents,
    NonInterleavedEvents, ParserEvents, Receive, TriangleEvents,
};
use crate::layout::PackingLayout;
use crate::model::{Attribute, DataByteOrder, FormatVersion, Header, SchemaIdentifier, Triangles};

/// What a requested buffer will hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPurpose {
    /// Interleaved vertex records for the layout with this id.
    Attributes { id: u32 },
    Triangles,
}

impl fmt::Display for BufferPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attributes { id } => write!(f, "attribute layout {id}"),
            Self::Triangles => f.write_str("triangles"),
        }
    }
}

/// Caller policy for [`PackedMeshLoader`].
pub trait PackedMeshConfig {
    /// Layouts to pack, keyed by caller-chosen ids.
    fn packing_layouts(&mut self, header: &Header) -> Result<BTreeMap<u32, PackingLayout>>;

    /// Whether to pack triangles.
    fn pack_triangles(&mut self, header: &Header) -> bool {
        let _ = header;
        true
    }

    /// Byte order of the packed buffers.
    fn byte_order(&self) -> DataByteOrder {
        DataByteOrder::native()
    }

    /// Return a buffer of exactly `size_octets` octets.
    fn allocate(&mut self, purpose: BufferPurpose, size_octets: u64) -> Vec<u8>;
}

/// Packs every attribute of the header into one layout and allocates on the heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackAllAttributes;

impl PackedMeshConfig for PackAllAttributes {
    fn packing_layouts(&mut self, header: &Header) -> Result<BTreeMap<u32, PackingLayout>> {
        Ok(BTreeMap::from([(0, PackingLayout::from_header(header)?)]))
    }

    fn allocate(&mut self, _purpose: BufferPurpose, size_octets: u64) -> Vec<u8> {
        vec![0u8; usize::try_from(size_octets).unwrap_or(0)]
    }
}

/// One packed layout and its buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedAttributeSet {
    pub layout: PackingLayout,
    pub buffer: Vec<u8>,
}

/// Packed triangle indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTriangles {
    pub triangles: Triangles,
    pub buffer: Vec<u8>,
}

/// The result of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedMesh {
    pub header: Header,
    pub byte_order: DataByteOrder,
    pub attribute_sets: BTreeMap<u32, PackedAttributeSet>,
    pub triangles: Option<PackedTriangles>,
}

/// Parser receiver that materialises a mesh into packed buffers.
#[derive(Debug)]
pub struct PackedMeshLoader<C> {
    config: C,
    header: Option<Header>,
    sets: BTreeMap<u32, PackedAttributeSet>,
    active: Vec<(u32, AttributePacker<Vec<u8>>)>,
    triangles: Option<(Triangles, TrianglePacker<Vec<u8>>)>,
    errors: Vec<ParseError>,
    warnings: Vec<ParseWarning>,
}

impl<C: PackedMeshConfig> PackedMeshLoader<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            header: None,
            sets: BTreeMap::new(),
            active: Vec::new(),
            triangles: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Parse `reader` and return the packed mesh, or every error reported.
    pub fn load<R: Read>(config: C, reader: R) -> std::result::Result<PackedMesh, Vec<ParseError>> {
        let mut loader = Self::new(config);
        BinaryParser::new(reader).parse(&mut loader);
        loader.into_mesh()
    }

    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    #[must_use]
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// The packed mesh, if parsing produced a header and no errors.
    pub fn into_mesh(self) -> std::result::Result<PackedMesh, Vec<ParseError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        let Some(header) = self.header else {
            return Err(vec![ParseError::unpositioned(Error::SerializerState(
                "no header was parsed",
            ))]);
        };
        Ok(PackedMesh {
            header,
            byte_order: self.config.byte_order(),
            attribute_sets: self.sets,
            triangles: self.triangles.map(|(triangles, packer)| PackedTriangles {
                triangles,
                buffer: packer.into_inner(),
            }),
        })
    }

    fn allocate(&mut self, purpose: BufferPurpose, size_octets: u64) -> Result<Vec<u8>> {
        debug!("Allocating {} octets for {}", size_octets, purpose);
        let buffer = self.config.allocate(purpose, size_octets);
        if buffer.len() as u64 != size_octets {
            return Err(Error::BufferSizeMismatch {
                purpose: purpose.to_string(),
                expected: size_octets,
                actual: buffer.len() as u64,
            });
        }
        Ok(buffer)
    }

    fn prepare(&mut self, header: &Header) -> Result<()> {
        let layouts = self.config.packing_layouts(header)?;
        for (id, layout) in layouts {
            let size = layout.buffer_size_octets(header.vertex_count())?;
            let buffer = self.allocate(BufferPurpose::Attributes { id }, size)?;
            self.sets.insert(id, PackedAttributeSet { layout, buffer });
        }

        if self.config.pack_triangles(header) {
            let triangles = header.triangles();
            let size = triangles
                .count()
                .checked_mul(triangles.triangle_size_octets())
                .ok_or(Error::ArithmeticOverflow {
                    context: "triangle buffer size",
                })?;
            let buffer = self.allocate(BufferPurpose::Triangles, size)?;
            let packer = TrianglePacker::new(buffer, triangles, self.config.byte_order())?;
            self.triangles = Some((triangles, packer));
        }
        Ok(())
    }

    fn start_packers(&mut self, attribute: &Attribute) -> Result<()> {
        let vertex_count = self.header.as_ref().map_or(0, Header::vertex_count);
        let order = self.config.byte_order();
        let name = attribute.name().as_str();
        for (&id, set) in &mut self.sets {
            if !set.layout.contains(name) {
                continue;
            }
            let target = PackTarget::resolve(&set.layout, name, vertex_count, order)?;
            let buffer = mem::take(&mut set.buffer);
            self.active.push((id, AttributePacker::with_target(buffer, target)));
        }
        Ok(())
    }

    fn put_all<T: ComponentValue>(&mut self, values: &[T]) {
        let mut failures = Vec::new();
        for (_, packer) in &mut self.active {
            if let Err(e) = packer.put_slice(values) {
                failures.push(ParseError::unpositioned(e));
            }
        }
        self.errors.extend(failures);
    }
}

impl<C: PackedMeshConfig> ErrorEvents for PackedMeshLoader<C> {
    fn on_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn on_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }
}

impl<C: PackedMeshConfig> ParserEvents for PackedMeshLoader<C> {
    fn on_version_received(&mut self, _version: FormatVersion) -> Receive<&mut dyn HeaderEvents> {
        Receive::Accepted(self)
    }
}

impl<C: PackedMeshConfig> HeaderEvents for PackedMeshLoader<C> {
    fn on_header_parsed(&mut self, header: &Header) -> Receive<&mut dyn BodyEvents> {
        if let Err(e) = self.prepare(header) {
            self.errors.push(ParseError::unpositioned(e));
            return Receive::Declined;
        }
        self.header = Some(header.clone());
        Receive::Accepted(self)
    }
}

impl<C: PackedMeshConfig> BodyEvents for PackedMeshLoader<C> {
    fn on_vertices_non_interleaved(&mut self) -> Receive<&mut dyn NonInterleavedEvents> {
        if self.sets.is_empty() {
            return Receive::Declined;
        }
        Receive::Accepted(self)
    }

    fn on_triangles(&mut self) -> Receive<&mut dyn TriangleEvents> {
        if self.triangles.is_none() {
            return Receive::Declined;
        }
        Receive::Accepted(self)
    }

    fn on_metadata(
        &mut self,
        _schema: &SchemaIdentifier,
        _size: u64,
    ) -> Receive<&mut dyn MetadataEvents> {
        Receive::Declined
    }
}

impl<C: PackedMeshConfig> NonInterleavedEvents for PackedMeshLoader<C> {
    fn on_attribute_start(
        &mut self,
        attribute: &Attribute,
    ) -> Receive<&mut dyn AttributeValueEvents> {
        if let Err(e) = self.start_packers(attribute) {
            self.errors.push(ParseError::unpositioned(e));
        }
        if self.active.is_empty() {
            return Receive::Declined;
        }
        Receive::Accepted(self)
    }
}

impl<C: PackedMeshConfig> AttributeValueEvents for PackedMeshLoader<C> {
    fn on_float(&mut self, values: &[f64]) {
        self.put_all(values);
    }

    fn on_signed(&mut self, values: &[i64]) {
        self.put_all(values);
    }

    fn on_unsigned(&mut self, values: &[u64]) {
        self.put_all(values);
    }

    fn on_attribute_finish(&mut self) {
        for (id, packer) in self.active.drain(..) {
            if let Some(set) = self.sets.get_mut(&id) {
                set.buffer = packer.into_inner();
            }
        }
    }
}

impl<C: PackedMeshConfig> TriangleEvents for PackedMeshLoader<C> {
    fn on_triangle(&mut self, v0: u64, v1: u64, v2: u64) {
        if let Some((_, packer)) = &mut self.triangles {
            if let Err(e) = packer.triangle(v0, v1, v2) {
                self.errors.push(ParseError::unpositioned(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        wrong_size: bool,
    }

    impl PackedMeshConfig for Fixed {
        fn packing_layouts(&mut self, header: &Header) -> Result<BTreeMap<u32, PackingLayout>> {
            Ok(BTreeMap::from([(
                7,
                PackingLayout::from_header_subset(header, ["POSITION"])?,
            )]))
        }

        fn allocate(&mut self, _purpose: BufferPurpose, size_octets: u64) -> Vec<u8> {
            let extra = usize::from(self.wrong_size);
            vec![0u8; size_octets as usize + extra]
        }
    }

    fn header() -> Header {
        Header::builder()
            .with_vertex_count(2)
            .with_attribute(Attribute::float("POSITION", 3, 32).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_buffer_size_mismatch_is_fatal() {
        let mut loader = PackedMeshLoader::new(Fixed { wrong_size: true });
        assert!(!loader.on_header_parsed(&header()).is_accepted());
        assert!(matches!(
            loader.errors()[0].error,
            Error::BufferSizeMismatch {
                expected: 24,
                actual: 25,
                ..
            }
        ));
        assert!(loader.into_mesh().is_err());
    }

    #[test]
    fn test_values_are_packed() {
        let header = header();
        let mut loader = PackedMeshLoader::new(Fixed { wrong_size: false });
        assert!(loader.on_header_parsed(&header).is_accepted());
        let attribute = header.attribute("POSITION").unwrap().clone();
        assert!(loader.on_attribute_start(&attribute).is_accepted());
        loader.on_float(&[1.0, 2.0, 3.0]);
        loader.on_float(&[4.0, 5.0, 6.0]);
        loader.on_attribute_finish();

        let mesh = loader.into_mesh().unwrap();
        let set = &mesh.attribute_sets[&7];
        assert_eq!(set.buffer.len(), 24);
        assert_eq!(set.layout.vertex_stride_octets(), 12);
    }

    #[test]
    fn test_rejected_values_keep_buffer() {
        let header = header();
        let mut loader = PackedMeshLoader::new(Fixed { wrong_size: false });
        assert!(loader.on_header_parsed(&header).is_accepted());
        let attribute = header.attribute("POSITION").unwrap().clone();
        assert!(loader.on_attribute_start(&attribute).is_accepted());
        loader.on_signed(&[1, 2, 3]);
        loader.on_attribute_finish();

        assert!(matches!(
            loader.errors()[0].error,
            Error::IncorrectType { .. }
        ));
        assert_eq!(loader.sets[&7].buffer.len(), 24);
    }
}
