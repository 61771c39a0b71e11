//! # SmfKit
//!
//! Reading and writing SMF ("Simple Mesh Format") binary meshes.
//!
//! ## Layers
//!
//! - **model** - Names, attributes, coordinate systems and the mesh header
//! - **layout** / **cursor** / **packer** - Interleaved vertex layouts and
//!   typed component writes into byte buffers
//! - **binary** - The section-framed container: probing, parsing and serializing
//! - **events** - Receiver traits the parser pushes decoded data into
//! - **mesh** - A ready-made receiver that decodes a whole mesh into memory
//!
//! ## Quick Start
//!
//! ### Writing a Mesh
//!
//! ```
//! use smfkit::binary::BinarySerializer;
//! use smfkit::model::{Attribute, Header};
//!
//! let header = Header::builder()
//!     .with_vertex_count(3)
//!     .with_triangles(1, 16)
//!     .with_attribute(Attribute::float("POSITION", 3, 32)?)
//!     .build()?;
//!
//! let mut serializer = BinarySerializer::new(Vec::new());
//! serializer.serialize_header(&header)?;
//!
//! let mut vertices = serializer.serialize_vertices_non_interleaved()?;
//! let mut position = vertices.attribute("POSITION")?;
//! position.write([0.0, 0.0, 0.0])?;
//! position.write([1.0, 0.0, 0.0])?;
//! position.write([0.0, 1.0, 0.0])?;
//! position.finish()?;
//! vertices.finish()?;
//!
//! let mut triangles = serializer.serialize_triangles()?;
//! triangles.triangle(0, 1, 2)?;
//! triangles.finish()?;
//!
//! let bytes = serializer.finish()?;
//! # assert_eq!(smfkit::binary::probe(bytes.as_slice())?.major, 1);
//! # Ok::<(), smfkit::Error>(())
//! ```
//!
//! ### Loading Packed Buffers
//!
//! ```no_run
//! use smfkit::packer::{PackAllAttributes, PackedMeshLoader};
//!
//! let file = std::io::BufReader::new(std::fs::File::open("mesh.smf").unwrap());
//! let mesh = PackedMeshLoader::load(PackAllAttributes, file).unwrap();
//! let vertices = &mesh.attribute_sets[&0];
//! println!("{} octets per vertex", vertices.layout.vertex_stride_octets());
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `smfkit` command-line binary

pub mod binary;
pub mod cursor;
pub mod error;
pub mod events;
pub mod layout;
pub mod mesh;
pub mod model;
pub mod packer;

// Re-exports for convenience
pub use error::{Error, ErrorCategory, ParseError, ParseWarning, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorCategory, ParseError, ParseWarning, Result};
    pub use crate::model::{
        Attribute, AttributeName, AxisSystem, ComponentType, CoordinateSystem, DataByteOrder,
        FormatVersion, Header, SchemaIdentifier, SchemaName, Triangles, WindingOrder,
    };
    pub use crate::layout::PackingLayout;
    pub use crate::packer::{
        AttributePacker, PackedMesh, PackedMeshConfig, PackedMeshLoader, TrianglePacker,
    };
    pub use crate::events::{
        AttributeValueEvents, BodyEvents, ErrorEvents, HeaderEvents, MetadataEvents,
        NonInterleavedEvents, ParserEvents, Receive, TriangleEvents,
    };
    pub use crate::binary::{BinaryParser, BinarySerializer, ParserState, probe};
    pub use crate::mesh::{AttributeValues, MemoryMesh};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
