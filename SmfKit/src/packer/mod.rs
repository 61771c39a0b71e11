//! Packing vertex and triangle data into caller-owned buffers.

pub mod attribute;
pub mod packed_mesh;
pub mod triangle;

pub use attribute::{AttributePacker, PackTarget};
pub use packed_mesh::{
    BufferPurpose, PackAllAttributes, PackedAttributeSet, PackedMesh, PackedMeshConfig,
    PackedMeshLoader, PackedTriangles,
};
pub use triangle::TrianglePacker;
