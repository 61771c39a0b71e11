//! Mesh data model: attributes, coordinate systems and headers.
//!
//! Everything here is plain immutable data; validation happens once at
//! construction so downstream code can trust it.

pub mod attribute;
pub mod coords;
pub mod header;
pub mod names;
pub mod version;

pub use attribute::{Attribute, ComponentType};
pub use coords::{Axis, AxisSystem, CoordinateSystem, WindingOrder};
pub use header::{DataByteOrder, Header, HeaderBuilder, SchemaIdentifier, Triangles};
pub use names::{AttributeName, NAME_MAX_LENGTH, SchemaName};
pub use version::FormatVersion;
