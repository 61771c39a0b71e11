//! Error types for `SmfKit`

use std::fmt;

use thiserror::Error;

/// The error type for `SmfKit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Container Errors ====================
    /// The stream does not start with the SMF format tag.
    #[error("invalid SMF magic: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// The format tag every SMF binary stream starts with.
        expected: [u8; 8],
        /// The octets actually read.
        found: [u8; 8],
    },

    /// The declared format version has no parser (or writer).
    #[error("unsupported SMF format version {major}.{minor}")]
    UnsupportedVersion {
        /// Declared major version.
        major: u32,
        /// Declared minor version.
        minor: u32,
    },

    /// The first section of a stream is not a header section.
    #[error("files must begin with an SMF_HEAD section: expected {expected:#018x}, received {received:#018x}")]
    UnexpectedFirstSection {
        /// The header section magic.
        expected: u64,
        /// The magic that was read.
        received: u64,
    },

    /// A section is too small to hold the fixed fields its version requires.
    #[error("section is too small to contain a version {major}.{minor} header: required {required} octets, received {received}")]
    SectionTooSmall {
        /// Format major version.
        major: u32,
        /// Format minor version.
        minor: u32,
        /// Required minimum size in octets.
        required: u64,
        /// Declared size of the section.
        received: u64,
    },

    /// The header's attribute table offset points inside the fixed fields.
    #[error("attribute table offset {offset} overlaps the {fixed}-octet fixed header")]
    AttributeTableOverlap {
        /// Declared attribute table offset.
        offset: u32,
        /// Size of the fixed header struct.
        fixed: u32,
    },

    /// The header declares a fixed struct smaller than its version defines.
    #[error("header declares {declared} octets of fixed fields, version requires at least {fixed}")]
    HeaderFieldsTooSmall {
        /// Declared fields size.
        declared: u32,
        /// Size of the fixed header struct.
        fixed: u32,
    },

    /// A read went past the end of a bounded section.
    #[error("read past end of section at position {position} (section ends at {end})")]
    SectionOverrun {
        /// Stream position of the failed read.
        position: u64,
        /// Absolute end of the section.
        end: u64,
    },

    /// The stream ended in the middle of a record.
    #[error("unexpected end of stream at position {position}")]
    UnexpectedEndOfStream {
        /// Stream position of the failed read.
        position: u64,
    },

    /// A section was about to start at a position that is not 16-octet aligned.
    #[error("section start at position {position} is not aligned to {alignment} octets")]
    MisalignedSection {
        /// Writer position.
        position: u64,
        /// Required alignment.
        alignment: u64,
    },

    /// Offset or size arithmetic overflowed.
    #[error("arithmetic overflow computing {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },

    /// A metadata section declares more data than it holds.
    #[error("metadata declares {declared} octets but only {available} remain ({shortfall} missing)")]
    MetadataTruncated {
        /// Size declared in the metadata record.
        declared: u64,
        /// Octets remaining in the section.
        available: u64,
        /// `declared - available`.
        shortfall: u64,
    },

    /// An allocated buffer does not have exactly the requested size.
    #[error("buffer for {purpose} has {actual} octets, expected exactly {expected}")]
    BufferSizeMismatch {
        /// What the buffer is for.
        purpose: String,
        /// Requested size.
        expected: u64,
        /// Size of the returned buffer.
        actual: u64,
    },

    /// A cursor write or read would fall outside its buffer.
    #[error("access of {length} octets at offset {offset} exceeds buffer of {capacity} octets")]
    BufferOverrun {
        /// Byte offset of the access.
        offset: usize,
        /// Number of octets accessed.
        length: usize,
        /// Buffer capacity.
        capacity: usize,
    },

    /// A stored name is not valid UTF-8 or claims more than the field holds.
    #[error("invalid encoded name (length {length}, capacity {capacity})")]
    InvalidEncodedName {
        /// Declared length.
        length: u32,
        /// Fixed field capacity.
        capacity: usize,
    },

    // ==================== Model Errors ====================
    /// Unknown component kind code.
    #[error("unrecognized component kind code: {0}")]
    InvalidComponentKind(u32),

    /// Component count outside `1..=4`.
    #[error("component count must be in 1..=4, got {0}")]
    InvalidComponentCount(u32),

    /// Component size not allowed for its kind.
    #[error("component size {bits} is not valid for {kind} components")]
    InvalidComponentSize {
        /// Component kind name.
        kind: &'static str,
        /// Offending size in bits.
        bits: u32,
    },

    /// Triangle index size outside `{8, 16, 32, 64}`.
    #[error("triangle index size must be 8, 16, 32 or 64 bits, got {0}")]
    InvalidTriangleIndexSize(u32),

    /// Unknown axis code.
    #[error("unrecognized axis value: {0}")]
    InvalidAxis(u8),

    /// Axes of a coordinate system share a line.
    #[error("axes {right} {up} {forward} are not mutually perpendicular")]
    NonPerpendicularAxes {
        /// Right axis.
        right: String,
        /// Up axis.
        up: String,
        /// Forward axis.
        forward: String,
    },

    /// Unknown winding order code.
    #[error("unrecognized winding order value: {0}")]
    InvalidWindingOrder(u8),

    /// Unknown data byte order code.
    #[error("unrecognized data byte order value: {0}")]
    InvalidByteOrder(u32),

    // ==================== Validation Errors ====================
    /// An attribute name does not match the naming rules.
    #[error("invalid attribute name {name:?}: {reason}")]
    InvalidAttributeName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A schema name does not match the naming rules.
    #[error("invalid schema name {name:?}: {reason}")]
    InvalidSchemaName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Two attributes share a name.
    #[error("duplicate attribute name: {0}")]
    DuplicateAttributeName(String),

    /// Two packed attributes share a byte offset.
    #[error("duplicate attribute offset: {0}")]
    DuplicateAttributeOffset(usize),

    /// A name does not fit its fixed-capacity field.
    #[error("name {name:?} is {length} octets, field capacity is {capacity}")]
    NameTooLong {
        /// The rejected name.
        name: String,
        /// Encoded length in octets.
        length: usize,
        /// Field capacity in octets.
        capacity: usize,
    },

    /// A name does not refer to any attribute of the header.
    #[error("no such attribute: {0}")]
    UnknownAttribute(String),

    /// A value was supplied with the wrong component type or count.
    #[error("incorrect type for attribute {attribute}: expected {expected}, received {received}")]
    IncorrectType {
        /// Attribute being written.
        attribute: String,
        /// The attribute's declared shape.
        expected: String,
        /// The shape of the supplied value.
        received: String,
    },

    /// Attributes were serialized out of header order.
    #[error("attribute out of order: expected {expected}, received {received}")]
    AttributeOutOfOrder {
        /// The next attribute in header order.
        expected: String,
        /// The attribute that was started.
        received: String,
    },

    /// More vertices were supplied than the header declares.
    #[error("too many vertices for attribute {attribute}: header declares {expected}")]
    TooManyVertices {
        /// Attribute being written.
        attribute: String,
        /// Declared vertex count.
        expected: u64,
    },

    /// Fewer vertices were supplied than the header declares.
    #[error("too few vertices for attribute {attribute}: expected {expected}, received {received}")]
    TooFewVertices {
        /// Attribute being written.
        attribute: String,
        /// Declared vertex count.
        expected: u64,
        /// Vertices written.
        received: u64,
    },

    /// More triangles were supplied than the header declares.
    #[error("too many triangles: header declares {expected}")]
    TooManyTriangles {
        /// Declared triangle count.
        expected: u64,
    },

    /// Fewer triangles were supplied than the header declares.
    #[error("too few triangles: expected {expected}, received {received}")]
    TooFewTriangles {
        /// Declared triangle count.
        expected: u64,
        /// Triangles written.
        received: u64,
    },

    /// A triangle index does not fit the declared index width.
    #[error("triangle index {index} does not fit in {bits} bits")]
    TriangleIndexTooLarge {
        /// The offending index.
        index: u64,
        /// Declared index size.
        bits: u32,
    },

    /// The header declares vertices but no vertex section was provided.
    #[error("a non-zero vertex count ({0}) was specified, but no vertices were provided")]
    MissingVertices(u64),

    /// The header declares triangles but no triangle section was provided.
    #[error("a non-zero triangle count ({0}) was specified, but no triangles were provided")]
    MissingTriangles(u64),

    /// A serializer operation was called in the wrong order.
    #[error("serializer misuse: {0}")]
    SerializerState(&'static str),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or inconsistent container data; aborts the current pass.
    Structural,
    /// Invalid names, duplicates or count mismatches supplied by a caller.
    Validation,
    /// Failure of the underlying stream.
    Io,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) => ErrorCategory::Io,
            Self::InvalidAttributeName { .. }
            | Self::InvalidSchemaName { .. }
            | Self::DuplicateAttributeName(_)
            | Self::DuplicateAttributeOffset(_)
            | Self::NameTooLong { .. }
            | Self::UnknownAttribute(_)
            | Self::IncorrectType { .. }
            | Self::AttributeOutOfOrder { .. }
            | Self::TooManyVertices { .. }
            | Self::TooFewVertices { .. }
            | Self::TooManyTriangles { .. }
            | Self::TooFewTriangles { .. }
            | Self::TriangleIndexTooLarge { .. }
            | Self::MissingVertices(_)
            | Self::MissingTriangles(_)
            | Self::SerializerState(_) => ErrorCategory::Validation,
            _ => ErrorCategory::Structural,
        }
    }

    /// Returns true for structural errors.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.category() == ErrorCategory::Structural
    }
}

/// An error reported through a receiver's error channel while parsing.
#[derive(Debug)]
pub struct ParseError {
    /// Absolute stream position, if known.
    pub position: Option<u64>,
    /// The underlying error.
    pub error: Error,
}

impl ParseError {
    /// An error at a known stream position.
    #[must_use]
    pub fn at(position: u64, error: Error) -> Self {
        Self {
            position: Some(position),
            error,
        }
    }

    /// An error without position information.
    #[must_use]
    pub fn unpositioned(error: Error) -> Self {
        Self {
            position: None,
            error,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "[{position}] {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// A non-fatal condition reported while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// Absolute stream position, if known.
    pub position: Option<u64>,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "[{position}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::DuplicateAttributeName("x".into()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            Error::MetadataTruncated {
                declared: 32,
                available: 16,
                shortfall: 16
            }
            .category(),
            ErrorCategory::Structural
        );
        let io = std::io::Error::other("boom");
        assert_eq!(Error::from(io).category(), ErrorCategory::Io);
    }

    #[test]
    fn test_parse_error_display_includes_position() {
        let error = ParseError::at(48, Error::MissingTriangles(3));
        assert!(error.to_string().starts_with("[48] "));
    }
}
