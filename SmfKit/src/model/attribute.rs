//! Vertex attribute descriptors.

use std::fmt;

use serde::Serialize;

use super::names::AttributeName;
use crate::error::{Error, Result};

/// Numeric domain of an attribute's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    /// Two's complement signed integers.
    SignedInteger,
    /// Unsigned integers.
    UnsignedInteger,
    /// IEEE 754 floating point.
    Float,
}

impl ComponentType {
    /// Convert from the binary kind code.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::SignedInteger),
            1 => Ok(Self::UnsignedInteger),
            2 => Ok(Self::Float),
            other => Err(Error::InvalidComponentKind(other)),
        }
    }

    /// The binary kind code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::SignedInteger => 0,
            Self::UnsignedInteger => 1,
            Self::Float => 2,
        }
    }

    /// The canonical textual name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SignedInteger => "integer-signed",
            Self::UnsignedInteger => "integer-unsigned",
            Self::Float => "float",
        }
    }

    /// Whether `bits` is a legal component size for this domain.
    #[must_use]
    pub const fn supports_size(self, bits: u32) -> bool {
        match self {
            Self::SignedInteger | Self::UnsignedInteger => matches!(bits, 8 | 16 | 32 | 64),
            Self::Float => matches!(bits, 16 | 32 | 64),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, typed per-vertex attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Attribute {
    name: AttributeName,
    component_type: ComponentType,
    component_count: u32,
    component_size_bits: u32,
}

impl Attribute {
    /// Create an attribute, checking the count and size constraints.
    pub fn new(
        name: AttributeName,
        component_type: ComponentType,
        component_count: u32,
        component_size_bits: u32,
    ) -> Result<Self> {
        if !(1..=4).contains(&component_count) {
            return Err(Error::InvalidComponentCount(component_count));
        }
        if !component_type.supports_size(component_size_bits) {
            return Err(Error::InvalidComponentSize {
                kind: component_type.name(),
                bits: component_size_bits,
            });
        }
        Ok(Self {
            name,
            component_type,
            component_count,
            component_size_bits,
        })
    }

    /// Shorthand for a float attribute.
    pub fn float(name: &str, count: u32, bits: u32) -> Result<Self> {
        Self::new(AttributeName::new(name)?, ComponentType::Float, count, bits)
    }

    /// Shorthand for a signed integer attribute.
    pub fn signed(name: &str, count: u32, bits: u32) -> Result<Self> {
        Self::new(
            AttributeName::new(name)?,
            ComponentType::SignedInteger,
            count,
            bits,
        )
    }

    /// Shorthand for an unsigned integer attribute.
    pub fn unsigned(name: &str, count: u32, bits: u32) -> Result<Self> {
        Self::new(
            AttributeName::new(name)?,
            ComponentType::UnsignedInteger,
            count,
            bits,
        )
    }

    #[must_use]
    pub fn name(&self) -> &AttributeName {
        &self.name
    }

    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    #[must_use]
    pub fn component_count(&self) -> u32 {
        self.component_count
    }

    #[must_use]
    pub fn component_size_bits(&self) -> u32 {
        self.component_size_bits
    }

    /// Size of one component in octets.
    #[must_use]
    pub fn component_size_octets(&self) -> usize {
        self.component_size_bits as usize / 8
    }

    /// Size of one complete value (all components) in octets.
    #[must_use]
    pub fn size_octets(&self) -> usize {
        self.component_size_octets() * self.component_count as usize
    }

    /// Short type description, e.g. `float32x3`.
    #[must_use]
    pub fn shape(&self) -> String {
        shape_name(
            self.component_type,
            self.component_size_bits,
            self.component_count,
        )
    }
}

pub(crate) fn shape_name(kind: ComponentType, bits: u32, count: u32) -> String {
    let prefix = match kind {
        ComponentType::SignedInteger => "int",
        ComponentType::UnsignedInteger => "uint",
        ComponentType::Float => "float",
    };
    format!("{prefix}{bits}x{count}")
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_octets() {
        let position = Attribute::float("POSITION", 3, 32).unwrap();
        assert_eq!(position.size_octets(), 12);
        assert_eq!(position.shape(), "float32x3");

        let joints = Attribute::unsigned("JOINTS", 4, 8).unwrap();
        assert_eq!(joints.size_octets(), 4);

        let half = Attribute::float("UV", 2, 16).unwrap();
        assert_eq!(half.size_octets(), 4);
    }

    #[test]
    fn test_constraints() {
        assert!(matches!(
            Attribute::float("x", 0, 32),
            Err(Error::InvalidComponentCount(0))
        ));
        assert!(matches!(
            Attribute::float("x", 5, 32),
            Err(Error::InvalidComponentCount(5))
        ));
        assert!(matches!(
            Attribute::float("x", 1, 8),
            Err(Error::InvalidComponentSize { bits: 8, .. })
        ));
        assert!(Attribute::signed("x", 1, 8).is_ok());
        assert!(Attribute::signed("x", 1, 24).is_err());
    }

    #[test]
    fn test_kind_codes() {
        for kind in [
            ComponentType::SignedInteger,
            ComponentType::UnsignedInteger,
            ComponentType::Float,
        ] {
            assert_eq!(ComponentType::from_code(kind.code()).unwrap(), kind);
        }
        assert!(ComponentType::from_code(3).is_err());
    }
}
