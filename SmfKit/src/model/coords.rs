//! Coordinate systems and triangle winding.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// A signed coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    PositiveX,
    PositiveY,
    PositiveZ,
    NegativeX,
    NegativeY,
    NegativeZ,
}

impl Axis {
    /// Convert from the packed axis code.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::PositiveX),
            1 => Ok(Self::PositiveY),
            2 => Ok(Self::PositiveZ),
            3 => Ok(Self::NegativeX),
            4 => Ok(Self::NegativeY),
            5 => Ok(Self::NegativeZ),
            other => Err(Error::InvalidAxis(other)),
        }
    }

    /// The packed axis code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::PositiveX => 0,
            Self::PositiveY => 1,
            Self::PositiveZ => 2,
            Self::NegativeX => 3,
            Self::NegativeY => 4,
            Self::NegativeZ => 5,
        }
    }

    /// The unsigned axis line: 0 for X, 1 for Y, 2 for Z.
    #[must_use]
    pub const fn line(self) -> u8 {
        self.code() % 3
    }

    /// Signed short name, e.g. `+x` or `-z`.
    #[must_use]
    pub const fn signed_name(self) -> &'static str {
        match self {
            Self::PositiveX => "+x",
            Self::PositiveY => "+y",
            Self::PositiveZ => "+z",
            Self::NegativeX => "-x",
            Self::NegativeY => "-y",
            Self::NegativeZ => "-z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signed_name())
    }
}

/// Three mutually perpendicular axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AxisSystem {
    right: Axis,
    up: Axis,
    forward: Axis,
}

impl AxisSystem {
    /// Create an axis system; no two axes may lie on the same line.
    pub fn new(right: Axis, up: Axis, forward: Axis) -> Result<Self> {
        let (r, u, f) = (right.line(), up.line(), forward.line());
        if r == u || u == f || r == f {
            return Err(Error::NonPerpendicularAxes {
                right: right.to_string(),
                up: up.to_string(),
                forward: forward.to_string(),
            });
        }
        Ok(Self { right, up, forward })
    }

    #[must_use]
    pub fn right(&self) -> Axis {
        self.right
    }

    #[must_use]
    pub fn up(&self) -> Axis {
        self.up
    }

    #[must_use]
    pub fn forward(&self) -> Axis {
        self.forward
    }
}

impl Default for AxisSystem {
    fn default() -> Self {
        Self {
            right: Axis::PositiveX,
            up: Axis::PositiveY,
            forward: Axis::NegativeZ,
        }
    }
}

/// Vertex order of front-facing triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindingOrder {
    Clockwise,
    #[default]
    CounterClockwise,
}

impl WindingOrder {
    /// Convert from the packed winding code.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Clockwise),
            1 => Ok(Self::CounterClockwise),
            other => Err(Error::InvalidWindingOrder(other)),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Clockwise => 0,
            Self::CounterClockwise => 1,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clockwise => "clockwise",
            Self::CounterClockwise => "counter-clockwise",
        }
    }
}

/// Axes plus winding order. Defaults to `+x +y -z counter-clockwise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CoordinateSystem {
    pub axes: AxisSystem,
    pub winding: WindingOrder,
}

impl CoordinateSystem {
    /// Pack into the four-octet `[right, up, forward, winding]` form.
    #[must_use]
    pub fn pack(&self) -> [u8; 4] {
        [
            self.axes.right.code(),
            self.axes.up.code(),
            self.axes.forward.code(),
            self.winding.code(),
        ]
    }

    /// Unpack from the four-octet form.
    pub fn unpack(packed: [u8; 4]) -> Result<Self> {
        let axes = AxisSystem::new(
            Axis::from_code(packed[0])?,
            Axis::from_code(packed[1])?,
            Axis::from_code(packed[2])?,
        )?;
        Ok(Self {
            axes,
            winding: WindingOrder::from_code(packed[3])?,
        })
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.axes.right,
            self.axes.up,
            self.axes.forward,
            self.winding.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_human_string() {
        assert_eq!(
            CoordinateSystem::default().to_string(),
            "+x +y -z counter-clockwise"
        );
    }

    #[test]
    fn test_pack_unpack() {
        let system = CoordinateSystem {
            axes: AxisSystem::new(Axis::NegativeX, Axis::PositiveZ, Axis::PositiveY).unwrap(),
            winding: WindingOrder::Clockwise,
        };
        let packed = system.pack();
        assert_eq!(packed, [3, 2, 1, 0]);
        assert_eq!(CoordinateSystem::unpack(packed).unwrap(), system);
    }

    #[test]
    fn test_rejects_parallel_axes() {
        assert!(AxisSystem::new(Axis::PositiveX, Axis::NegativeX, Axis::PositiveZ).is_err());
        assert!(matches!(
            CoordinateSystem::unpack([0, 1, 6, 0]),
            Err(Error::InvalidAxis(6))
        ));
        assert!(matches!(
            CoordinateSystem::unpack([0, 1, 2, 2]),
            Err(Error::InvalidWindingOrder(2))
        ));
    }
}
