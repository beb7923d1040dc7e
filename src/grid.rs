//! Grid vocabulary shared by the reader, the decomposition engine and the writer.

use crate::errors::{FlowError, Result};
use ndarray::{s, Array1, Array4};
use std::fmt;
use std::str::FromStr;

/// One scalar component sampled over time on a regular 3-D grid, indexed `(time, z, y, x)`.
pub type Field = Array4<f64>;

/// Axis along which a vector component is staggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaggerAxis {
    /// Offset along x (`u` on a PALM grid)
    X,
    /// Offset along y (`v`)
    Y,
    /// Offset along z (`w`)
    Z,
}

impl StaggerAxis {
    /// Axes in vector-component order.
    pub const ALL: [StaggerAxis; 3] = [StaggerAxis::X, StaggerAxis::Y, StaggerAxis::Z];

    /// Index of this axis in a `(time, z, y, x)` array.
    #[must_use]
    pub const fn array_axis(self) -> usize {
        match self {
            Self::X => 3,
            Self::Y => 2,
            Self::Z => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

impl fmt::Display for StaggerAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaggerAxis {
    type Err = FlowError;

    /// Accepts `x|y|z` as well as the index-style `i|j|k`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" | "i" => Ok(Self::X),
            "y" | "j" => Ok(Self::Y),
            "z" | "k" => Ok(Self::Z),
            _ => Err(FlowError::InvalidComponent {
                designator: s.to_string(),
            }),
        }
    }
}

/// Coordinate arrays accompanying a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub time: Array1<f64>,
    pub z: Array1<f64>,
    pub y: Array1<f64>,
    pub x: Array1<f64>,
}

impl Coordinates {
    /// Extents in `(time, z, y, x)` order.
    #[must_use]
    pub fn shape(&self) -> [usize; 4] {
        [self.time.len(), self.z.len(), self.y.len(), self.x.len()]
    }

    /// Moves the coordinates to cell centres the same way
    /// [`interpolate_staggered`](crate::decomposition::interpolate_staggered)
    /// moves a component staggered along `axis`.
    ///
    /// The staggered axis becomes pairwise midpoints; the other two axes are
    /// trimmed with the same asymmetric policy as the field.
    pub fn cell_centered(&self, axis: StaggerAxis) -> Result<Self> {
        for (name, len) in [("z", self.z.len()), ("y", self.y.len()), ("x", self.x.len())] {
            if len < 2 {
                return Err(FlowError::InvalidShape {
                    message: format!("coordinate '{name}' has {len} points, need at least 2"),
                });
            }
        }

        let midpoints = |c: &Array1<f64>| (&c.slice(s![..-1]) + &c.slice(s![1..])) * 0.5;
        let drop_first = |c: &Array1<f64>| c.slice(s![1..]).to_owned();
        let drop_last = |c: &Array1<f64>| c.slice(s![..-1]).to_owned();

        let (z, y, x) = match axis {
            StaggerAxis::X => (drop_first(&self.z), drop_last(&self.y), midpoints(&self.x)),
            StaggerAxis::Y => (drop_first(&self.z), midpoints(&self.y), drop_last(&self.x)),
            StaggerAxis::Z => (midpoints(&self.z), drop_last(&self.y), drop_last(&self.x)),
        };

        Ok(Self {
            time: self.time.clone(),
            z,
            y,
            x,
        })
    }
}
