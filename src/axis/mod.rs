//! Axis module for microscope-stage.
//!
//! Names the three stage axes and owns their logical position state.

mod store;

use core::fmt;

use serde::{Deserialize, Serialize};

pub use store::AxisStateStore;

/// One of the three stage axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal travel (also used for brightness positioning)
    X,
    /// Vertical travel across the slide
    Y,
    /// Focus
    Z,
}

impl Axis {
    /// All axes in drive order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Lowercase axis name.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only projection of the stage position in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSnapshot {
    /// X position in mm
    pub x: f64,
    /// Y position in mm
    pub y: f64,
    /// Z position in mm
    pub z: f64,
}

impl AxisSnapshot {
    /// Position of a single axis.
    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl fmt::Display for AxisSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={:.3} y={:.3} z={:.3}", self.x, self.y, self.z)
    }
}
