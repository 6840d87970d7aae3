//! Logical axis position tracking.

use super::{Axis, AxisSnapshot};

/// Single source of truth for the stage position.
///
/// Positions are the sum of every delta applied since the last reset. Only
/// the drive engine writes here; everything else reads a [`AxisSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct AxisStateStore {
    /// Position per axis in mm, indexed by [`Axis::index`]
    position_mm: [f64; 3],
    /// Set once a homing run has zeroed the axes
    homed: bool,
}

impl AxisStateStore {
    /// Create a store at the origin, not yet homed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position of every axis.
    #[inline]
    pub fn read(&self) -> AxisSnapshot {
        AxisSnapshot {
            x: self.position_mm[0],
            y: self.position_mm[1],
            z: self.position_mm[2],
        }
    }

    /// Current position of one axis.
    #[inline]
    pub fn position(&self, axis: Axis) -> f64 {
        self.position_mm[axis.index()]
    }

    /// Whether the axes have been homed since startup.
    #[inline]
    pub fn is_homed(&self) -> bool {
        self.homed
    }

    /// Add a travelled distance to one axis.
    #[inline]
    pub(crate) fn apply(&mut self, axis: Axis, delta_mm: f64) {
        self.position_mm[axis.index()] += delta_mm;
    }

    /// Zero every axis and mark the stage as homed.
    pub(crate) fn reset(&mut self) {
        self.position_mm = [0.0; 3];
        self.homed = true;
    }
}
