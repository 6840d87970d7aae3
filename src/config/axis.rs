//! Per-axis drive configuration from TOML.

use serde::Deserialize;

use crate::axis::Axis;

/// GPIO lines (BCM numbering) wired to one stepper driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PinAssignment {
    /// STEP input: one pulse per step.
    pub step: u8,
    /// DIR input: high drives away from home.
    pub direction: u8,
    /// ENABLE input, active low.
    pub enable: u8,
}

impl PinAssignment {
    /// All three lines, for duplicate checks and bulk setup.
    pub fn lines(&self) -> [u8; 3] {
        [self.step, self.direction, self.enable]
    }
}

/// Complete axis configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Calibration: step pulses per millimetre of travel.
    pub steps_per_mm: f64,

    /// Distance driven towards home before zeroing.
    ///
    /// Must exceed the physical travel of the axis; homing is open loop.
    /// Required in every `[axes.<a>]` section since the stock value differs
    /// per axis.
    pub home_travel_mm: f64,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Driver wiring.
    pub pins: PinAssignment,
}

impl AxisConfig {
    /// Stock X axis: 100 steps/mm on GPIO 17/18/27.
    pub fn default_x() -> Self {
        Self {
            steps_per_mm: 100.0,
            home_travel_mm: 50.0,
            invert_direction: false,
            pins: PinAssignment {
                step: 17,
                direction: 18,
                enable: 27,
            },
        }
    }

    /// Stock Y axis: 100 steps/mm on GPIO 22/23/24.
    pub fn default_y() -> Self {
        Self {
            steps_per_mm: 100.0,
            home_travel_mm: 50.0,
            invert_direction: false,
            pins: PinAssignment {
                step: 22,
                direction: 23,
                enable: 24,
            },
        }
    }

    /// Stock Z (focus) axis: 200 steps/mm on GPIO 25/8/7.
    pub fn default_z() -> Self {
        Self {
            steps_per_mm: 200.0,
            home_travel_mm: 20.0,
            invert_direction: false,
            pins: PinAssignment {
                step: 25,
                direction: 8,
                enable: 7,
            },
        }
    }
}

/// Configuration for all three axes.
#[derive(Debug, Clone, Deserialize)]
pub struct AxesConfig {
    /// X axis.
    #[serde(default = "AxisConfig::default_x")]
    pub x: AxisConfig,
    /// Y axis.
    #[serde(default = "AxisConfig::default_y")]
    pub y: AxisConfig,
    /// Z axis.
    #[serde(default = "AxisConfig::default_z")]
    pub z: AxisConfig,
}

impl AxesConfig {
    /// Configuration of one axis.
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Steps per millimetre for every axis, indexed by [`Axis::index`].
    pub fn steps_per_mm(&self) -> [f64; 3] {
        [self.x.steps_per_mm, self.y.steps_per_mm, self.z.steps_per_mm]
    }
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            x: AxisConfig::default_x(),
            y: AxisConfig::default_y(),
            z: AxisConfig::default_z(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_calibration() {
        let axes = AxesConfig::default();
        assert_eq!(axes.steps_per_mm(), [100.0, 100.0, 200.0]);
        assert_eq!(axes.get(Axis::Z).pins.lines(), [25, 8, 7]);
        assert!((axes.get(Axis::Z).home_travel_mm - 20.0).abs() < f64::EPSILON);
    }
}
