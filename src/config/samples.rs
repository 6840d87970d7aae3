//! Sample position table from TOML.

use core::fmt::Write;

use heapless::{FnvIndexMap, String};
use serde::{Deserialize, Serialize};

use crate::axis::{Axis, AxisSnapshot};

/// Capacity of the sample table (20 numbered slots plus the home alias).
pub const MAX_SAMPLE_ENTRIES: usize = 32;

/// Named stage coordinates, keyed by sample name (`lpf`, `lpf_1` .. `hpf_10`).
pub type SampleTable = FnvIndexMap<String<8>, StagePosition, MAX_SAMPLE_ENTRIES>;

/// Absolute stage coordinates in millimetres from home.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StagePosition {
    /// X coordinate in mm
    pub x: f64,
    /// Y coordinate in mm
    pub y: f64,
    /// Z coordinate in mm
    #[serde(default)]
    pub z: f64,
}

impl StagePosition {
    /// Create a new position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate of a single axis.
    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Whether every coordinate is a real number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<AxisSnapshot> for StagePosition {
    fn from(snapshot: AxisSnapshot) -> Self {
        Self::new(snapshot.x, snapshot.y, snapshot.z)
    }
}

/// Stock slide layout: two rows of five per field type.
///
/// LPF slots sit on a 6 mm grid starting at (2, 2); HPF slots on a 2 mm grid
/// starting at (1, 1). All at focus height zero.
pub fn default_sample_table() -> SampleTable {
    let mut table = SampleTable::new();
    insert(&mut table, "lpf", StagePosition::new(0.0, 0.0, 0.0));

    for n in 1..=10u8 {
        let column = f64::from((n - 1) % 5);
        let row = f64::from((n - 1) / 5);

        let lpf = StagePosition::new(2.0 + 6.0 * column, 2.0 + 6.0 * row, 0.0);
        let hpf = StagePosition::new(1.0 + 2.0 * column, 1.0 + 2.0 * row, 0.0);

        let mut name: String<8> = String::new();
        let _ = write!(name, "lpf_{}", n);
        let _ = table.insert(name, lpf);

        let mut name: String<8> = String::new();
        let _ = write!(name, "hpf_{}", n);
        let _ = table.insert(name, hpf);
    }

    table
}

fn insert(table: &mut SampleTable, name: &str, position: StagePosition) {
    if let Ok(key) = String::try_from(name) {
        let _ = table.insert(key, position);
    }
}
