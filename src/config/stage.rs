//! Stage configuration - root configuration structure.

use serde::Deserialize;

use super::axis::AxesConfig;
use super::samples::{default_sample_table, SampleTable};

/// Root configuration structure from TOML.
///
/// Every section is optional; an empty document describes the stock stage.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Step pulse half-period in microseconds (high time, then low time).
    #[serde(default = "default_pulse_delay_us")]
    pub pulse_delay_us: u32,

    /// Simulated travel time per step when no stepper hardware is present.
    #[serde(default = "default_simulated_step_us")]
    pub simulated_step_us: u32,

    /// Drive the focus/brightness offsets again after the primary move in
    /// `configure`, on top of the offset already in the target.
    #[serde(default = "default_repeat_fine_tune")]
    pub repeat_fine_tune: bool,

    /// Axis calibration and wiring.
    #[serde(default)]
    pub axes: AxesConfig,

    /// Named sample coordinates.
    #[serde(default = "default_sample_table")]
    pub samples: SampleTable,
}

fn default_pulse_delay_us() -> u32 {
    500
}

fn default_simulated_step_us() -> u32 {
    1000
}

fn default_repeat_fine_tune() -> bool {
    true
}

impl StageConfig {
    /// List all sample names in the table.
    pub fn sample_names(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(|s| s.as_str())
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            pulse_delay_us: default_pulse_delay_us(),
            simulated_step_us: default_simulated_step_us(),
            repeat_fine_tune: default_repeat_fine_tune(),
            axes: AxesConfig::default(),
            samples: default_sample_table(),
        }
    }
}
