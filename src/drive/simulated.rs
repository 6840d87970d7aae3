//! Timed simulation used when stepper hardware is unavailable.

use embedded_hal::delay::DelayNs;
use tracing::{debug, info};

use crate::axis::Axis;
use crate::config::units::Steps;
use crate::config::StageConfig;
use crate::error::{Error, Result};

use super::{CancelToken, DriveMode, DriveResult, StepDriver};

/// Steps simulated per delay call; cancellation is checked between chunks.
pub const SIMULATION_CHUNK_STEPS: u64 = 100;

/// Driver that only waits, proportional to the requested step count.
///
/// Logical position is updated by the engine exactly as with real hardware.
#[derive(Debug)]
pub struct SimulatedDriver<D: DelayNs> {
    delay: D,
    step_time_us: u32,
}

impl<D: DelayNs> SimulatedDriver<D> {
    /// Create a simulation taking `step_time_us` per step.
    pub fn new(delay: D, step_time_us: u32) -> Self {
        Self {
            delay,
            step_time_us,
        }
    }

    /// Create a simulation with the configured step time.
    pub fn from_config(delay: D, config: &StageConfig) -> Self {
        Self::new(delay, config.simulated_step_us)
    }
}

impl<D: DelayNs> StepDriver for SimulatedDriver<D> {
    fn mode(&self) -> DriveMode {
        DriveMode::Simulation
    }

    fn drive(&mut self, axis: Axis, steps: Steps, cancel: &CancelToken) -> DriveResult {
        let total = steps.abs();
        info!(%axis, steps = steps.value(), "Simulating motor control");

        let mut done = 0;
        while done < total {
            if cancel.is_triggered() {
                return Err((Steps::with_sign_of(done, steps), Error::Aborted { axis }));
            }

            let chunk = SIMULATION_CHUNK_STEPS.min(total - done);
            self.delay
                .delay_us((chunk as u32).saturating_mul(self.step_time_us));
            done += chunk;
        }

        debug!(%axis, "Simulated movement completed");
        Ok(())
    }

    fn disable(&mut self, axis: Axis) -> Result<()> {
        debug!(%axis, "Simulated driver disabled");
        Ok(())
    }
}
