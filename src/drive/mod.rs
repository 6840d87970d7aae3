//! Drive module for microscope-stage.
//!
//! One driving capability ([`StepDriver`]) with a hardware pulse
//! implementation and a timed simulation, plus the [`DriveEngine`] that turns
//! millimetre targets into step counts and owns the axis position state.

mod engine;
mod host;
mod pulse;
mod simulated;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::axis::Axis;
use crate::config::units::Steps;
use crate::error::{Error, Result};

pub use engine::DriveEngine;
pub use host::{
    open_pulse_driver, open_pulse_driver_at, select_driver, select_driver_at, StdDelay,
    SysfsError, SysfsPin, GPIO_ROOT,
};
pub use pulse::{AxisPins, PulseDriver, PROGRESS_LOG_INTERVAL};
pub use simulated::{SimulatedDriver, SIMULATION_CHUNK_STEPS};

/// Outcome of driving one axis.
///
/// On failure carries the signed steps that were actually emitted before the
/// fault, so the caller can record the travel that physically happened.
pub type DriveResult = core::result::Result<(), (Steps, Error)>;

/// Which implementation is moving the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveMode {
    /// Real step pulses on GPIO lines
    Hardware,
    /// Timed delay, no I/O
    Simulation,
}

/// Shared emergency-stop flag, polled by drivers between pulses.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that any in-flight drive stop at the next pulse boundary.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a previous trigger.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capability to move a single axis by a number of steps.
///
/// Implementations must leave the axis driver de-energized when `drive`
/// returns, whether it succeeded, faulted or was cancelled.
pub trait StepDriver {
    /// Which implementation this is.
    fn mode(&self) -> DriveMode;

    /// Emit `steps` pulses on `axis`; the sign selects direction.
    ///
    /// Checks `cancel` before every pulse and stops with [`Error::Aborted`]
    /// once it is triggered.
    fn drive(&mut self, axis: Axis, steps: Steps, cancel: &CancelToken) -> DriveResult;

    /// De-energize one axis driver.
    fn disable(&mut self, axis: Axis) -> Result<()>;

    /// De-energize every axis driver.
    ///
    /// Attempts all axes even if one fails and reports the first failure.
    fn disable_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for axis in Axis::ALL {
            if let Err(e) = self.disable(axis) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<T: StepDriver + ?Sized> StepDriver for Box<T> {
    fn mode(&self) -> DriveMode {
        (**self).mode()
    }

    fn drive(&mut self, axis: Axis, steps: Steps, cancel: &CancelToken) -> DriveResult {
        (**self).drive(axis, steps, cancel)
    }

    fn disable(&mut self, axis: Axis) -> Result<()> {
        (**self).disable(axis)
    }

    fn disable_all(&mut self) -> Result<()> {
        (**self).disable_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let observer = token.clone();

        assert!(!observer.is_triggered());
        token.trigger();
        assert!(observer.is_triggered());
        observer.reset();
        assert!(!token.is_triggered());
    }
}
