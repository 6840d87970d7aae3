//! Drive engine: millimetre targets to per-axis step moves.

use tracing::{info, warn};

use crate::axis::{Axis, AxisSnapshot, AxisStateStore};
use crate::config::units::{Millimeters, Steps};
use crate::config::{AxesConfig, StagePosition};
use crate::error::Result;

use super::{CancelToken, DriveMode, StepDriver};

/// Realizes absolute stage targets as motion and tracks the resulting position.
///
/// The engine is the only writer of the [`AxisStateStore`]. Each axis is
/// driven to completion before the next one starts.
pub struct DriveEngine<D: StepDriver> {
    driver: D,
    store: AxisStateStore,
    steps_per_mm: [f64; 3],
    home_travel_mm: [f64; 3],
    cancel: CancelToken,
}

impl<D: StepDriver> DriveEngine<D> {
    /// Create an engine at the origin with a fresh cancel token.
    pub fn new(driver: D, axes: &AxesConfig) -> Self {
        Self::with_cancel_token(driver, axes, CancelToken::new())
    }

    /// Create an engine that observes an existing cancel token.
    pub fn with_cancel_token(driver: D, axes: &AxesConfig, cancel: CancelToken) -> Self {
        Self {
            driver,
            store: AxisStateStore::new(),
            steps_per_mm: axes.steps_per_mm(),
            home_travel_mm: Axis::ALL.map(|axis| axes.get(axis).home_travel_mm),
            cancel,
        }
    }

    /// Current position of every axis.
    #[inline]
    pub fn snapshot(&self) -> AxisSnapshot {
        self.store.read()
    }

    /// Position state.
    #[inline]
    pub fn store(&self) -> &AxisStateStore {
        &self.store
    }

    /// Hardware or simulation.
    #[inline]
    pub fn mode(&self) -> DriveMode {
        self.driver.mode()
    }

    /// Token polled between pulses.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Calibration of one axis.
    #[inline]
    pub fn steps_per_mm(&self, axis: Axis) -> f64 {
        self.steps_per_mm[axis.index()]
    }

    /// Whole steps needed to travel `delta` on `axis`.
    #[inline]
    pub fn steps_for(&self, axis: Axis, delta: Millimeters) -> Steps {
        Steps::from_mm(delta, self.steps_per_mm(axis))
    }

    /// Move to an absolute position, one axis at a time in X, Y, Z order.
    ///
    /// Axes already within half a step of the target are not driven. If an
    /// axis fails, axes driven before it keep their new positions.
    pub fn move_to(&mut self, target: StagePosition) -> Result<()> {
        info!(
            x = target.x,
            y = target.y,
            z = target.z,
            current = %self.snapshot(),
            "Starting movement to position"
        );

        for axis in Axis::ALL {
            let delta = Millimeters(target.get(axis) - self.store.position(axis));
            let steps = self.steps_for(axis, delta);
            if steps.is_zero() {
                continue;
            }
            self.drive_axis(axis, steps)?;
        }

        info!(position = %self.snapshot(), "Movement completed");
        Ok(())
    }

    /// Move relative to the current position.
    pub fn move_by(&mut self, delta: StagePosition) -> Result<()> {
        let current = self.snapshot();
        self.move_to(StagePosition::new(
            current.x + delta.x,
            current.y + delta.y,
            current.z + delta.z,
        ))
    }

    /// Drive one axis by a step count and record the travel.
    ///
    /// Position advances by `steps / steps_per_mm`. On a fault only the
    /// pulses actually emitted are recorded before the error propagates.
    pub fn drive_axis(&mut self, axis: Axis, steps: Steps) -> Result<()> {
        if steps.is_zero() {
            return Ok(());
        }

        let spm = self.steps_per_mm(axis);
        match self.driver.drive(axis, steps, &self.cancel) {
            Ok(()) => {
                self.store.apply(axis, steps.to_mm(spm).value());
                Ok(())
            }
            Err((emitted, error)) => {
                self.store.apply(axis, emitted.to_mm(spm).value());
                warn!(
                    %axis,
                    requested = steps.value(),
                    emitted = emitted.value(),
                    position = %self.snapshot(),
                    "Axis move failed"
                );
                Err(error)
            }
        }
    }

    /// Open-loop homing: run every axis past its travel, then zero.
    ///
    /// There is no limit switch; the configured travel must exceed the
    /// physical range so the carriage is against its stop when zeroed.
    pub fn home(&mut self) -> Result<()> {
        info!("Starting motor homing sequence");

        for axis in Axis::ALL {
            let travel = Millimeters(self.home_travel_mm[axis.index()]);
            let steps = self.steps_for(axis, -travel);
            info!(%axis, steps = steps.value(), "Moving axis to home position");
            self.drive_axis(axis, steps)?;
        }

        self.store.reset();
        info!("Motors homed. Position reset to zero");
        Ok(())
    }

    /// De-energize every axis driver.
    pub fn disable_all(&mut self) -> Result<()> {
        self.driver.disable_all()
    }
}
