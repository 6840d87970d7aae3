//! Sample sequencing state machine.

use serde::Deserialize;
use tracing::{info, warn};

use crate::axis::{Axis, AxisSnapshot};
use crate::config::units::Millimeters;
use crate::config::{StageConfig, StagePosition};
use crate::drive::{CancelToken, DriveEngine, DriveMode, StepDriver};
use crate::error::{Error, Result};
use crate::sample::{SampleId, SampleRegistry};

use super::state::{Phase, SequencerState};

/// Result of [`Sequencer::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the next slot, ready for capture.
    Positioned(SampleId),
    /// No slot after this one; the stage did not move.
    Complete(SampleId),
}

/// Result of [`Sequencer::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Synced {
    /// Slot the stage is now on.
    pub sample: SampleId,
    /// False when the stage was already there.
    pub moved: bool,
}

/// Result of [`Sequencer::configure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Configured {
    /// Slot the stage is now on.
    pub sample: SampleId,
    /// Requested Z offset in mm.
    pub focus_delta_mm: f64,
    /// Requested X offset in mm.
    pub brightness_delta_mm: f64,
    /// Target of the primary move.
    pub target: StagePosition,
}

/// Direction of a manual focus nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusDirection {
    /// Positive Z
    Up,
    /// Negative Z
    Down,
}

/// Stage position and sample sequencing controller.
///
/// Owns the drive engine and the sequencing state. Not synchronized; wrap it
/// in [`crate::control::StageController`] to share between threads.
pub struct Sequencer<D: StepDriver> {
    engine: DriveEngine<D>,
    registry: SampleRegistry,
    state: SequencerState,
    repeat_fine_tune: bool,
}

impl<D: StepDriver> Sequencer<D> {
    /// Create a sequencer over an engine and registry.
    pub fn new(engine: DriveEngine<D>, registry: SampleRegistry, repeat_fine_tune: bool) -> Self {
        Self {
            engine,
            registry,
            state: SequencerState::default(),
            repeat_fine_tune,
        }
    }

    /// Build engine and registry from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample table is incomplete.
    pub fn from_config(driver: D, config: &StageConfig, cancel: CancelToken) -> Result<Self> {
        let registry = SampleRegistry::from_config(config)?;
        let engine = DriveEngine::with_cancel_token(driver, &config.axes, cancel);
        Ok(Self::new(engine, registry, config.repeat_fine_tune))
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Slot the stage was last positioned on.
    pub fn current_sample(&self) -> Option<SampleId> {
        self.state.current_sample
    }

    /// Sequencing state.
    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    /// Current stage position.
    pub fn snapshot(&self) -> AxisSnapshot {
        self.engine.snapshot()
    }

    /// Hardware or simulation.
    pub fn mode(&self) -> DriveMode {
        self.engine.mode()
    }

    /// The drive engine.
    pub fn engine(&self) -> &DriveEngine<D> {
        &self.engine
    }

    /// The sample registry.
    pub fn registry(&self) -> &SampleRegistry {
        &self.registry
    }

    /// Home all axes and clear the current sample.
    pub fn home(&mut self) -> Result<()> {
        self.state.clear();
        self.engine.home()?;
        self.state.initialized = true;
        Ok(())
    }

    /// Absolute move; axes left as `None` stay where they are.
    ///
    /// Does not change the current sample.
    pub fn move_to(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Result<()> {
        let current = self.engine.snapshot();
        self.engine.move_to(StagePosition::new(
            x.unwrap_or(current.x),
            y.unwrap_or(current.y),
            z.unwrap_or(current.z),
        ))
    }

    /// Relative move; axes left as `None` do not move.
    pub fn move_by(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Result<()> {
        self.engine.move_by(StagePosition::new(
            x.unwrap_or(0.0),
            y.unwrap_or(0.0),
            z.unwrap_or(0.0),
        ))
    }

    /// Nudge focus by `amount_mm` along Z.
    pub fn focus_adjust(&mut self, direction: FocusDirection, amount_mm: f64) -> Result<()> {
        let delta = match direction {
            FocusDirection::Up => amount_mm,
            FocusDirection::Down => -amount_mm,
        };
        info!(?direction, amount_mm, "Adjusting focus");
        self.move_by(None, None, Some(delta))
    }

    /// Home, then position on the first LPF slot.
    pub fn start_collection(&mut self) -> Result<SampleId> {
        info!("Starting sample collection");
        self.home()?;

        let first = SampleId::FIRST;
        self.engine.move_to(self.registry.get(first))?;
        self.state.position_at(first);

        info!(sample = %first, "Sample positioned");
        Ok(first)
    }

    /// Move to the next slot in acquisition order.
    ///
    /// After `hpf_10` reports [`Advance::Complete`] without moving; the
    /// current sample is left as it was.
    pub fn advance(&mut self) -> Result<Advance> {
        let current = self.state.current_sample.ok_or_else(|| {
            warn!("No current sample; collection has not been started");
            Error::NoCurrentSample
        })?;

        let Some(next) = current.next() else {
            info!(sample = %current, "All samples completed");
            self.state.complete = true;
            return Ok(Advance::Complete(current));
        };

        info!(from = %current, to = %next, "Moving to next sample");
        self.engine.move_to(self.registry.get(next))?;
        self.state.position_at(next);
        Ok(Advance::Positioned(next))
    }

    /// Position on `{mode}_{sample_number}` unless already there.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMode`] or [`Error::NotFound`] before any motion.
    pub fn sync(&mut self, mode: &str, sample_number: u32) -> Result<Synced> {
        let (sample, position) = self.registry.resolve(mode, sample_number)?;

        if self.state.current_sample == Some(sample) {
            info!(%sample, "Already at target sample");
            return Ok(Synced {
                sample,
                moved: false,
            });
        }

        info!(%sample, "Moving to target sample");
        self.engine.move_to(position)?;
        self.state.position_at(sample);
        Ok(Synced {
            sample,
            moved: true,
        })
    }

    /// Position on a slot with focus (Z) and brightness (X) offsets.
    ///
    /// The primary move targets the slot plus both offsets. With
    /// `repeat_fine_tune` each non-zero offset is then driven once more on
    /// its own axis, so the stage ends up offset by twice the request.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMode`] or [`Error::NotFound`] before any motion.
    pub fn configure(
        &mut self,
        mode: &str,
        sample_number: u32,
        focus_delta_mm: f64,
        brightness_delta_mm: f64,
    ) -> Result<Configured> {
        let (sample, base) = self.registry.resolve(mode, sample_number)?;
        let target = StagePosition::new(
            base.x + brightness_delta_mm,
            base.y,
            base.z + focus_delta_mm,
        );

        info!(%sample, focus_delta_mm, brightness_delta_mm, "Configuring microscope");
        self.engine.move_to(target)?;

        if self.repeat_fine_tune {
            if focus_delta_mm != 0.0 {
                info!(focus_delta_mm, "Fine-tuning focus");
                self.fine_tune(Axis::Z, focus_delta_mm)?;
            }
            if brightness_delta_mm != 0.0 {
                info!(brightness_delta_mm, "Applying brightness positioning");
                self.fine_tune(Axis::X, brightness_delta_mm)?;
            }
        }

        self.state.position_at(sample);
        Ok(Configured {
            sample,
            focus_delta_mm,
            brightness_delta_mm,
            target,
        })
    }

    fn fine_tune(&mut self, axis: Axis, delta_mm: f64) -> Result<()> {
        let steps = self.engine.steps_for(axis, Millimeters(delta_mm));
        self.engine.drive_axis(axis, steps)
    }

    /// Cut power to every axis driver.
    ///
    /// Position and current sample are left untouched.
    pub fn emergency_stop(&mut self) -> Result<()> {
        warn!("Emergency stop: disabling all motors");
        self.engine.disable_all()
    }

    /// De-energize every driver before the process exits.
    pub fn shutdown(&mut self) -> Result<()> {
        info!("Cleaning up motor drivers");
        self.engine.disable_all()
    }
}
