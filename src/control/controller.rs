//! Thread-safe stage controller.

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::StageConfig;
use crate::drive::{CancelToken, StepDriver};
use crate::error::{Error, Result};
use crate::sample::{SampleId, SAMPLES_PER_FIELD};
use crate::sequence::{Advance, FocusDirection, Sequencer};

use super::protocol::{
    AdvanceOutcome, CompletionReport, ConfigurationReport, ConfigurationSummary, Failure,
    PositionReport, Report, Request, Response, SampleReport, StatusReport,
};

/// Single-writer controller shared by every caller.
///
/// Each operation holds one lock for its whole duration, so pulse trains of
/// two requests never interleave. [`StageController::emergency_stop`] raises
/// the cancel flag before waiting for the lock, which aborts the move that
/// currently holds it at the next pulse boundary.
pub struct StageController<D: StepDriver> {
    sequencer: Mutex<Sequencer<D>>,
    cancel: CancelToken,
}

impl<D: StepDriver> StageController<D> {
    /// Wrap a sequencer.
    pub fn new(sequencer: Sequencer<D>) -> Self {
        let cancel = sequencer.engine().cancel_token();
        Self {
            sequencer: Mutex::new(sequencer),
            cancel,
        }
    }

    /// Build the whole stack from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample table is incomplete.
    pub fn from_config(driver: D, config: &StageConfig) -> Result<Self> {
        let sequencer = Sequencer::from_config(driver, config, CancelToken::new())?;
        Ok(Self::new(sequencer))
    }

    /// Read-only access to the sequencer, waiting for any in-flight operation.
    pub fn with_sequencer<R>(&self, f: impl FnOnce(&Sequencer<D>) -> R) -> R {
        f(&self.sequencer.lock())
    }

    /// Position, current sample and phase.
    pub fn get_status(&self) -> StatusReport {
        let sequencer = self.sequencer.lock();
        StatusReport {
            position: sequencer.snapshot(),
            current_sample: sequencer.current_sample(),
            phase: sequencer.phase(),
            drive_mode: sequencer.mode(),
            timestamp: Utc::now(),
        }
    }

    /// Home all axes.
    pub fn home(&self) -> core::result::Result<PositionReport, Failure> {
        self.exclusive("home", |seq| {
            seq.home()?;
            Ok(PositionReport {
                message: "Motors homed successfully".to_string(),
                position: seq.snapshot(),
            })
        })
    }

    /// Absolute move; `None` keeps the current coordinate.
    pub fn move_to(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    ) -> core::result::Result<PositionReport, Failure> {
        self.exclusive("move_to", |seq| {
            seq.move_to(x, y, z)?;
            Ok(PositionReport {
                message: "Moved to position".to_string(),
                position: seq.snapshot(),
            })
        })
    }

    /// Relative move; `None` leaves the axis alone.
    pub fn move_by(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    ) -> core::result::Result<PositionReport, Failure> {
        self.exclusive("move_by", |seq| {
            seq.move_by(x, y, z)?;
            Ok(PositionReport {
                message: "Moved by offset".to_string(),
                position: seq.snapshot(),
            })
        })
    }

    /// Nudge focus.
    pub fn focus_adjust(
        &self,
        direction: FocusDirection,
        amount_mm: f64,
    ) -> core::result::Result<PositionReport, Failure> {
        self.exclusive("focus_adjust", |seq| {
            seq.focus_adjust(direction, amount_mm)?;
            Ok(PositionReport {
                message: "Focus adjusted".to_string(),
                position: seq.snapshot(),
            })
        })
    }

    /// Home and position on the first LPF slot.
    pub fn start_collection(&self) -> core::result::Result<SampleReport, Failure> {
        self.exclusive("start_collection", |seq| {
            let sample = seq.start_collection()?;
            Ok(SampleReport::new(
                ready_message(sample),
                sample,
                seq.snapshot(),
            ))
        })
    }

    /// Move to the next slot, or report completion.
    pub fn advance(&self) -> core::result::Result<AdvanceOutcome, Failure> {
        self.exclusive("advance", |seq| {
            Ok(match seq.advance()? {
                Advance::Positioned(sample) => AdvanceOutcome::Positioned(SampleReport::new(
                    ready_message(sample),
                    sample,
                    seq.snapshot(),
                )),
                Advance::Complete(sample) => AdvanceOutcome::Complete(CompletionReport {
                    message: "All samples completed".to_string(),
                    sample,
                    position: seq.snapshot(),
                    ready_for_capture: false,
                }),
            })
        })
    }

    /// Position on `{mode}_{sample_number}` unless already there.
    pub fn sync(
        &self,
        mode: &str,
        sample_number: u32,
    ) -> core::result::Result<SampleReport, Failure> {
        self.exclusive("sync", |seq| {
            let synced = seq.sync(mode, sample_number)?;
            let sample = synced.sample;
            let message = if synced.moved {
                format!(
                    "{} sample {}/{} positioned",
                    sample.field().label(),
                    sample.index(),
                    SAMPLES_PER_FIELD
                )
            } else {
                format!("Already positioned at {}", sample)
            };
            Ok(SampleReport::new(message, sample, seq.snapshot()))
        })
    }

    /// Position on a slot with focus and brightness offsets.
    pub fn configure(
        &self,
        mode: &str,
        sample_number: u32,
        focus_adjustment: f64,
        brightness_position: f64,
    ) -> core::result::Result<ConfigurationReport, Failure> {
        self.exclusive("configure", |seq| {
            let configured =
                seq.configure(mode, sample_number, focus_adjustment, brightness_position)?;
            let sample = configured.sample;
            Ok(ConfigurationReport {
                message: format!(
                    "Microscope configured for {} sample {}",
                    sample.field().label(),
                    sample.index()
                ),
                configuration: ConfigurationSummary {
                    mode: sample.field(),
                    sample_number: sample.index(),
                    sample_name: sample,
                    focus_adjustment: configured.focus_delta_mm,
                    brightness_position: configured.brightness_delta_mm,
                },
                position: seq.snapshot(),
                ready_for_capture: true,
            })
        })
    }

    /// Abort any move in flight and cut power to every axis.
    pub fn emergency_stop(&self) -> core::result::Result<PositionReport, Failure> {
        warn!("EMERGENCY STOP requested");
        self.cancel.trigger();

        let result = self.exclusive("emergency_stop", |seq| {
            seq.emergency_stop()?;
            Ok(PositionReport {
                message: "Emergency stop executed".to_string(),
                position: seq.snapshot(),
            })
        });

        self.cancel.reset();
        result
    }

    /// De-energize every driver.
    pub fn shutdown(&self) -> core::result::Result<PositionReport, Failure> {
        self.exclusive("shutdown", |seq| {
            seq.shutdown()?;
            Ok(PositionReport {
                message: "Motor drivers disabled".to_string(),
                position: seq.snapshot(),
            })
        })
    }

    /// Dispatch a decoded request.
    pub fn handle(&self, request: Request) -> Response {
        let result = match request {
            Request::GetStatus => Ok(Report::Status(self.get_status())),
            Request::Home => self.home().map(Report::Position),
            Request::MoveTo { x, y, z } => self.move_to(x, y, z).map(Report::Position),
            Request::MoveBy { x, y, z } => self.move_by(x, y, z).map(Report::Position),
            Request::FocusAdjust {
                direction,
                amount_mm,
            } => self.focus_adjust(direction, amount_mm).map(Report::Position),
            Request::StartCollection => self.start_collection().map(Report::Sample),
            Request::Advance => {
                return match self.advance() {
                    Ok(outcome) => outcome.into(),
                    Err(failure) => Response::Error(failure),
                }
            }
            Request::Sync {
                mode,
                sample_number,
            } => self.sync(&mode, sample_number).map(Report::Sample),
            Request::Configure {
                mode,
                sample_number,
                focus_adjustment,
                brightness_position,
            } => self
                .configure(&mode, sample_number, focus_adjustment, brightness_position)
                .map(Report::Configuration),
            Request::EmergencyStop => self.emergency_stop().map(Report::Position),
            Request::Shutdown => self.shutdown().map(Report::Position),
        };

        match result {
            Ok(report) => Response::Success(report),
            Err(failure) => Response::Error(failure),
        }
    }

    /// Run one operation under the controller lock.
    ///
    /// Failures carry the position read after the error, so partial motion
    /// is visible to the caller.
    fn exclusive<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Sequencer<D>) -> core::result::Result<T, Error>,
    ) -> core::result::Result<T, Failure> {
        let mut sequencer = self.sequencer.lock();
        info!(operation, "Request received");

        f(&mut sequencer).map_err(|e| {
            let position = sequencer.snapshot();
            if e.is_validation() {
                warn!(operation, error = %e, "Request rejected");
            } else {
                error!(operation, error = %e, %position, "Operation failed");
            }
            Failure::new(e, position)
        })
    }
}

fn ready_message(sample: SampleId) -> String {
    format!(
        "{} sample {}/{} ready for capture",
        sample.field().label(),
        sample.index(),
        SAMPLES_PER_FIELD
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::SimulatedDriver;
    use crate::sequence::Phase;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    fn controller() -> StageController<SimulatedDriver<NoopDelay>> {
        StageController::from_config(
            SimulatedDriver::new(NoopDelay::new(), 0),
            &StageConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_status_before_anything() {
        let status = controller().get_status();
        assert_eq!(status.phase, Phase::Uninitialized);
        assert_eq!(status.current_sample, None);
    }

    #[test]
    fn test_advance_without_collection_is_structured_error() {
        let controller = controller();
        let failure = controller.advance().unwrap_err();

        assert_eq!(failure.kind, "no_current_sample");
        assert_eq!(failure.error, Some(Error::NoCurrentSample));
        // Controller stays usable
        assert!(controller.start_collection().is_ok());
    }

    #[test]
    fn test_emergency_stop_resets_cancel_flag() {
        let controller = controller();
        controller.emergency_stop().unwrap();

        // Motion works again after the stop completes
        let report = controller.move_to(Some(1.0), None, None).unwrap();
        assert!((report.position.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_handle_advance_complete() {
        let controller = controller();
        controller.sync("hpf", 10).unwrap();

        let response = controller.handle(Request::Advance);
        assert!(matches!(response, Response::Complete(ref report) if !report.ready_for_capture));
    }
}
