//! Request and response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::axis::AxisSnapshot;
use crate::drive::DriveMode;
use crate::error::Error;
use crate::sample::{FieldType, SampleId, SAMPLES_PER_FIELD};
use crate::sequence::{FocusDirection, Phase};

/// A control request, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Report position, current sample and phase.
    GetStatus,
    /// Home all axes.
    Home,
    /// Absolute move; missing axes stay put.
    MoveTo {
        /// Target X in mm
        #[serde(default)]
        x: Option<f64>,
        /// Target Y in mm
        #[serde(default)]
        y: Option<f64>,
        /// Target Z in mm
        #[serde(default)]
        z: Option<f64>,
    },
    /// Relative move; missing axes do not move.
    MoveBy {
        /// X offset in mm
        #[serde(default)]
        x: Option<f64>,
        /// Y offset in mm
        #[serde(default)]
        y: Option<f64>,
        /// Z offset in mm
        #[serde(default)]
        z: Option<f64>,
    },
    /// Nudge focus up or down.
    FocusAdjust {
        /// Up or down
        direction: FocusDirection,
        /// Distance in mm
        amount_mm: f64,
    },
    /// Home and position on `lpf_1`.
    StartCollection,
    /// Move to the next slot.
    Advance,
    /// Position on a slot unless already there.
    Sync {
        /// `lpf` or `hpf`
        mode: String,
        /// Slot number, 1..=10
        sample_number: u32,
    },
    /// Position on a slot with focus and brightness offsets.
    Configure {
        /// `lpf` or `hpf`
        mode: String,
        /// Slot number, 1..=10
        sample_number: u32,
        /// Z offset in mm
        #[serde(default)]
        focus_adjustment: f64,
        /// X offset in mm
        #[serde(default)]
        brightness_position: f64,
    },
    /// Cut motor power, aborting any move in flight.
    EmergencyStop,
    /// De-energize drivers before exit.
    Shutdown,
}

/// Reply to any request, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// The operation succeeded.
    Success(Report),
    /// `advance` found no further slot.
    Complete(CompletionReport),
    /// The operation failed; see `kind`.
    Error(Failure),
}

/// Successful payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    /// `get_status`
    Status(StatusReport),
    /// `home`, `move_to`, `move_by`, `focus_adjust`, `emergency_stop`, `shutdown`
    Position(PositionReport),
    /// `start_collection`, `advance`, `sync`
    Sample(SampleReport),
    /// `configure`
    Configuration(ConfigurationReport),
}

/// Controller status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Current position.
    pub position: AxisSnapshot,
    /// Slot the stage was last positioned on.
    pub current_sample: Option<SampleId>,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Hardware or simulation.
    pub drive_mode: DriveMode,
    /// When this report was taken.
    pub timestamp: DateTime<Utc>,
}

/// Position after a plain motion command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    /// Operator message.
    pub message: String,
    /// Current position.
    pub position: AxisSnapshot,
}

/// Stage is on a slot and ready for capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleReport {
    /// Operator message.
    pub message: String,
    /// Slot name.
    pub sample: SampleId,
    /// Slot number within its field.
    pub sample_number: u8,
    /// Slots per field.
    pub total_samples: u8,
    /// LPF or HPF.
    pub field_type: FieldType,
    /// Current position.
    pub position: AxisSnapshot,
    /// Always true.
    pub ready_for_capture: bool,
}

impl SampleReport {
    pub(crate) fn new(message: String, sample: SampleId, position: AxisSnapshot) -> Self {
        Self {
            message,
            sample,
            sample_number: sample.index(),
            total_samples: SAMPLES_PER_FIELD,
            field_type: sample.field(),
            position,
            ready_for_capture: true,
        }
    }
}

/// The run is exhausted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    /// Operator message.
    pub message: String,
    /// Last slot, still current.
    pub sample: SampleId,
    /// Current position.
    pub position: AxisSnapshot,
    /// Always false.
    pub ready_for_capture: bool,
}

/// Echo of a `configure` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationSummary {
    /// LPF or HPF.
    pub mode: FieldType,
    /// Slot number within its field.
    pub sample_number: u8,
    /// Slot name.
    pub sample_name: SampleId,
    /// Z offset in mm.
    pub focus_adjustment: f64,
    /// X offset in mm.
    pub brightness_position: f64,
}

/// Stage is configured and ready for capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationReport {
    /// Operator message.
    pub message: String,
    /// What was applied.
    pub configuration: ConfigurationSummary,
    /// Current position.
    pub position: AxisSnapshot,
    /// Always true.
    pub ready_for_capture: bool,
}

/// A failed operation with the position reached before it stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Machine-readable error kind.
    pub kind: String,
    /// Human-readable description.
    pub message: String,
    /// Position after the failure; reflects any partial motion.
    pub position: AxisSnapshot,
    /// The typed error.
    #[serde(skip)]
    pub error: Option<Error>,
}

impl Failure {
    /// Wrap a stage error.
    pub fn new(error: Error, position: AxisSnapshot) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            position,
            error: Some(error),
        }
    }

    /// A request the transport could not decode.
    pub fn bad_request(message: impl Into<String>, position: AxisSnapshot) -> Self {
        Self {
            kind: "bad_request".to_string(),
            message: message.into(),
            position,
            error: None,
        }
    }
}

/// Outcome of `advance` at the control surface.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Moved to the next slot.
    Positioned(SampleReport),
    /// Nothing left to visit.
    Complete(CompletionReport),
}

impl From<AdvanceOutcome> for Response {
    fn from(outcome: AdvanceOutcome) -> Self {
        match outcome {
            AdvanceOutcome::Positioned(report) => Response::Success(Report::Sample(report)),
            AdvanceOutcome::Complete(report) => Response::Complete(report),
        }
    }
}
