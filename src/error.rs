//! Error types for microscope-stage.
//!
//! Provides unified error handling across configuration, sample lookup,
//! sequencing and stepper driving.

use thiserror::Error;

use crate::axis::Axis;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stage operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Field type is neither `lpf` nor `hpf`.
    #[error("Invalid mode: '{0}'. Must be \"lpf\" or \"hpf\"")]
    InvalidMode(String),

    /// Sample identifier is not in the position table.
    #[error("Sample position {0} not found")]
    NotFound(String),

    /// `advance` was requested before any sample was positioned.
    #[error("No current sample. Start a collection first")]
    NoCurrentSample,

    /// Pin I/O failed while driving an axis.
    ///
    /// The driver was de-energized unless `reason` reports that the enable
    /// release failed too.
    #[error("Hardware fault on {axis} axis: {reason}")]
    HardwareFault {
        /// Axis being driven when the fault occurred
        axis: Axis,
        /// Description of the underlying I/O failure
        reason: String,
    },

    /// An emergency stop interrupted travel on this axis.
    #[error("Motion on {axis} axis aborted by emergency stop")]
    Aborted {
        /// Axis that was moving when the stop arrived
        axis: Axis,
    },

    /// Configuration parsing or validation error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    #[error("Parse error: {0}")]
    ParseError(String),
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(String),
    /// Steps per millimetre must be positive and finite
    #[error("Invalid steps_per_mm for {axis} axis: {value}. Must be > 0")]
    InvalidStepsPerMm {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f64,
    },
    /// Homing travel must be positive and finite
    #[error("Invalid home_travel_mm for {axis} axis: {value}. Must be > 0")]
    InvalidHomeTravel {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f64,
    },
    /// Pulse half-period must be non-zero
    #[error("Invalid pulse_delay_us: must be > 0")]
    InvalidPulseDelay,
    /// The same GPIO line is assigned twice
    #[error("GPIO pin {0} is assigned more than once")]
    DuplicatePin(u8),
    /// Sample table key is not `lpf` or `{lpf|hpf}_{1..10}`
    #[error("Unknown sample name: '{0}'")]
    UnknownSample(String),
    /// Sample table entry has a NaN or infinite coordinate
    #[error("Sample '{0}' has a non-finite coordinate")]
    InvalidCoordinate(String),
    /// A numbered sample slot has no entry
    #[error("Sample table is missing '{0}'")]
    MissingSample(String),
}

impl Error {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidMode(_) => "invalid_mode",
            Error::NotFound(_) => "not_found",
            Error::NoCurrentSample => "no_current_sample",
            Error::HardwareFault { .. } => "hardware_fault",
            Error::Aborted { .. } => "aborted",
            Error::Config(_) => "config",
        }
    }

    /// Whether the request was rejected before any motion was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidMode(_) | Error::NotFound(_) | Error::NoCurrentSample)
    }
}
