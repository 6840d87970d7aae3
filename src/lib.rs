//! # microscope-stage
//!
//! Stage positioning and sample sequencing for a three-axis stepper
//! microscope stage with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Configuration-driven**: Axis calibration, GPIO pins and the sample
//!   position table come from a TOML file
//! - **embedded-hal 1.0**: Uses `OutputPin` for STEP/DIR/ENABLE, `DelayNs` for timing
//! - **Hardware or simulation**: Pulse trains on real pins, or timed
//!   simulation with identical bookkeeping
//! - **Position tracking**: Every emitted step is recorded, including those
//!   of a move cut short by a fault or an emergency stop
//! - **Sample sequencing**: `lpf_1 .. lpf_10` then `hpf_1 .. hpf_10`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use microscope_stage::{select_driver, StageConfig, StageController};
//!
//! let config: StageConfig = microscope_stage::load_config("stage.toml")?;
//! let driver = select_driver(&config, false);
//! let controller = StageController::from_config(driver, &config)?;
//!
//! controller.start_collection()?;
//! controller.advance()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

// Core modules
pub mod axis;
pub mod config;
pub mod control;
pub mod drive;
pub mod error;
pub mod sample;
pub mod sequence;

// Re-exports for ergonomic API
pub use axis::{Axis, AxisSnapshot, AxisStateStore};
pub use config::{load_config, parse_config, validate_config, StageConfig, StagePosition};
pub use control::{Failure, Request, Response, StageController};
pub use drive::{
    select_driver, CancelToken, DriveEngine, DriveMode, PulseDriver, SimulatedDriver, StepDriver,
};
pub use error::{ConfigError, Error, Result};
pub use sample::{FieldType, SampleId, SampleRegistry};
pub use sequence::{Advance, FocusDirection, Phase, Sequencer};

// Unit types
pub use config::units::{Millimeters, Steps};
