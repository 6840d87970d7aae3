//! Configuration module for microscope-stage.
//!
//! Provides types for loading and validating axis calibration, pin wiring and
//! the sample position table from TOML files or pre-parsed data.

mod axis;
mod loader;
mod samples;
mod stage;
pub mod units;
mod validation;

pub use axis::{AxesConfig, AxisConfig, PinAssignment};
pub use loader::{load_config, parse_config};
pub use samples::{default_sample_table, SampleTable, StagePosition, MAX_SAMPLE_ENTRIES};
pub use stage::StageConfig;
pub use validation::validate_config;

// Re-export unit types at config level
pub use units::{Millimeters, Steps};
