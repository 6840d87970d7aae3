//! Unit test harness for microscope-stage.
//!
//! This module organizes unit tests for each component of the library.

mod config_parsing;
mod config_validation;
mod pulse_driver;
