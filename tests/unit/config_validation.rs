//! Unit tests for configuration validation.

use microscope_stage::config::{validate_config, StageConfig, StagePosition};
use microscope_stage::error::{ConfigError, Error};
use microscope_stage::Axis;

fn key(name: &str) -> heapless::String<8> {
    heapless::String::try_from(name).unwrap()
}

/// Test validation of the built-in configuration.
#[test]
fn test_default_config_passes_validation() {
    assert!(validate_config(&StageConfig::default()).is_ok());
}

/// Test validation fails for negative homing travel.
#[test]
fn test_negative_home_travel() {
    let mut config = StageConfig::default();
    config.axes.x.home_travel_mm = -5.0;

    let result = validate_config(&config);
    assert_eq!(
        result,
        Err(Error::Config(ConfigError::InvalidHomeTravel {
            axis: Axis::X,
            value: -5.0
        }))
    );
}

/// Test validation fails for non-finite calibration.
#[test]
fn test_nan_steps_per_mm() {
    let mut config = StageConfig::default();
    config.axes.z.steps_per_mm = f64::NAN;

    let result = validate_config(&config);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidStepsPerMm { axis: Axis::Z, .. }))
    ));
}

/// Test validation fails when two axes share a line.
#[test]
fn test_shared_direction_pin() {
    let mut config = StageConfig::default();
    config.axes.y.pins.direction = 8;

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::DuplicatePin(8)))
    );
}

/// Test validation fails for names outside the slot grid.
#[test]
fn test_unknown_sample_name() {
    let mut config = StageConfig::default();
    config
        .samples
        .insert(key("lpf_11"), StagePosition::new(1.0, 1.0, 0.0))
        .unwrap();

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::UnknownSample("lpf_11".into())))
    );
}

/// Test validation fails for infinite coordinates.
#[test]
fn test_infinite_coordinate() {
    let mut config = StageConfig::default();
    config
        .samples
        .insert(key("hpf_3"), StagePosition::new(f64::INFINITY, 1.0, 0.0))
        .unwrap();

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidCoordinate("hpf_3".into())))
    );
}

/// Test validation fails for a missing slot.
#[test]
fn test_missing_slot() {
    let mut config = StageConfig::default();
    config.samples.remove(&key("hpf_9"));

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::MissingSample("hpf_9".into())))
    );
}
