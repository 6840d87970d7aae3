//! Unit tests for TOML configuration parsing.

use std::io::Write;

use microscope_stage::config::{load_config, parse_config, StageConfig};
use microscope_stage::error::{ConfigError, Error};
use microscope_stage::{Axis, SampleRegistry, StagePosition};

/// Sample table with every slot on a diagonal, 1 mm apart.
fn diagonal_samples() -> String {
    let mut table = String::from("[samples]\nlpf = { x = 0.5, y = 0.5 }\n");
    for n in 1..=10 {
        table.push_str(&format!("lpf_{n} = {{ x = {n}.0, y = {n}.0 }}\n"));
        table.push_str(&format!("hpf_{n} = {{ x = {n}.0, y = {n}.0, z = 0.25 }}\n"));
    }
    table
}

/// Test parsing calibration and pin assignments for one axis.
#[test]
fn test_parse_axis_section() {
    let toml_str = r#"
pulse_delay_us = 250

[axes.z]
steps_per_mm = 400.0
home_travel_mm = 10.0
invert_direction = true
pins = { step = 5, direction = 6, enable = 13 }
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");
    let z = config.axes.get(Axis::Z);

    assert_eq!(config.pulse_delay_us, 250);
    assert_eq!(z.steps_per_mm, 400.0);
    assert_eq!(z.home_travel_mm, 10.0);
    assert!(z.invert_direction);
    assert_eq!(z.pins.lines(), [5, 6, 13]);

    // Sections left out keep their defaults
    assert_eq!(config.axes.x.steps_per_mm, 100.0);
    assert_eq!(config.axes.y.pins.lines(), [22, 23, 24]);
}

/// Test that omitted top-level fields fall back to defaults.
#[test]
fn test_defaults() {
    let config = parse_config("repeat_fine_tune = false").unwrap();

    assert!(!config.repeat_fine_tune);
    assert_eq!(config.simulated_step_us, 1000);
    assert_eq!(config.axes.steps_per_mm(), [100.0, 100.0, 200.0]);
    assert_eq!(config.sample_names().count(), 21);
}

/// Test that an axis section must name its calibration and pins.
#[test]
fn test_axis_section_requires_pins() {
    let toml_str = r#"
[axes.x]
steps_per_mm = 80.0
home_travel_mm = 40.0
"#;

    let result = parse_config(toml_str);
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Test that homing travel has no per-field fallback inside a section.
#[test]
fn test_axis_section_requires_home_travel() {
    let toml_str = r#"
[axes.z]
steps_per_mm = 200.0
pins = { step = 25, direction = 8, enable = 7 }
"#;

    let result = parse_config(toml_str);
    match result {
        Err(Error::Config(ConfigError::ParseError(message))) => {
            assert!(message.contains("home_travel_mm"), "{message}")
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

/// Test parsing a complete sample table.
#[test]
fn test_parse_sample_table() {
    let config = parse_config(&diagonal_samples()).unwrap();
    let registry = SampleRegistry::from_config(&config).unwrap();

    assert_eq!(registry.home(), StagePosition::new(0.5, 0.5, 0.0));
    assert_eq!(registry.lookup("lpf_7"), Some(StagePosition::new(7.0, 7.0, 0.0)));
    assert_eq!(registry.lookup("hpf_10"), Some(StagePosition::new(10.0, 10.0, 0.25)));
    assert_eq!(registry.lookup("hpf_11"), None);
}

/// Test that a custom table replaces the built-in one entirely.
#[test]
fn test_partial_sample_table_rejected() {
    let toml_str = r#"
[samples]
lpf_1 = { x = 1.0, y = 1.0 }
"#;

    let result = parse_config(toml_str);
    assert_eq!(
        result.unwrap_err(),
        Error::Config(ConfigError::MissingSample("lpf_2".into()))
    );
}

/// Test malformed TOML is reported as a parse error.
#[test]
fn test_invalid_toml() {
    let result = parse_config("pulse_delay_us = \"fast\"");
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Test loading from disk.
#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!("stage-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "simulated_step_us = 10").unwrap();
    file.write_all(diagonal_samples().as_bytes()).unwrap();
    drop(file);

    let config: StageConfig = load_config(&path).unwrap();
    assert_eq!(config.simulated_step_us, 10);
    let _ = std::fs::remove_file(&path);

    let missing = load_config("/nonexistent/stage.toml");
    assert!(matches!(missing, Err(Error::Config(ConfigError::IoError(_)))));
}
