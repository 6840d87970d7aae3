//! Configuration validation.

use crate::axis::Axis;
use crate::error::{ConfigError, Result};
use crate::sample::SampleRegistry;

use super::StageConfig;

/// Validate a stage configuration.
///
/// Checks:
/// - Axis calibration and homing travel are positive
/// - Pulse timing is non-zero
/// - No GPIO line is wired to two inputs
/// - The sample table holds exactly `lpf_1..lpf_10` and `hpf_1..hpf_10`
///   (plus the optional `lpf` home alias) with finite coordinates
pub fn validate_config(config: &StageConfig) -> Result<()> {
    if config.pulse_delay_us == 0 {
        return Err(ConfigError::InvalidPulseDelay.into());
    }

    for axis in Axis::ALL {
        validate_axis(axis, config)?;
    }

    validate_pins(config)?;

    SampleRegistry::from_table(&config.samples)?;

    Ok(())
}

fn validate_axis(axis: Axis, config: &StageConfig) -> Result<()> {
    let axis_config = config.axes.get(axis);

    // Steps per mm must be positive
    let steps_per_mm = axis_config.steps_per_mm;
    if !steps_per_mm.is_finite() || steps_per_mm <= 0.0 {
        return Err(ConfigError::InvalidStepsPerMm {
            axis,
            value: steps_per_mm,
        }
        .into());
    }

    // Homing must travel somewhere
    let travel = axis_config.home_travel_mm;
    if !travel.is_finite() || travel <= 0.0 {
        return Err(ConfigError::InvalidHomeTravel {
            axis,
            value: travel,
        }
        .into());
    }

    Ok(())
}

fn validate_pins(config: &StageConfig) -> Result<()> {
    let mut seen: heapless::Vec<u8, 9> = heapless::Vec::new();

    for axis in Axis::ALL {
        for line in config.axes.get(axis).pins.lines() {
            if seen.contains(&line) {
                return Err(ConfigError::DuplicatePin(line).into());
            }
            let _ = seen.push(line);
        }
    }

    Ok(())
}
