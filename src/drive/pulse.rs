//! Step/direction/enable pulse driver.
//!
//! Generic over embedded-hal 1.0 pin and delay types.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use tracing::{debug, error, info, warn};

use crate::axis::Axis;
use crate::config::units::Steps;
use crate::config::StageConfig;
use crate::error::{Error, Result};

use super::{CancelToken, DriveMode, DriveResult, StepDriver};

/// Pulses between progress log lines.
pub const PROGRESS_LOG_INTERVAL: u64 = 100;

/// The three driver inputs of one axis.
#[derive(Debug)]
pub struct AxisPins<P> {
    /// STEP pin (pulse to move one step).
    pub step: P,
    /// DIR pin (high = away from home, unless inverted).
    pub direction: P,
    /// ENABLE pin (low = energized).
    pub enable: P,
}

/// Hardware driver emitting real step pulses.
///
/// Generic over:
/// - `P`: pin type (must implement `OutputPin`)
/// - `D`: delay provider (must implement `DelayNs`)
pub struct PulseDriver<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Pins per axis, indexed by [`Axis::index`].
    pins: [AxisPins<P>; 3],

    /// Delay provider for step timing.
    delay: D,

    /// High time and low time of each pulse.
    half_period_us: u32,

    /// Whether direction pin logic is inverted, per axis.
    invert_direction: [bool; 3],
}

impl<P, D> PulseDriver<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Create a driver and de-energize every axis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HardwareFault`] if an enable line cannot be driven.
    pub fn new(pins: [AxisPins<P>; 3], delay: D, config: &StageConfig) -> Result<Self> {
        let mut driver = Self {
            pins,
            delay,
            half_period_us: config.pulse_delay_us,
            invert_direction: Axis::ALL.map(|axis| config.axes.get(axis).invert_direction),
        };

        for axis in Axis::ALL {
            driver.disable(axis)?;
            debug!(%axis, "Motor pins configured and disabled");
        }

        Ok(driver)
    }

    /// Step pulse half-period in microseconds.
    pub fn half_period_us(&self) -> u32 {
        self.half_period_us
    }

    /// Release the pins and delay provider.
    pub fn release(self) -> ([AxisPins<P>; 3], D) {
        (self.pins, self.delay)
    }
}

impl<P, D> StepDriver for PulseDriver<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    fn mode(&self) -> DriveMode {
        DriveMode::Hardware
    }

    fn drive(&mut self, axis: Axis, steps: Steps, cancel: &CancelToken) -> DriveResult {
        if steps.is_zero() {
            return Ok(());
        }

        let forward = steps.is_forward() != self.invert_direction[axis.index()];
        let pins = &mut self.pins[axis.index()];

        info!(%axis, steps = steps.value(), delay_us = self.half_period_us, "Driving axis");

        let result = pulse_train(
            axis,
            pins,
            &mut self.delay,
            forward,
            steps.abs(),
            self.half_period_us,
            cancel,
        );

        // Never leave the motor energized, even on error
        let released = pins.enable.set_high().map_err(|e| pin_fault(axis, "enable", e));

        match result {
            Ok(()) => released.map_err(|e| (steps, e)),
            Err((emitted, e)) => {
                warn!(%axis, emitted, error = %e, "Axis drive interrupted");
                let e = match released {
                    Ok(()) => e,
                    Err(release) => {
                        error!(%axis, error = %release, "Axis left energized after fault");
                        still_energized(axis, e, release)
                    }
                };
                Err((Steps::with_sign_of(emitted, steps), e))
            }
        }
    }

    fn disable(&mut self, axis: Axis) -> Result<()> {
        self.pins[axis.index()]
            .enable
            .set_high()
            .map_err(|e| pin_fault(axis, "enable", e))
    }
}

/// Energize, set direction, and emit `count` pulses.
///
/// On failure returns the number of rising edges already emitted.
fn pulse_train<P, D>(
    axis: Axis,
    pins: &mut AxisPins<P>,
    delay: &mut D,
    forward: bool,
    count: u64,
    half_period_us: u32,
    cancel: &CancelToken,
) -> core::result::Result<(), (u64, Error)>
where
    P: OutputPin,
    D: DelayNs,
{
    pins.enable
        .set_low()
        .map_err(|e| (0, pin_fault(axis, "enable", e)))?;

    let direction = if forward {
        pins.direction.set_high()
    } else {
        pins.direction.set_low()
    };
    direction.map_err(|e| (0, pin_fault(axis, "direction", e)))?;

    for emitted in 0..count {
        if cancel.is_triggered() {
            return Err((emitted, Error::Aborted { axis }));
        }

        pins.step
            .set_high()
            .map_err(|e| (emitted, pin_fault(axis, "step", e)))?;
        delay.delay_us(half_period_us);

        // The rising edge already moved the motor
        pins.step
            .set_low()
            .map_err(|e| (emitted + 1, pin_fault(axis, "step", e)))?;
        delay.delay_us(half_period_us);

        if (emitted + 1) % PROGRESS_LOG_INTERVAL == 0 {
            debug!(%axis, "{}/{} steps completed", emitted + 1, count);
        }
    }

    Ok(())
}

/// Fold a failed enable release into the fault that interrupted the move.
fn still_energized(axis: Axis, fault: Error, release: Error) -> Error {
    let cause = match fault {
        Error::HardwareFault { reason, .. } => reason,
        other => other.to_string(),
    };
    let release = match release {
        Error::HardwareFault { reason, .. } => reason,
        other => other.to_string(),
    };
    Error::HardwareFault {
        axis,
        reason: format!("{}; enable release failed: {}", cause, release),
    }
}

fn pin_fault<E: core::fmt::Debug>(axis: Axis, pin: &str, error: E) -> Error {
    Error::HardwareFault {
        axis,
        reason: format!("{} pin write failed: {:?}", pin, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    /// Pin that fails after a fixed number of successful writes.
    #[derive(Debug, Default)]
    struct FlakyPin {
        writes_left: Option<u32>,
        high: bool,
    }

    #[derive(Debug)]
    struct FlakyError;

    impl embedded_hal::digital::Error for FlakyError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for FlakyPin {
        type Error = FlakyError;
    }

    impl OutputPin for FlakyPin {
        fn set_low(&mut self) -> core::result::Result<(), FlakyError> {
            self.write(false)
        }

        fn set_high(&mut self) -> core::result::Result<(), FlakyError> {
            self.write(true)
        }
    }

    impl FlakyPin {
        fn failing_after(writes: u32) -> Self {
            Self {
                writes_left: Some(writes),
                high: false,
            }
        }

        fn write(&mut self, high: bool) -> core::result::Result<(), FlakyError> {
            match self.writes_left.as_mut() {
                Some(0) => return Err(FlakyError),
                Some(left) => *left -= 1,
                None => {}
            }
            self.high = high;
            Ok(())
        }
    }

    fn healthy_pins() -> AxisPins<FlakyPin> {
        AxisPins {
            step: FlakyPin::default(),
            direction: FlakyPin::default(),
            enable: FlakyPin::default(),
        }
    }

    #[test]
    fn test_step_fault_reports_emitted_steps_and_disables() {
        let x = AxisPins {
            // 3 full pulses, then the 4th rising edge fails
            step: FlakyPin::failing_after(6),
            direction: FlakyPin::default(),
            enable: FlakyPin::default(),
        };
        let config = StageConfig::default();
        let mut driver =
            PulseDriver::new([x, healthy_pins(), healthy_pins()], NoopDelay::new(), &config)
                .unwrap();

        let result = driver.drive(Axis::X, Steps(-10), &CancelToken::new());
        let (emitted, error) = result.unwrap_err();

        assert_eq!(emitted, Steps(-3));
        assert!(matches!(error, Error::HardwareFault { axis: Axis::X, .. }));

        let (pins, _) = driver.release();
        assert!(pins[0].enable.high, "enable must be high (de-energized)");
    }

    #[test]
    fn test_failed_release_is_part_of_fault() {
        let x = AxisPins {
            step: FlakyPin::failing_after(0),
            direction: FlakyPin::default(),
            // Disable at construction and energize succeed; release fails
            enable: FlakyPin::failing_after(2),
        };
        let config = StageConfig::default();
        let mut driver =
            PulseDriver::new([x, healthy_pins(), healthy_pins()], NoopDelay::new(), &config)
                .unwrap();

        let (emitted, error) = driver
            .drive(Axis::X, Steps(5), &CancelToken::new())
            .unwrap_err();

        assert_eq!(emitted, Steps(0));
        let reason = match error {
            Error::HardwareFault {
                axis: Axis::X,
                reason,
            } => reason,
            other => panic!("expected hardware fault on x, got {other:?}"),
        };
        assert!(reason.starts_with("step pin write failed"), "{reason}");
        assert!(
            reason.contains("; enable release failed: enable pin write failed"),
            "{reason}"
        );

        let (pins, _) = driver.release();
        assert!(!pins[0].enable.high, "release never reached the pin");
    }

    #[test]
    fn test_cancelled_before_first_pulse() {
        let config = StageConfig::default();
        let mut driver = PulseDriver::new(
            [healthy_pins(), healthy_pins(), healthy_pins()],
            NoopDelay::new(),
            &config,
        )
        .unwrap();

        let cancel = CancelToken::new();
        cancel.trigger();

        let result = driver.drive(Axis::Z, Steps(25), &cancel);
        assert_eq!(result, Err((Steps(0), Error::Aborted { axis: Axis::Z })));

        let (pins, _) = driver.release();
        assert!(pins[2].enable.high);
        assert!(!pins[2].step.high);
    }

    #[test]
    fn test_init_failure_is_reported() {
        let broken = AxisPins {
            step: FlakyPin::default(),
            direction: FlakyPin::default(),
            enable: FlakyPin::failing_after(0),
        };
        let config = StageConfig::default();
        let result = PulseDriver::new(
            [healthy_pins(), broken, healthy_pins()],
            NoopDelay::new(),
            &config,
        );

        assert!(matches!(
            result,
            Err(Error::HardwareFault { axis: Axis::Y, .. })
        ));
    }
}
