//! Pin-level tests for the pulse driver using embedded-hal-mock.

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};

use microscope_stage::drive::{AxisPins, PulseDriver};
use microscope_stage::{Axis, CancelToken, Error, StageConfig, StepDriver, Steps};

fn pin(expected: &[PinTransaction]) -> PinMock {
    PinMock::new(expected)
}

fn idle_axis() -> AxisPins<PinMock> {
    AxisPins {
        step: pin(&[]),
        direction: pin(&[]),
        enable: pin(&[PinTransaction::set(PinState::High)]),
    }
}

fn pulses(count: usize) -> Vec<PinTransaction> {
    (0..count)
        .flat_map(|_| {
            [
                PinTransaction::set(PinState::High),
                PinTransaction::set(PinState::Low),
            ]
        })
        .collect()
}

fn finish(driver: PulseDriver<PinMock, NoopDelay>) {
    let (pins, _delay) = driver.release();
    for mut axis in pins {
        axis.step.done();
        axis.direction.done();
        axis.enable.done();
    }
}

#[test]
fn test_forward_move_pin_sequence() {
    let x = AxisPins {
        step: pin(&pulses(3)),
        direction: pin(&[PinTransaction::set(PinState::High)]),
        enable: pin(&[
            // Disabled at construction
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]),
    };

    let mut driver =
        PulseDriver::new([x, idle_axis(), idle_axis()], NoopDelay::new(), &StageConfig::default())
            .unwrap();
    assert_eq!(driver.half_period_us(), 500);
    driver.drive(Axis::X, Steps::new(3), &CancelToken::new()).unwrap();

    finish(driver);
}

#[test]
fn test_inverted_axis_reverses_direction_line() {
    let mut config = StageConfig::default();
    config.axes.z.invert_direction = true;

    let z = AxisPins {
        step: pin(&pulses(2)),
        direction: pin(&[PinTransaction::set(PinState::Low)]),
        enable: pin(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]),
    };

    let mut driver =
        PulseDriver::new([idle_axis(), idle_axis(), z], NoopDelay::new(), &config).unwrap();
    driver.drive(Axis::Z, Steps::new(2), &CancelToken::new()).unwrap();

    finish(driver);
}

#[test]
fn test_cancelled_move_emits_nothing_and_releases() {
    let y = AxisPins {
        step: pin(&[]),
        direction: pin(&[PinTransaction::set(PinState::Low)]),
        enable: pin(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]),
    };

    let mut driver =
        PulseDriver::new([idle_axis(), y, idle_axis()], NoopDelay::new(), &StageConfig::default())
            .unwrap();

    let cancel = CancelToken::new();
    cancel.trigger();
    let (emitted, error) = driver.drive(Axis::Y, Steps::new(-5), &cancel).unwrap_err();

    assert_eq!(emitted, Steps::new(0));
    assert_eq!(error, Error::Aborted { axis: Axis::Y });
    finish(driver);
}
