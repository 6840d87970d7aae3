//! Property tests for position bookkeeping.

use embedded_hal_mock::eh1::delay::NoopDelay;
use proptest::prelude::*;

use microscope_stage::config::AxesConfig;
use microscope_stage::{
    Axis, DriveEngine, Millimeters, SimulatedDriver, StageConfig, StageController, StagePosition,
    Steps,
};

fn engine() -> DriveEngine<SimulatedDriver<NoopDelay>> {
    DriveEngine::new(SimulatedDriver::new(NoopDelay::new(), 0), &AxesConfig::default())
}

proptest! {
    /// Any reachable target is hit to within half a step on every axis.
    #[test]
    fn move_to_lands_within_half_step(
        x in -50.0f64..50.0,
        y in -50.0f64..50.0,
        z in -20.0f64..20.0,
    ) {
        let mut engine = engine();
        let target = StagePosition::new(x, y, z);
        engine.move_to(target).unwrap();

        let position = engine.snapshot();
        for axis in Axis::ALL {
            let tolerance = 0.5 / engine.steps_per_mm(axis) + 1e-9;
            prop_assert!((position.get(axis) - target.get(axis)).abs() <= tolerance);
        }
    }

    /// Going somewhere and back returns to the starting point within one step.
    #[test]
    fn move_round_trip(
        start in (-20.0f64..20.0, -20.0f64..20.0, -5.0f64..5.0),
        away in (-40.0f64..40.0, -40.0f64..40.0, -10.0f64..10.0),
    ) {
        let mut engine = engine();
        engine.move_to(StagePosition::new(start.0, start.1, start.2)).unwrap();
        let before = engine.snapshot();

        engine.move_to(StagePosition::new(away.0, away.1, away.2)).unwrap();
        engine.move_to(StagePosition::from(before)).unwrap();

        let after = engine.snapshot();
        for axis in Axis::ALL {
            let tolerance = 1.0 / engine.steps_per_mm(axis) + 1e-9;
            prop_assert!((after.get(axis) - before.get(axis)).abs() <= tolerance);
        }
    }

    /// Step rounding never moves further than half a step from the request.
    #[test]
    fn step_rounding_is_nearest(delta in -100.0f64..100.0, spm in 1.0f64..1000.0) {
        let steps = Steps::from_mm(Millimeters(delta), spm);
        prop_assert!((steps.to_mm(spm).value() - delta).abs() <= 0.5 / spm + 1e-9);
    }

    /// Sync to the same slot twice leaves the stage where the first call put it.
    #[test]
    fn sync_is_idempotent(hpf in any::<bool>(), n in 1u32..=10) {
        let controller = StageController::from_config(
            SimulatedDriver::new(NoopDelay::new(), 0),
            &StageConfig::default(),
        ).unwrap();
        let mode = if hpf { "hpf" } else { "lpf" };

        let first = controller.sync(mode, n).unwrap();
        let second = controller.sync(mode, n).unwrap();
        prop_assert_eq!(first.position, second.position);
        prop_assert_eq!(first.sample, second.sample);
    }
}
