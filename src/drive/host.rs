//! Linux host backends: sysfs GPIO lines, thread-sleep delay, and driver
//! selection with fallback to simulation.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use tracing::{info, warn};

use crate::axis::Axis;
use crate::config::StageConfig;
use crate::error::{Error, Result};

use super::{AxisPins, PulseDriver, SimulatedDriver, StepDriver};

/// Root of the sysfs GPIO interface.
pub const GPIO_ROOT: &str = "/sys/class/gpio";

/// Delay provider backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// I/O failure on a sysfs GPIO line.
#[derive(Debug)]
pub struct SysfsError {
    /// BCM line number
    pub line: u8,
    /// Underlying error
    pub source: io::Error,
}

impl embedded_hal::digital::Error for SysfsError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output line driven through `/sys/class/gpio/gpioN/value`.
#[derive(Debug)]
pub struct SysfsPin {
    line: u8,
    value: File,
}

impl SysfsPin {
    /// Export a line (if needed) and configure it as an output.
    pub fn open(line: u8) -> io::Result<Self> {
        Self::open_at(Path::new(GPIO_ROOT), line)
    }

    /// Like [`SysfsPin::open`], under a different sysfs root.
    pub fn open_at(root: &Path, line: u8) -> io::Result<Self> {
        let dir: PathBuf = root.join(format!("gpio{}", line));

        if !dir.exists() {
            fs::write(root.join("export"), line.to_string())?;
        }
        fs::write(dir.join("direction"), "out")?;

        let value = OpenOptions::new().write(true).open(dir.join("value"))?;
        Ok(Self { line, value })
    }

    /// BCM line number.
    pub fn line(&self) -> u8 {
        self.line
    }

    fn write(&mut self, level: &[u8]) -> core::result::Result<(), SysfsError> {
        self.value
            .write_all_at(level, 0)
            .map_err(|source| SysfsError {
                line: self.line,
                source,
            })
    }
}

impl ErrorType for SysfsPin {
    type Error = SysfsError;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.write(b"0")
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        self.write(b"1")
    }
}

/// Open all nine configured lines and build a hardware driver.
///
/// # Errors
///
/// Returns [`Error::HardwareFault`] naming the axis whose line failed.
pub fn open_pulse_driver(config: &StageConfig) -> Result<PulseDriver<SysfsPin, StdDelay>> {
    open_pulse_driver_at(Path::new(GPIO_ROOT), config)
}

/// Like [`open_pulse_driver`], under a different sysfs root.
pub fn open_pulse_driver_at(
    root: &Path,
    config: &StageConfig,
) -> Result<PulseDriver<SysfsPin, StdDelay>> {
    let open_axis = |axis: Axis| -> Result<AxisPins<SysfsPin>> {
        let pins = config.axes.get(axis).pins;
        info!(
            %axis,
            step = pins.step,
            direction = pins.direction,
            enable = pins.enable,
            "Setting up motor pins"
        );

        let open = |line: u8| {
            SysfsPin::open_at(root, line).map_err(|e| Error::HardwareFault {
                axis,
                reason: format!("GPIO{}: {}", line, e),
            })
        };

        Ok(AxisPins {
            step: open(pins.step)?,
            direction: open(pins.direction)?,
            enable: open(pins.enable)?,
        })
    };

    let pins = [open_axis(Axis::X)?, open_axis(Axis::Y)?, open_axis(Axis::Z)?];
    PulseDriver::new(pins, StdDelay, config)
}

/// Pick the driving implementation for this host.
///
/// Hardware is used when GPIO is present and every line opens. Any failure
/// is logged and the stage runs in simulation instead; startup never fails
/// because of missing hardware.
pub fn select_driver(config: &StageConfig, force_simulation: bool) -> Box<dyn StepDriver + Send> {
    select_driver_at(Path::new(GPIO_ROOT), config, force_simulation)
}

/// Like [`select_driver`], probing GPIO under `root`.
pub fn select_driver_at(
    root: &Path,
    config: &StageConfig,
    force_simulation: bool,
) -> Box<dyn StepDriver + Send> {
    let simulation = || -> Box<dyn StepDriver + Send> {
        Box::new(SimulatedDriver::from_config(StdDelay, config))
    };

    if force_simulation {
        info!("Simulation mode requested");
        return simulation();
    }

    if !root.exists() {
        warn!(root = %root.display(), "GPIO not available. Running in simulation mode");
        return simulation();
    }

    match open_pulse_driver_at(root, config) {
        Ok(driver) => {
            info!("GPIO initialization completed successfully");
            Box::new(driver)
        }
        Err(e) => {
            warn!(error = %e, "GPIO initialization failed. Running in simulation mode");
            simulation()
        }
    }
}
