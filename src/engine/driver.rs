//! Step-pulse driver and GPIO output lines.
//!
//! One minute on the dial is one polarity reversal of the clock coil, which
//! the full-step bridge driver produces from two step-pin transitions.

use crate::engine::timing::Sleeper;
use crate::error::DriverFault;
use embedded_hal::digital::v2::OutputPin;
use linux_embedded_hal::sysfs_gpio::{self, Direction};
use linux_embedded_hal::SysfsPin;
use std::convert::Infallible;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

/// Step-pin transitions per minute of dial movement.
pub const STEPS_PER_MINUTE: usize = 2;

/// Moves the mechanism forward by exactly one minute.
pub trait StepDriver {
    fn pulse(&mut self) -> impl Future<Output = Result<(), DriverFault>>;
}

/// Timing of one pulse sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTiming {
    /// Delay between enabling the bridge and the first step edge.
    pub settle: Duration,
    pub width: Duration,
    pub gap: Duration,
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(10),
            width: Duration::from_millis(25),
            gap: Duration::from_millis(250),
        }
    }
}

/// Line polarity: which electrical level means "active".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    fn level(self, active: bool) -> bool {
        match self {
            Polarity::ActiveHigh => active,
            Polarity::ActiveLow => !active,
        }
    }
}

fn drive<P>(pin: &mut P, high: bool) -> Result<(), P::Error>
where
    P: OutputPin,
{
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}

fn line_fault<E: Debug>(line: &'static str) -> impl FnOnce(E) -> DriverFault {
    move |e| DriverFault::Line {
        line,
        reason: format!("{e:?}"),
    }
}

/// Pulse driver over an enable pin and a step pin.
pub struct GpioStepDriver<E, S, Z> {
    enable: E,
    step: S,
    enable_polarity: Polarity,
    timing: PulseTiming,
    sleeper: Z,
}

impl<E, S, Z> GpioStepDriver<E, S, Z>
where
    E: OutputPin,
    E::Error: Debug,
    S: OutputPin,
    S::Error: Debug,
    Z: Sleeper,
{
    /// Build the driver and leave the bridge disabled.
    pub fn new(
        mut enable: E,
        mut step: S,
        enable_polarity: Polarity,
        timing: PulseTiming,
        sleeper: Z,
    ) -> Result<Self, DriverFault> {
        drive(&mut enable, enable_polarity.level(false)).map_err(line_fault("enable"))?;
        step.set_low().map_err(line_fault("step"))?;
        Ok(Self {
            enable,
            step,
            enable_polarity,
            timing,
            sleeper,
        })
    }

    fn set_enabled(&mut self, on: bool) -> Result<(), DriverFault> {
        drive(&mut self.enable, self.enable_polarity.level(on)).map_err(line_fault("enable"))
    }

    async fn step_edges(&mut self) -> Result<(), DriverFault> {
        for _ in 0..STEPS_PER_MINUTE {
            self.step.set_high().map_err(line_fault("step"))?;
            self.sleeper.sleep(self.timing.width).await;
            self.step.set_low().map_err(line_fault("step"))?;
            self.sleeper.sleep(self.timing.gap).await;
        }
        Ok(())
    }
}

impl<E, S, Z> StepDriver for GpioStepDriver<E, S, Z>
where
    E: OutputPin,
    E::Error: Debug,
    S: OutputPin,
    S::Error: Debug,
    Z: Sleeper,
{
    async fn pulse(&mut self) -> Result<(), DriverFault> {
        self.set_enabled(true)?;
        self.sleeper.sleep(self.timing.settle).await;
        let stepped = self.step_edges().await;
        // The bridge must not stay energized between minutes, even after a fault.
        let disabled = self.set_enabled(false);
        stepped.and(disabled)
    }
}

/// Output pin that only logs its transitions.
#[derive(Debug)]
pub struct DryRunPin {
    name: &'static str,
}

impl DryRunPin {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn record(&self, high: bool) {
        tracing::trace!(line = self.name, level = u8::from(high), "gpio");
    }
}

impl OutputPin for DryRunPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(true);
        Ok(())
    }
}

/// Either a Linux sysfs GPIO or a dry-run pin, picked at startup.
pub enum Line {
    Sysfs(SysfsPin),
    DryRun(DryRunPin),
}

impl Line {
    /// Export `pin` and configure it as an output, unless `dry_run`.
    pub fn open(name: &'static str, pin: u64, dry_run: bool) -> Result<Self, sysfs_gpio::Error> {
        if dry_run {
            return Ok(Line::DryRun(DryRunPin::new(name)));
        }
        let gpio = SysfsPin::new(pin);
        gpio.0.export()?;
        gpio.0.set_direction(Direction::Out)?;
        Ok(Line::Sysfs(gpio))
    }
}

impl OutputPin for Line {
    type Error = sysfs_gpio::Error;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        match self {
            Line::Sysfs(p) => p.set_low(),
            Line::DryRun(p) => {
                p.record(false);
                Ok(())
            }
        }
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        match self {
            Line::Sysfs(p) => p.set_high(),
            Line::DryRun(p) => {
                p.record(true);
                Ok(())
            }
        }
    }
}

/// Boolean sync indicator (the status LED).
pub trait StatusIndicator {
    fn set(&mut self, on: bool);
}

/// Indicator driven by an output pin.
pub struct LineIndicator<L> {
    pin: L,
    polarity: Polarity,
}

impl<L> LineIndicator<L>
where
    L: OutputPin,
    L::Error: Debug,
{
    /// Build the indicator, initially off.
    pub fn new(pin: L, polarity: Polarity) -> Self {
        let mut indicator = Self { pin, polarity };
        indicator.set(false);
        indicator
    }
}

impl<L> StatusIndicator for LineIndicator<L>
where
    L: OutputPin,
    L::Error: Debug,
{
    fn set(&mut self, on: bool) {
        if let Err(e) = drive(&mut self.pin, self.polarity.level(on)) {
            tracing::warn!(error = ?e, "failed to drive status indicator");
        }
    }
}
