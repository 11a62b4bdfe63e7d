//! In-memory stand-ins for hardware, storage and the network, shared by the
//! unit tests.

use crate::engine::driver::{StatusIndicator, StepDriver};
use crate::engine::time_source::TimeSource;
use crate::engine::timing::Sleeper;
use crate::error::{DriverFault, StorageError, SyncError};
use crate::model::ClockConfig;
use crate::storage::PositionStore;
use embedded_hal::digital::v2::OutputPin;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Clone, Default)]
pub struct CountingDriver {
    pulses: Rc<Cell<u32>>,
    fail: Rc<Cell<bool>>,
}

impl CountingDriver {
    pub fn pulses(&self) -> u32 {
        self.pulses.get()
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl StepDriver for CountingDriver {
    async fn pulse(&mut self) -> Result<(), DriverFault> {
        if self.fail.get() {
            return Err(DriverFault::Line {
                line: "enable",
                reason: "busy".into(),
            });
        }
        self.pulses.set(self.pulses.get() + 1);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    record: Rc<RefCell<Option<ClockConfig>>>,
    saves: Rc<Cell<u32>>,
    fail: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn saved(&self) -> Option<ClockConfig> {
        self.record.borrow().clone()
    }

    pub fn saves(&self) -> u32 {
        self.saves.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl PositionStore for MemoryStore {
    fn load(&self) -> Result<ClockConfig, StorageError> {
        self.record.borrow().clone().ok_or_else(|| StorageError::Read {
            path: "memory".into(),
            source: std::io::ErrorKind::NotFound.into(),
        })
    }

    fn save(&self, config: &ClockConfig) -> Result<(), StorageError> {
        if self.fail.get() {
            return Err(StorageError::Write {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        *self.record.borrow_mut() = Some(config.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// Time source with a settable clock. Refreshes fail unless an answer was
/// configured with [`FakeTimeSource::succeed_with`].
pub struct FakeTimeSource {
    now: OffsetDateTime,
    answer: Option<OffsetDateTime>,
    refreshes: u32,
    urls: Vec<String>,
}

impl FakeTimeSource {
    pub fn at(now: OffsetDateTime) -> Self {
        Self {
            now,
            answer: None,
            refreshes: 0,
            urls: Vec::new(),
        }
    }

    pub fn set_now(&mut self, now: OffsetDateTime) {
        self.now = now;
    }

    pub fn succeed_with(&mut self, at: OffsetDateTime) {
        self.answer = Some(at);
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

impl TimeSource for FakeTimeSource {
    fn now(&self) -> OffsetDateTime {
        self.now
    }

    async fn refresh(&mut self, url: &str) -> Result<OffsetDateTime, SyncError> {
        self.refreshes += 1;
        self.urls.push(url.to_string());
        match self.answer {
            Some(at) => {
                self.now = at;
                Ok(at)
            }
            None => Err(SyncError::Timeout(Duration::from_secs(10))),
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingIndicator {
    history: Rc<RefCell<Vec<bool>>>,
}

impl RecordingIndicator {
    pub fn history(&self) -> Vec<bool> {
        self.history.borrow().clone()
    }

    pub fn current(&self) -> Option<bool> {
        self.history.borrow().last().copied()
    }
}

impl StatusIndicator for RecordingIndicator {
    fn set(&mut self, on: bool) {
        self.history.borrow_mut().push(on);
    }
}

/// Output line that appends `(name, level)` to a shared log.
pub struct RecordingLine {
    name: &'static str,
    log: Rc<RefCell<Vec<(&'static str, bool)>>>,
    ok_calls_left: Option<u32>,
}

impl RecordingLine {
    pub fn new(name: &'static str, log: Rc<RefCell<Vec<(&'static str, bool)>>>) -> Self {
        Self {
            name,
            log,
            ok_calls_left: None,
        }
    }

    /// Succeeds `n` times, then fails every call.
    pub fn failing_after(
        name: &'static str,
        log: Rc<RefCell<Vec<(&'static str, bool)>>>,
        n: u32,
    ) -> Self {
        Self {
            name,
            log,
            ok_calls_left: Some(n),
        }
    }
}

impl RecordingLine {
    fn record(&mut self, high: bool) -> Result<(), &'static str> {
        if let Some(left) = self.ok_calls_left.as_mut() {
            if *left == 0 {
                return Err("line stuck");
            }
            *left -= 1;
        }
        self.log.borrow_mut().push((self.name, high));
        Ok(())
    }
}

impl OutputPin for RecordingLine {
    type Error = &'static str;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(true)
    }
}

/// Sleeper that returns immediately and records what it was asked for.
/// Optionally raises a stop flag after a number of calls.
#[derive(Clone, Default)]
pub struct InstantSleeper {
    recorded: Rc<RefCell<Vec<Duration>>>,
    stop_after: Option<(usize, Arc<AtomicBool>)>,
}

impl InstantSleeper {
    pub fn stopping_after(calls: usize, stop: Arc<AtomicBool>) -> Self {
        Self {
            recorded: Rc::default(),
            stop_after: Some((calls, stop)),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.recorded.borrow().len()
    }

    pub fn total(&self) -> Duration {
        self.recorded.borrow().iter().sum()
    }
}

impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.recorded.borrow_mut().push(duration);
        if let Some((calls, stop)) = &self.stop_after {
            if self.recorded.borrow().len() >= *calls {
                stop.store(true, Ordering::Relaxed);
            }
        }
    }
}
