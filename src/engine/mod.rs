pub mod driver;
pub mod sync;
pub mod time_source;
pub mod timing;

use crate::error::{DriverFault, StorageError};
use crate::model::ClockConfig;
use crate::position::Position;
use crate::storage::PositionStore;
use driver::StepDriver;

/// Log progress every this many ticks during long manual advances.
const PROGRESS_EVERY: u32 = 10;

/// Owns the displayed hand position and keeps it in step with the mechanism.
///
/// Every physical tick is followed by a durable write, so a power cut loses
/// at most the minute in flight.
pub struct ClockController<D, S> {
    config: ClockConfig,
    /// Timezone URL set from the console but not yet saved.
    pending_timezone: Option<String>,
    driver: D,
    store: S,
}

impl<D: StepDriver, S: PositionStore> ClockController<D, S> {
    pub fn new(config: ClockConfig, driver: D, store: S) -> Self {
        Self {
            config,
            pending_timezone: None,
            driver,
            store,
        }
    }

    pub fn displayed(&self) -> Position {
        self.config.display
    }

    /// Timezone URL in effect, including an unsaved change.
    pub fn timezone_url(&self) -> &str {
        self.pending_timezone
            .as_deref()
            .unwrap_or(&self.config.timezone_url)
    }

    pub fn has_unsaved_timezone(&self) -> bool {
        self.pending_timezone.is_some()
    }

    /// Move the hands one minute and record it.
    pub async fn tick(&mut self) -> Result<(), DriverFault> {
        self.driver.pulse().await?;
        self.config.display = self.config.display.advance(1);
        self.persist();
        Ok(())
    }

    /// Tick forward until the hands show `target`. Returns the number of ticks.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn run_to_target(&mut self, target: Position) -> Result<u32, DriverFault> {
        self.run_to_target_until(target, || false).await
    }

    /// Like [`Self::run_to_target`], but checks `stop` before every tick.
    pub async fn run_to_target_until(
        &mut self,
        target: Position,
        mut stop: impl FnMut() -> bool,
    ) -> Result<u32, DriverFault> {
        let mut ticks = 0;
        while self.config.display != target {
            if stop() {
                tracing::info!(displayed = %self.config.display, %target, "stopped before target");
                break;
            }
            tracing::debug!("{} -> {}", self.config.display, target);
            self.tick().await?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Record that the hands show `pos`, without moving them.
    pub fn set_displayed(&mut self, pos: Position) {
        self.config.display = pos;
        self.persist();
    }

    /// Physically advance the hands by `n` minutes.
    pub async fn advance_physical(&mut self, n: u32) -> Result<u32, DriverFault> {
        for i in 1..=n {
            self.tick().await?;
            if i % PROGRESS_EVERY == 0 {
                tracing::info!("{i}/{n} minutes done");
            }
        }
        Ok(n)
    }

    /// Move the recorded position back by `n` minutes without moving the hands.
    pub fn adjust_memory(&mut self, n: i32) {
        self.config.display = self.config.display.retreat(n);
        self.persist();
    }

    /// Stage a new timezone URL; it is written on the next [`Self::save`].
    pub fn set_timezone(&mut self, url: String) {
        self.pending_timezone = Some(url);
    }

    /// Write the full record, including a staged timezone.
    pub fn save(&mut self) -> Result<(), StorageError> {
        let mut next = self.config.clone();
        if let Some(url) = self.pending_timezone.as_ref() {
            next.timezone_url = url.clone();
        }
        self.store.save(&next)?;
        self.config = next;
        self.pending_timezone = None;
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.config) {
            tracing::warn!(error = %e, display = %self.config.display, "failed to persist clock position");
        }
    }
}
