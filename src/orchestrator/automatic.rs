//! Automatic mode: keep the hands on real time, minute by minute.

use super::station::{Mode, Station};
use crate::engine::driver::{StatusIndicator, StepDriver};
use crate::engine::time_source::TimeSource;
use crate::engine::timing::{sleep_unless_stopped, until_next_minute, Sleeper};
use crate::position::Position;
use crate::storage::PositionStore;
use std::sync::atomic::Ordering;

impl<D, S, T, I, Z> Station<D, S, T, I, Z>
where
    D: StepDriver,
    S: PositionStore,
    T: TimeSource,
    I: StatusIndicator,
    Z: Sleeper,
{
    /// Run until the stop flag is raised. A refresh is attempted before the
    /// first display update; the flag is only honored between ticks and
    /// while waiting for the next minute.
    pub async fn run_automatic(&mut self) {
        self.stop.store(false, Ordering::Relaxed);
        self.mode = Mode::Automatic;
        tracing::info!(displayed = %self.controller.displayed(), "clock started");

        loop {
            let url = self.controller.timezone_url().to_string();
            self.sync.maybe_refresh(&mut self.time, &url).await;

            let now = self.time.now();
            let target = Position::from_time(now);
            tracing::debug!(%now, displayed = %self.controller.displayed(), %target, "minute update");

            let stop = &self.stop;
            match self
                .controller
                .run_to_target_until(target, || stop.load(Ordering::Relaxed))
                .await
            {
                Ok(0) => {}
                Ok(ticks) => {
                    tracing::info!(ticks, displayed = %self.controller.displayed(), "display updated")
                }
                Err(e) => tracing::warn!(error = %e, "tick aborted, retrying next minute"),
            }

            let wait = until_next_minute(self.time.now());
            if !sleep_unless_stopped(&self.sleeper, wait, &self.stop).await {
                break;
            }
        }

        self.stop.store(false, Ordering::Relaxed);
        self.mode = Mode::Interactive;
        tracing::info!(displayed = %self.controller.displayed(), "clock stopped");
    }
}
