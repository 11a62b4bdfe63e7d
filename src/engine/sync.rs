use crate::engine::driver::StatusIndicator;
use crate::engine::time_source::TimeSource;
use crate::model::SyncStatus;
use std::time::Duration;
use time::OffsetDateTime;

/// Decides when to query the time service and mirrors the outcome on the
/// status indicator.
pub struct SyncScheduler<I> {
    interval: Duration,
    last_success: Option<OffsetDateTime>,
    status: SyncStatus,
    indicator: I,
}

impl<I: StatusIndicator> SyncScheduler<I> {
    pub fn new(interval: Duration, mut indicator: I) -> Self {
        indicator.set(false);
        Self {
            interval,
            last_success: None,
            status: SyncStatus::default(),
            indicator,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Whether a refresh is due at `now`.
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        match self.last_success {
            None => true,
            // A clock that jumped behind the last sync cannot be trusted to measure the interval.
            Some(last) if now < last => true,
            Some(last) => (now - last).unsigned_abs() >= self.interval,
        }
    }

    /// Refresh if due. Returns the outcome, or `None` when nothing was attempted.
    pub async fn maybe_refresh<T: TimeSource>(&mut self, source: &mut T, url: &str) -> Option<bool> {
        if self.is_due(source.now()) {
            Some(self.refresh(source, url).await)
        } else {
            None
        }
    }

    /// Attempt a refresh now, regardless of schedule.
    pub async fn refresh<T: TimeSource>(&mut self, source: &mut T, url: &str) -> bool {
        self.indicator.set(false);
        tracing::info!(url, "time synchronization started");
        let ok = match source.refresh(url).await {
            Ok(synced) => {
                tracing::info!(time = %synced, "time synchronization successful");
                self.last_success = Some(synced);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "time synchronization failed");
                false
            }
        };
        self.status = SyncStatus {
            succeeded: ok,
            at: Some(source.now()),
        };
        self.indicator.set(ok);
        ok
    }
}
