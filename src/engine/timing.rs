use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use time::OffsetDateTime;

/// Granularity at which long waits check the stop flag.
const STOP_POLL_SLICE: Duration = Duration::from_millis(100);

/// Sleep provider, swapped out in tests so nothing waits for real.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }
}

/// Time left until the next minute boundary. A reading exactly on a boundary
/// waits a full minute.
pub fn until_next_minute(now: OffsetDateTime) -> Duration {
    let into_minute =
        Duration::from_secs(now.second() as u64) + Duration::from_nanos(now.nanosecond() as u64);
    Duration::from_secs(60) - into_minute.min(Duration::from_secs(60))
}

/// Sleep for `total`, waking early if `stop` is raised.
/// Returns `false` when interrupted.
pub async fn sleep_unless_stopped(
    sleeper: &impl Sleeper,
    total: Duration,
    stop: &AtomicBool,
) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let slice = remaining.min(STOP_POLL_SLICE);
        sleeper.sleep(slice).await;
        remaining -= slice;
    }
    !stop.load(Ordering::Relaxed)
}
