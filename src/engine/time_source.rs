//! Wall-clock source with network correction.

use crate::error::SyncError;
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Local real-time clock plus an external service that can correct it.
pub trait TimeSource {
    /// Current time in the configured offset.
    fn now(&self) -> OffsetDateTime;

    /// Query `url` once and re-anchor the clock on success. On failure the
    /// clock is left exactly as it was.
    fn refresh(&mut self, url: &str) -> impl Future<Output = Result<OffsetDateTime, SyncError>>;
}

/// Software RTC: a wall time anchored to a monotonic instant.
#[derive(Debug, Clone, Copy)]
pub struct SoftRtc {
    anchor: Option<(OffsetDateTime, Instant)>,
    offset: UtcOffset,
}

impl SoftRtc {
    /// Follows the host clock in the host's local offset until first set.
    pub fn from_host() -> Self {
        Self {
            anchor: None,
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    pub fn set(&mut self, at: OffsetDateTime) {
        self.offset = at.offset();
        self.anchor = Some((at, Instant::now()));
    }

    pub fn now(&self) -> OffsetDateTime {
        match self.anchor {
            Some((at, since)) => at + since.elapsed(),
            None => OffsetDateTime::now_utc().to_offset(self.offset),
        }
    }
}

/// worldtimeapi-style time service client.
pub struct HttpTimeSource {
    client: reqwest::Client,
    timeout: Duration,
    rtc: SoftRtc,
}

impl HttpTimeSource {
    pub fn new(timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("station-clock/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            timeout,
            rtc: SoftRtc::from_host(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, SyncError> {
        let request = async {
            let resp = self.client.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(SyncError::Status(status.as_u16()));
            }
            Ok::<String, SyncError>(resp.text().await?)
        };
        // reqwest's own timeout covers the transfer; this one also bounds DNS and connect.
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Err(SyncError::Network(e))) if e.is_timeout() => Err(SyncError::Timeout(self.timeout)),
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(self.timeout)),
        }
    }
}

impl TimeSource for HttpTimeSource {
    fn now(&self) -> OffsetDateTime {
        self.rtc.now()
    }

    async fn refresh(&mut self, url: &str) -> Result<OffsetDateTime, SyncError> {
        tracing::debug!(url, "querying time service");
        let body = self.fetch(url).await?;
        let synced = parse_time_response(&body)?;
        self.rtc.set(synced);
        Ok(synced)
    }
}

#[derive(Debug, Deserialize)]
struct TimeResponse {
    datetime: Option<String>,
    unixtime: Option<i64>,
    utc_offset: Option<String>,
}

/// Parse a time service body into a date-time carrying its UTC offset.
///
/// `datetime` (RFC 3339) is preferred; `unixtime` plus `utc_offset` is the
/// fallback.
pub fn parse_time_response(body: &str) -> Result<OffsetDateTime, SyncError> {
    let resp: TimeResponse =
        serde_json::from_str(body).map_err(|e| SyncError::Parse(e.to_string()))?;

    if let Some(dt) = resp.datetime.as_deref() {
        return OffsetDateTime::parse(dt, &Rfc3339)
            .map_err(|e| SyncError::Parse(format!("datetime '{dt}': {e}")));
    }

    match (resp.unixtime, resp.utc_offset.as_deref()) {
        (Some(ts), Some(off)) => {
            let offset = UtcOffset::parse(
                off,
                format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
            )
            .map_err(|e| SyncError::Parse(format!("utc_offset '{off}': {e}")))?;
            let utc = OffsetDateTime::from_unix_timestamp(ts)
                .map_err(|e| SyncError::Parse(format!("unixtime {ts}: {e}")))?;
            Ok(utc.to_offset(offset))
        }
        _ => Err(SyncError::Parse(
            "response has neither datetime nor unixtime with utc_offset".into(),
        )),
    }
}
