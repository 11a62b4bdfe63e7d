use crate::position::Position;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

pub const DEFAULT_TIME_SERVICE_URL: &str = "http://worldtimeapi.org/api/timezone/CET";

/// Example time-service URLs shown by `z list`, grouped by region.
pub const TIMEZONE_EXAMPLES: &[(&str, &[&str])] = &[
    (
        "Europe",
        &[
            "http://worldtimeapi.org/api/timezone/Europe/Warsaw",
            "http://worldtimeapi.org/api/timezone/Europe/London",
            "http://worldtimeapi.org/api/timezone/Europe/Paris",
            "http://worldtimeapi.org/api/timezone/Europe/Berlin",
            "http://worldtimeapi.org/api/timezone/CET",
        ],
    ),
    (
        "Americas",
        &[
            "http://worldtimeapi.org/api/timezone/America/New_York",
            "http://worldtimeapi.org/api/timezone/America/Los_Angeles",
            "http://worldtimeapi.org/api/timezone/America/Chicago",
        ],
    ),
    (
        "Asia",
        &[
            "http://worldtimeapi.org/api/timezone/Asia/Tokyo",
            "http://worldtimeapi.org/api/timezone/Asia/Shanghai",
        ],
    ),
];

/// Persisted clock record.
///
/// Fields are read one by one: a value of the wrong shape falls back to that
/// field's default without costing the others. Wi-Fi credentials are not used
/// by the clock itself; they are carried as raw JSON so a save writes them
/// back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default, deserialize_with = "lenient_display")]
    pub display: Position,
    #[serde(default = "default_timezone_url", deserialize_with = "lenient_url")]
    pub timezone_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_ssid: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_password: Option<Value>,
}

fn default_timezone_url() -> String {
    DEFAULT_TIME_SERVICE_URL.to_string()
}

/// Accepts `42`, `42.0` and `"42"`.
fn display_from_value(raw: &Value) -> Option<Position> {
    let integral = |f: f64| (f.fract() == 0.0 && f.abs() < 1e15).then_some(f as i64);
    let minutes = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }?;
    Some(Position::new(minutes))
}

fn lenient_display<'de, D: Deserializer<'de>>(d: D) -> Result<Position, D::Error> {
    let raw = Value::deserialize(d)?;
    Ok(display_from_value(&raw).unwrap_or_else(|| {
        tracing::warn!(value = %raw, "unusable display position, assuming 12:00");
        Position::TWELVE
    }))
}

fn lenient_url<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(url) => Ok(url),
        other => {
            tracing::warn!(value = %other, "unusable timezone URL, using the default");
            Ok(default_timezone_url())
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            display: Position::TWELVE,
            timezone_url: default_timezone_url(),
            wifi_ssid: None,
            wifi_password: None,
        }
    }
}

/// Outcome of the most recent time-service refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStatus {
    pub succeeded: bool,
    /// When the attempt finished, by the clock's own reading.
    pub at: Option<OffsetDateTime>,
}

impl SyncStatus {
    /// Short human-readable form for status output.
    pub fn describe(&self) -> String {
        match (self.at, self.succeeded) {
            (None, _) => "never attempted".to_string(),
            (Some(at), ok) => {
                let when = at
                    .format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_else(|_| "unknown time".into());
                if ok {
                    format!("ok at {when}")
                } else {
                    format!("failed at {when}")
                }
            }
        }
    }
}
