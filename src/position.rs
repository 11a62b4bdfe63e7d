//! Hand position on a 12-hour dial.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Number of minute steps in one revolution of the hour hand.
pub const MINUTES_PER_DIAL: u16 = 12 * 60;

/// Minutes since 12:00, always in `0..720`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u16")]
pub struct Position(u16);

impl Position {
    pub const TWELVE: Position = Position(0);

    /// Build a position from any minute count, wrapping around the dial.
    pub fn new(minutes: i64) -> Self {
        Self(minutes.rem_euclid(MINUTES_PER_DIAL as i64) as u16)
    }

    /// Position for a 24-hour wall time.
    pub fn from_hm(hours: u8, minutes: u8) -> Self {
        Self::new((hours as i64 % 12) * 60 + minutes as i64)
    }

    pub fn from_time(t: OffsetDateTime) -> Self {
        Self::from_hm(t.hour(), t.minute())
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Hour as shown on the dial, `1..=12`.
    pub fn hour(self) -> u8 {
        match (self.0 / 60) as u8 {
            0 => 12,
            h => h,
        }
    }

    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }

    pub fn advance(self, n: u32) -> Self {
        Self::new(self.0 as i64 + n as i64)
    }

    pub fn retreat(self, n: i32) -> Self {
        Self::new(self.0 as i64 - n as i64)
    }

    /// Forward steps needed to move from `self` to `target`.
    pub fn steps_to(self, target: Position) -> u16 {
        (target.0 + MINUTES_PER_DIAL - self.0) % MINUTES_PER_DIAL
    }

    /// Signed difference `target - self` folded into `-359..=360`,
    /// positive when `target` is ahead.
    pub fn signed_offset_to(self, target: Position) -> i32 {
        let d = self.steps_to(target) as i32;
        if d > (MINUTES_PER_DIAL / 2) as i32 {
            d - MINUTES_PER_DIAL as i32
        } else {
            d
        }
    }
}

impl From<i64> for Position {
    fn from(minutes: i64) -> Self {
        Position::new(minutes)
    }
}

impl From<Position> for u16 {
    fn from(p: Position) -> Self {
        p.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}
