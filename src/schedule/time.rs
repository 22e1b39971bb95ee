use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 24 * 60;
pub const HOURS_PER_DAY: f64 = 24.0;

/// Time of day in whole minutes since midnight.
///
/// `24:00` is kept as its own value (1440) so an interval can end at the
/// close of the day and still sort after everything else. It draws at the
/// same angle as `00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeValue(u16);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time {input:?}: expected HH:MM between 00:00 and 23:59, or 24:00")]
pub struct TimeParseError {
    pub input: String,
}

impl TimeValue {
    pub const MIDNIGHT: TimeValue = TimeValue(0);
    pub const END_OF_DAY: TimeValue = TimeValue(MINUTES_PER_DAY);

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour == 24 && minute == 0 {
            return Some(Self::END_OF_DAY);
        }
        (hour < 24 && minute < 60).then(|| TimeValue(hour * 60 + minute))
    }

    pub fn parse(text: &str) -> Result<Self, TimeParseError> {
        let err = || TimeParseError {
            input: text.to_string(),
        };
        let s = text.trim();
        let (h, m) = s.split_once(':').ok_or_else(err)?;
        if h.len() != 2 || m.len() != 2 || !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let hour: u16 = h.parse().map_err(|_| err())?;
        let minute: u16 = m.parse().map_err(|_| err())?;
        Self::from_hm(hour, minute).ok_or_else(err)
    }

    /// Nearest whole minute, clamped to the day.
    pub fn from_fractional_hours(hours: f64) -> Self {
        let minutes = (hours * 60.0).round().clamp(0.0, MINUTES_PER_DAY as f64);
        TimeValue(minutes as u16)
    }

    pub fn to_fractional_hours(self) -> f64 {
        self.0 as f64 / 60.0
    }

    pub fn is_end_of_day(self) -> bool {
        self.0 == MINUTES_PER_DAY
    }

    /// Label for people: the end-of-day sentinel reads as `00:00`.
    pub fn display_label(self) -> String {
        if self.is_end_of_day() {
            "00:00".to_string()
        } else {
            self.to_string()
        }
    }

    pub fn step(self, minutes: i32) -> Self {
        let next = (self.0 as i32 + minutes).clamp(0, MINUTES_PER_DAY as i32);
        TimeValue(next as u16)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeValue {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
