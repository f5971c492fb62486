//! Weekday and time-of-day parsing for availability windows.
//!
//! Slots are weekly recurring, so a window is (weekday, HH:MM, HH:MM)
//! rather than a concrete datetime. Times are kept zero-padded 24h "HH:MM"
//! strings in storage; text ordering then matches time ordering, which the
//! schema's `end_at > start_at` check relies on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

/// One of the seven weekday codes a recurring slot can fall on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }
}

impl FromStr for Weekday {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mon" => Ok(Weekday::Mon),
            "tue" => Ok(Weekday::Tue),
            "wed" => Ok(Weekday::Wed),
            "thu" => Ok(Weekday::Thu),
            "fri" => Ok(Weekday::Fri),
            "sat" => Ok(Weekday::Sat),
            "sun" => Ok(Weekday::Sun),
            other => Err(BookingError::Validation(format!(
                "Invalid weekday '{}'. Expected one of mon,tue,wed,thu,fri,sat,sun",
                other
            ))),
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wall-clock minute of the day, parsed from zero-padded "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> BookingResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(BookingError::Validation(format!(
                "Time {:02}:{:02} is out of range",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl FromStr for TimeOfDay {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || {
            BookingError::Validation(format!(
                "Invalid time '{}'. Expected zero-padded 24h HH:MM",
                s
            ))
        };

        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(malformed());
        }

        let hour: u8 = s[0..2].parse().map_err(|_| malformed())?;
        let minute: u8 = s[3..5].parse().map_err(|_| malformed())?;

        TimeOfDay::new(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A validated availability window: weekday, half-open [start, end) range
/// and the number of concurrent reservations it admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub day: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub capacity: i32,
}

impl Window {
    pub fn new(day: Weekday, start: TimeOfDay, end: TimeOfDay, capacity: i32) -> BookingResult<Self> {
        if end <= start {
            return Err(BookingError::Validation(format!(
                "Window {} {}-{} must end after it starts",
                day, start, end
            )));
        }
        if capacity < 1 {
            return Err(BookingError::Validation(format!(
                "Window {} {}-{} capacity must be at least 1, got {}",
                day, start, end, capacity
            )));
        }
        Ok(Self { day, start, end, capacity })
    }

    fn overlaps(&self, other: &Window) -> bool {
        self.day == other.day && self.start < other.end && other.start < self.end
    }
}

/// Parses raw (day, start, end) strings into a key tuple, rejecting
/// malformed input before any storage lookup happens.
pub fn parse_slot_key(day: &str, start: &str, end: &str) -> BookingResult<(Weekday, TimeOfDay, TimeOfDay)> {
    let day: Weekday = day.parse()?;
    let start: TimeOfDay = start.parse()?;
    let end: TimeOfDay = end.parse()?;
    if end <= start {
        return Err(BookingError::Validation(format!(
            "Slot {} {}-{} must end after it starts",
            day, start, end
        )));
    }
    Ok((day, start, end))
}

/// Rejects a window set in which any two windows on the same day overlap.
/// Quadratic, but a teacher publishes at most a few dozen windows a week.
pub fn check_no_overlap(windows: &[Window]) -> BookingResult<()> {
    for (i, a) in windows.iter().enumerate() {
        for b in &windows[i + 1..] {
            if a.overlaps(b) {
                return Err(BookingError::Validation(format!(
                    "Windows {} {}-{} and {} {}-{} overlap",
                    a.day, a.start, a.end, b.day, b.start, b.end
                )));
            }
        }
    }
    Ok(())
}
