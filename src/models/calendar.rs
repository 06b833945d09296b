//! Teaching days and per-entity availability calendars.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::time::{overlaps, TimeOfDay};

/// Teaching days, Monday through Saturday.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// All teaching days in sweep order.
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" => Ok(Weekday::Monday),
            "tuesday" => Ok(Weekday::Tuesday),
            "wednesday" => Ok(Weekday::Wednesday),
            "thursday" => Ok(Weekday::Thursday),
            "friday" => Ok(Weekday::Friday),
            "saturday" => Ok(Weekday::Saturday),
            other => Err(format!("unknown weekday '{}'", other)),
        }
    }
}

/// A half-open `[start, end)` time interval within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        TimeRange { start, end }
    }

    /// True when this range fully contains `[start, end)`.
    pub fn contains(&self, start: TimeOfDay, end: TimeOfDay) -> bool {
        start >= self.start && end <= self.end
    }

    /// True when this range overlaps `[start, end)`.
    pub fn intersects(&self, start: TimeOfDay, end: TimeOfDay) -> bool {
        overlaps(self.start, self.end, start, end)
    }
}

/// Weekly availability windows and blackout periods for one entity.
///
/// An empty calendar places no restriction. Once availability windows are
/// declared for any day, a day without a record is fully unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityCalendar {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub availability: BTreeMap<Weekday, Vec<TimeRange>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub blackouts: BTreeMap<Weekday, Vec<TimeRange>>,
}

impl AvailabilityCalendar {
    /// Calendar with no windows and no blackouts (unconstrained).
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// Add an availability window for `day`.
    pub fn with_window(mut self, day: Weekday, start: TimeOfDay, end: TimeOfDay) -> Self {
        self.availability
            .entry(day)
            .or_default()
            .push(TimeRange::new(start, end));
        self
    }

    /// Add a blackout period for `day`.
    pub fn with_blackout(mut self, day: Weekday, start: TimeOfDay, end: TimeOfDay) -> Self {
        self.blackouts
            .entry(day)
            .or_default()
            .push(TimeRange::new(start, end));
        self
    }

    /// Whether `[start, end)` on `day` is admissible for this entity.
    ///
    /// Blackouts veto any overlapping interval. When availability windows
    /// are declared, the interval must sit fully inside one of the day's
    /// windows; a declared calendar with no record for `day` means the
    /// entity is unavailable that day.
    pub fn permits(&self, day: Weekday, start: TimeOfDay, end: TimeOfDay) -> bool {
        if let Some(blocked) = self.blackouts.get(&day) {
            if blocked.iter().any(|r| r.intersects(start, end)) {
                return false;
            }
        }

        if !self.availability.is_empty() {
            return match self.availability.get(&day) {
                Some(windows) => windows.iter().any(|r| r.contains(start, end)),
                None => false,
            };
        }

        true
    }
}
