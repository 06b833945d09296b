//! Minute-precision clock times and teaching-slot generation.
//!
//! All scheduling arithmetic happens on minutes since midnight; the
//! "HH:MM" encoding only appears at the parse/format boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A clock time with minute precision on a 24-hour day.
///
/// Stored as minutes since midnight, which makes interval arithmetic and
/// comparisons trivial. Serializes as the zero-padded "HH:MM" string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Build from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Self {
        TimeOfDay(minutes)
    }

    /// Build from an hour/minute pair.
    pub fn new(hour: u16, minute: u16) -> Self {
        TimeOfDay(hour * 60 + minute)
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u16 {
        self.0
    }

    /// The time `duration` minutes later, carrying into hours as needed.
    ///
    /// Callers supply durations that fit the working window; no wrap past
    /// 23:59 is performed.
    pub fn plus_minutes(&self, duration: u16) -> Self {
        TimeOfDay(self.0 + duration)
    }

    /// Minutes elapsed since `earlier`.
    pub fn minutes_since(&self, earlier: TimeOfDay) -> u16 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| format!("invalid time '{}': expected HH:MM", s))?;
        Ok(TimeOfDay::new(t.hour() as u16, t.minute() as u16))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Half-open interval overlap test: `[a_start, a_end)` vs `[b_start, b_end)`.
///
/// Touching boundaries (one interval ending where the other starts) do not
/// overlap.
pub fn overlaps(
    a_start: TimeOfDay,
    a_end: TimeOfDay,
    b_start: TimeOfDay,
    b_end: TimeOfDay,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// The grid of candidate start times inside the working window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    /// First admissible start time.
    pub start: TimeOfDay,
    /// End of the working window; sessions must finish by this time.
    pub end: TimeOfDay,
    /// Minutes between consecutive candidate start times.
    pub step: u16,
}

impl SlotGrid {
    pub fn new(start: TimeOfDay, end: TimeOfDay, step: u16) -> Self {
        SlotGrid { start, end, step }
    }

    /// Candidate start times for a session of `duration` minutes.
    ///
    /// Returns every `t` with `start <= t` and `t + duration <= end`,
    /// stepping by `step`, in ascending order.
    pub fn slots(&self, duration: u16) -> Vec<TimeOfDay> {
        let mut out = Vec::new();
        if self.step == 0 {
            return out;
        }
        let mut t = self.start;
        while t.minutes() + duration <= self.end.minutes() {
            out.push(t);
            t = t.plus_minutes(self.step);
        }
        out
    }

    /// Candidate start times where the session length equals the step.
    pub fn base_slots(&self) -> Vec<TimeOfDay> {
        self.slots(self.step)
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        SlotGrid {
            start: TimeOfDay::new(9, 0),
            end: TimeOfDay::new(17, 0),
            step: 60,
        }
    }
}
