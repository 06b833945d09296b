//! Engine configuration loaded from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

use crate::models::{SlotGrid, TimeOfDay};

/// Per-day lecture caps per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCaps {
    pub teacher: u32,
    pub group: u32,
    pub classroom: u32,
}

impl Default for DailyCaps {
    fn default() -> Self {
        DailyCaps {
            teacher: 4,
            group: 5,
            classroom: 6,
        }
    }
}

/// Engine configuration: working window, slot step, daily caps, debug flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub grid: SlotGrid,
    pub caps: DailyCaps,
    /// Emit per-session diagnostic reasons for unscheduled sessions.
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            grid: SlotGrid::default(),
            caps: DailyCaps::default(),
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `TIMETABLE_START` (optional, default: 09:00): first slot start
    /// - `TIMETABLE_END` (optional, default: 17:00): working-window end
    /// - `TIMETABLE_STEP` (optional, default: 60): slot step in minutes
    /// - `TIMETABLE_DEBUG` (optional, default: false): diagnostic output
    /// - `MAX_TEACHER_DAILY_LECTURES` (optional, default: 4)
    /// - `MAX_GROUP_DAILY_LECTURES` (optional, default: 5)
    /// - `MAX_CLASSROOM_DAILY_LECTURES` (optional, default: 6)
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, String> {
        let defaults = EngineConfig::default();

        let start = read_time("TIMETABLE_START", defaults.grid.start)?;
        let end = read_time("TIMETABLE_END", defaults.grid.end)?;
        let step = read_number("TIMETABLE_STEP", defaults.grid.step)?;
        if start >= end {
            return Err(format!(
                "TIMETABLE_START ({}) must be before TIMETABLE_END ({})",
                start, end
            ));
        }
        if step == 0 {
            return Err("TIMETABLE_STEP must be a positive number of minutes".to_string());
        }

        let debug = match env::var("TIMETABLE_DEBUG") {
            Ok(raw) => matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            Err(_) => defaults.debug,
        };

        Ok(EngineConfig {
            grid: SlotGrid::new(start, end, step),
            caps: DailyCaps {
                teacher: read_number("MAX_TEACHER_DAILY_LECTURES", defaults.caps.teacher)?,
                group: read_number("MAX_GROUP_DAILY_LECTURES", defaults.caps.group)?,
                classroom: read_number("MAX_CLASSROOM_DAILY_LECTURES", defaults.caps.classroom)?,
            },
            debug,
        })
    }

    pub fn with_grid(mut self, grid: SlotGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_caps(mut self, caps: DailyCaps) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

fn read_time(key: &str, default: TimeOfDay) -> Result<TimeOfDay, String> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| format!("{}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

fn read_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| format!("{} must be a number, got '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.grid.start.to_string(), "09:00");
        assert_eq!(config.grid.end.to_string(), "17:00");
        assert_eq!(config.grid.step, 60);
        assert_eq!(config.caps.teacher, 4);
        assert_eq!(config.caps.group, 5);
        assert_eq!(config.caps.classroom, 6);
        assert!(!config.debug);
    }

    #[test]
    fn test_builder_overrides() {
        let config = EngineConfig::default()
            .with_caps(DailyCaps {
                teacher: 2,
                group: 3,
                classroom: 4,
            })
            .with_debug(true);
        assert_eq!(config.caps.teacher, 2);
        assert!(config.debug);
    }
}
