//! Domain model: time arithmetic, calendars, and scheduling entities.

pub mod calendar;
pub mod entities;
pub mod time;

pub use calendar::{AvailabilityCalendar, TimeRange, Weekday};
pub use entities::{
    Classroom, Course, EntityDirectory, EntryStatus, StudentGroup, Teacher, TimetableEntry,
    DEFAULT_COURSE_DURATION, MAX_COURSE_DURATION, MIN_COURSE_DURATION,
};
pub use time::{overlaps, SlotGrid, TimeOfDay};
