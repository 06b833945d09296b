//! Domain entities consumed and produced by the scheduling engine.
//!
//! Courses, student groups, classrooms, and teachers are read-only input
//! snapshots; the engine's only output type is [`TimetableEntry`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::{ClassroomId, CourseId, EntryId, GroupId, TeacherId};
use crate::models::calendar::{AvailabilityCalendar, Weekday};
use crate::models::time::TimeOfDay;

/// Default lecture length in minutes.
pub const DEFAULT_COURSE_DURATION: u16 = 60;
/// Shortest admissible lecture length.
pub const MIN_COURSE_DURATION: u16 = 30;
/// Longest admissible lecture length.
pub const MAX_COURSE_DURATION: u16 = 180;

/// A course owing `frequency` weekly sessions to each assigned group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Session length in minutes, 30..=180.
    pub duration: u16,
    /// Sessions per week owed to each assigned student group.
    pub frequency: u32,
    pub teacher_id: TeacherId,
    pub student_group_ids: Vec<GroupId>,
    pub semester: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Course {
    pub fn new(id: impl Into<CourseId>, name: impl Into<String>, teacher_id: impl Into<TeacherId>) -> Self {
        Course {
            id: id.into(),
            name: name.into(),
            duration: DEFAULT_COURSE_DURATION,
            frequency: 1,
            teacher_id: teacher_id.into(),
            student_group_ids: Vec::new(),
            semester: String::new(),
            department: None,
            active: true,
        }
    }

    pub fn with_duration(mut self, duration: u16) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_group(mut self, group: impl Into<GroupId>) -> Self {
        self.student_group_ids.push(group.into());
        self
    }

    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = semester.into();
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }
}

/// A cohort of students attending classes together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentGroup {
    pub id: GroupId,
    pub name: String,
    pub size: u32,
    pub semester: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub calendar: AvailabilityCalendar,
}

impl StudentGroup {
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>, size: u32) -> Self {
        StudentGroup {
            id: id.into(),
            name: name.into(),
            size,
            semester: String::new(),
            department: None,
            active: true,
            calendar: AvailabilityCalendar::default(),
        }
    }

    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = semester.into();
        self
    }

    pub fn with_calendar(mut self, calendar: AvailabilityCalendar) -> Self {
        self.calendar = calendar;
        self
    }
}

/// A teaching room with a seat capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: ClassroomId,
    pub name: String,
    pub capacity: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub calendar: AvailabilityCalendar,
}

impl Classroom {
    pub fn new(id: impl Into<ClassroomId>, name: impl Into<String>, capacity: u32) -> Self {
        Classroom {
            id: id.into(),
            name: name.into(),
            capacity,
            active: true,
            calendar: AvailabilityCalendar::default(),
        }
    }

    pub fn with_calendar(mut self, calendar: AvailabilityCalendar) -> Self {
        self.calendar = calendar;
        self
    }
}

/// A faculty member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub calendar: AvailabilityCalendar,
}

impl Teacher {
    pub fn new(id: impl Into<TeacherId>, name: impl Into<String>) -> Self {
        Teacher {
            id: id.into(),
            name: name.into(),
            department: None,
            active: true,
            calendar: AvailabilityCalendar::default(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_calendar(mut self, calendar: AvailabilityCalendar) -> Self {
        self.calendar = calendar;
        self
    }
}

fn default_active() -> bool {
    true
}

/// Lifecycle state of a timetable entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Scheduled,
    Cancelled,
}

/// One scheduled teaching session.
///
/// `end_time` is always derived from `start_time + duration`; the
/// constructors keep the three fields consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: EntryId,
    pub course_id: CourseId,
    pub student_group_id: GroupId,
    pub teacher_id: TeacherId,
    pub classroom_id: ClassroomId,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    /// Session length in minutes.
    pub duration: u16,
    pub week_number: u32,
    pub semester: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: EntryStatus,
}

impl TimetableEntry {
    /// Build an entry with a fresh id, deriving `end_time` from
    /// `start_time + duration`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        course_id: CourseId,
        student_group_id: GroupId,
        teacher_id: TeacherId,
        classroom_id: ClassroomId,
        day: Weekday,
        start_time: TimeOfDay,
        duration: u16,
        semester: impl Into<String>,
        academic_year: impl Into<String>,
    ) -> Self {
        TimetableEntry {
            id: EntryId::generate(),
            course_id,
            student_group_id,
            teacher_id,
            classroom_id,
            day,
            start_time,
            end_time: start_time.plus_minutes(duration),
            duration,
            week_number: 1,
            semester: semester.into(),
            academic_year: academic_year.into(),
            notes: None,
            status: EntryStatus::Scheduled,
        }
    }

    /// Move the session, recomputing `end_time`.
    pub fn reschedule(&mut self, day: Weekday, start_time: TimeOfDay, duration: u16) {
        self.day = day;
        self.start_time = start_time;
        self.duration = duration;
        self.end_time = start_time.plus_minutes(duration);
    }
}

/// Side tables resolving identifiers to entity records.
///
/// The engine carries opaque identifiers everywhere; this directory is the
/// one place names and availability data are looked up; names feed only
/// conflict-message rendering.
#[derive(Debug, Clone, Default)]
pub struct EntityDirectory {
    courses: HashMap<CourseId, Course>,
    groups: HashMap<GroupId, StudentGroup>,
    classrooms: HashMap<ClassroomId, Classroom>,
    teachers: HashMap<TeacherId, Teacher>,
}

impl EntityDirectory {
    pub fn new(
        courses: impl IntoIterator<Item = Course>,
        groups: impl IntoIterator<Item = StudentGroup>,
        classrooms: impl IntoIterator<Item = Classroom>,
        teachers: impl IntoIterator<Item = Teacher>,
    ) -> Self {
        EntityDirectory {
            courses: courses.into_iter().map(|c| (c.id.clone(), c)).collect(),
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
            classrooms: classrooms.into_iter().map(|r| (r.id.clone(), r)).collect(),
            teachers: teachers.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.get(id)
    }

    pub fn group(&self, id: &GroupId) -> Option<&StudentGroup> {
        self.groups.get(id)
    }

    pub fn classroom(&self, id: &ClassroomId) -> Option<&Classroom> {
        self.classrooms.get(id)
    }

    pub fn teacher(&self, id: &TeacherId) -> Option<&Teacher> {
        self.teachers.get(id)
    }

    /// Resolved course name, falling back to the raw identifier.
    pub fn course_label<'a>(&'a self, id: &'a CourseId) -> &'a str {
        self.courses.get(id).map(|c| c.name.as_str()).unwrap_or(id.value())
    }

    pub fn group_label<'a>(&'a self, id: &'a GroupId) -> &'a str {
        self.groups.get(id).map(|g| g.name.as_str()).unwrap_or(id.value())
    }

    pub fn classroom_label<'a>(&'a self, id: &'a ClassroomId) -> &'a str {
        self.classrooms.get(id).map(|r| r.name.as_str()).unwrap_or(id.value())
    }

    pub fn teacher_label<'a>(&'a self, id: &'a TeacherId) -> &'a str {
        self.teachers.get(id).map(|t| t.name.as_str()).unwrap_or(id.value())
    }
}
