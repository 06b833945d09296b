//! Conflict detection for candidate placements.
//!
//! Every generation and mutation path funnels through this module: the
//! greedy sweep, both graph colorings, the genetic fitness function, and
//! manual placement all ask the same kernel whether a candidate
//! `(course, group, classroom, teacher, day, interval)` is admissible.

pub mod counts;
pub mod kernel;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{ClassroomId, CourseId, GroupId, TeacherId};
use crate::models::{TimeOfDay, Weekday};

/// Structured classification of a conflict.
///
/// Consumers branch on the kind; the human-readable message exists only
/// for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    DuplicateCourse,
    DuplicateGroup,
    DuplicateClassroom,
    DuplicateTeacher,
    CapExceeded,
    NotAvailable,
}

impl ConflictKind {
    /// Uniqueness violations: two overlapping sessions share an entity.
    pub fn is_overlap(&self) -> bool {
        matches!(
            self,
            ConflictKind::DuplicateCourse
                | ConflictKind::DuplicateGroup
                | ConflictKind::DuplicateClassroom
                | ConflictKind::DuplicateTeacher
        )
    }

    /// Availability violations, penalized but not fatal to the optimizer.
    pub fn is_availability(&self) -> bool {
        matches!(self, ConflictKind::NotAvailable)
    }
}

/// One reason a candidate placement is inadmissible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub message: String,
}

impl Conflict {
    pub fn new(kind: ConflictKind, message: impl Into<String>) -> Self {
        Conflict {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn duplicate_course(name: &str) -> Self {
        Conflict::new(
            ConflictKind::DuplicateCourse,
            format!("Course {} already scheduled at this time", name),
        )
    }

    pub(crate) fn duplicate_group(name: &str) -> Self {
        Conflict::new(
            ConflictKind::DuplicateGroup,
            format!("Student group {} already has a class at this time", name),
        )
    }

    pub(crate) fn duplicate_classroom(name: &str) -> Self {
        Conflict::new(
            ConflictKind::DuplicateClassroom,
            format!("Classroom {} is already booked at this time", name),
        )
    }

    pub(crate) fn duplicate_teacher(name: &str) -> Self {
        Conflict::new(
            ConflictKind::DuplicateTeacher,
            format!("Teacher {} already has a class at this time", name),
        )
    }

    pub(crate) fn cap_exceeded(entity: &str, name: &str, cap: u32) -> Self {
        Conflict::new(
            ConflictKind::CapExceeded,
            format!(
                "{} {} has reached the maximum daily lectures ({})",
                entity, name, cap
            ),
        )
    }

    pub(crate) fn not_available(entity: &str, name: &str) -> Self {
        Conflict::new(
            ConflictKind::NotAvailable,
            format!("{} {} is not available at this time", entity, name),
        )
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A candidate placement handed to the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub course_id: CourseId,
    pub student_group_id: GroupId,
    pub teacher_id: TeacherId,
    pub classroom_id: ClassroomId,
    pub day: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Placement {
    /// Build a placement, deriving `end` from `start + duration`.
    pub fn new(
        course_id: CourseId,
        student_group_id: GroupId,
        teacher_id: TeacherId,
        classroom_id: ClassroomId,
        day: Weekday,
        start: TimeOfDay,
        duration: u16,
    ) -> Self {
        Placement {
            course_id,
            student_group_id,
            teacher_id,
            classroom_id,
            day,
            start,
            end: start.plus_minutes(duration),
        }
    }
}

pub use kernel::{check_conflicts, conflicts_for};
