//! Per-day lecture-count constraints.

use super::{Conflict, Placement};
use crate::config::DailyCaps;
use crate::models::{EntityDirectory, TimetableEntry};

/// Cap conflicts for a candidate joining a same-day slate of entries.
///
/// `same_day` must already be restricted to the candidate's day; counts
/// include the candidate itself.
pub fn daily_cap_conflicts(
    placement: &Placement,
    same_day: &[&TimetableEntry],
    directory: &EntityDirectory,
    caps: &DailyCaps,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    let teacher_count = 1 + same_day
        .iter()
        .filter(|e| e.teacher_id == placement.teacher_id)
        .count() as u32;
    if teacher_count > caps.teacher {
        conflicts.push(Conflict::cap_exceeded(
            "Teacher",
            directory.teacher_label(&placement.teacher_id),
            caps.teacher,
        ));
    }

    let group_count = 1 + same_day
        .iter()
        .filter(|e| e.student_group_id == placement.student_group_id)
        .count() as u32;
    if group_count > caps.group {
        conflicts.push(Conflict::cap_exceeded(
            "Student group",
            directory.group_label(&placement.student_group_id),
            caps.group,
        ));
    }

    let classroom_count = 1 + same_day
        .iter()
        .filter(|e| e.classroom_id == placement.classroom_id)
        .count() as u32;
    if classroom_count > caps.classroom {
        conflicts.push(Conflict::cap_exceeded(
            "Classroom",
            directory.classroom_label(&placement.classroom_id),
            caps.classroom,
        ));
    }

    conflicts
}
