//! The conflict-detection kernel.
//!
//! [`conflicts_for`] is pure: it judges a candidate against an in-memory
//! same-day slate. [`check_conflicts`] additionally pulls the persisted
//! same-day entries from the repository, which is the kernel's only I/O.

use super::counts::daily_cap_conflicts;
use super::{Conflict, Placement};
use crate::config::DailyCaps;
use crate::db::{IdentifierFilter, RepositoryResult, TimetableRepository};
use crate::models::{overlaps, EntityDirectory, TimetableEntry};

/// Conflicts between a candidate placement and a same-day slate.
///
/// `same_day` must contain only entries on `placement.day` (persisted and
/// pending alike). Message order is stable: daily caps first, then one
/// message per matching identifier of each overlapping entry (course,
/// group, classroom, teacher), then availability findings.
pub fn conflicts_for(
    placement: &Placement,
    same_day: &[&TimetableEntry],
    directory: &EntityDirectory,
    caps: &DailyCaps,
) -> Vec<Conflict> {
    let mut conflicts = daily_cap_conflicts(placement, same_day, directory, caps);

    for entry in same_day {
        if !overlaps(placement.start, placement.end, entry.start_time, entry.end_time) {
            continue;
        }
        if entry.course_id == placement.course_id {
            conflicts.push(Conflict::duplicate_course(
                directory.course_label(&placement.course_id),
            ));
        }
        if entry.student_group_id == placement.student_group_id {
            conflicts.push(Conflict::duplicate_group(
                directory.group_label(&placement.student_group_id),
            ));
        }
        if entry.classroom_id == placement.classroom_id {
            conflicts.push(Conflict::duplicate_classroom(
                directory.classroom_label(&placement.classroom_id),
            ));
        }
        if entry.teacher_id == placement.teacher_id {
            conflicts.push(Conflict::duplicate_teacher(
                directory.teacher_label(&placement.teacher_id),
            ));
        }
    }

    if let Some(teacher) = directory.teacher(&placement.teacher_id) {
        if !teacher
            .calendar
            .permits(placement.day, placement.start, placement.end)
        {
            conflicts.push(Conflict::not_available("Teacher", &teacher.name));
        }
    }
    if let Some(classroom) = directory.classroom(&placement.classroom_id) {
        if !classroom
            .calendar
            .permits(placement.day, placement.start, placement.end)
        {
            conflicts.push(Conflict::not_available("Classroom", &classroom.name));
        }
    }
    if let Some(group) = directory.group(&placement.student_group_id) {
        if !group
            .calendar
            .permits(placement.day, placement.start, placement.end)
        {
            conflicts.push(Conflict::not_available("Student group", &group.name));
        }
    }

    conflicts
}

/// Conflicts for a candidate against persisted entries and a pending set.
///
/// Persisted entries on the candidate's day matching any of the four
/// identifiers are fetched (minus `exclude`), the pending set is
/// restricted to the same day, and the pure kernel runs over the union.
/// An empty result means the placement is admissible.
pub async fn check_conflicts(
    repo: &dyn TimetableRepository,
    placement: &Placement,
    exclude: Option<&crate::api::EntryId>,
    pending: &[TimetableEntry],
    directory: &EntityDirectory,
    caps: &DailyCaps,
) -> RepositoryResult<Vec<Conflict>> {
    let filter = IdentifierFilter {
        course_id: Some(placement.course_id.clone()),
        student_group_id: Some(placement.student_group_id.clone()),
        teacher_id: Some(placement.teacher_id.clone()),
        classroom_id: Some(placement.classroom_id.clone()),
    };
    let persisted = repo
        .find_day_entries(placement.day, &filter, exclude)
        .await?;

    let same_day: Vec<&TimetableEntry> = persisted
        .iter()
        .chain(pending.iter().filter(|e| e.day == placement.day))
        .collect();

    Ok(conflicts_for(placement, &same_day, directory, caps))
}
