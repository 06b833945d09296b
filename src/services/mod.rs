//! High-level scheduling services: the three generators, the algorithm
//! comparator, and manual timetable operations.

pub mod compare;
pub mod genetic;
pub mod graph;
pub mod greedy;
pub mod timetable;

use crate::api::{CourseId, GroupId, TeacherId};
use crate::db::{RepositoryResult, TimetableRepository};
use crate::models::{Classroom, Course, EntityDirectory};

/// Entity snapshot a generation run works against.
///
/// Loaded once per request; the run owns it and sees a consistent view
/// regardless of concurrent writers.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub courses: Vec<Course>,
    pub classrooms: Vec<Classroom>,
    pub directory: EntityDirectory,
}

/// Load the working set for a semester/department and index it.
///
/// Groups referenced by a course but missing from the filtered group list
/// are resolved individually so capacity checks still work across
/// department boundaries.
pub(crate) async fn load_snapshot(
    repo: &dyn TimetableRepository,
    semester: &str,
    department: Option<&str>,
) -> RepositoryResult<Snapshot> {
    let courses = repo.find_courses(semester, department).await?;
    let classrooms = repo.find_classrooms().await?;
    let mut groups = repo.find_student_groups(semester, department).await?;
    let teachers = repo.find_faculty(None).await?;

    for course in &courses {
        for group_id in &course.student_group_ids {
            if !groups.iter().any(|g| &g.id == group_id) {
                if let Some(group) = repo.find_student_group(group_id).await? {
                    groups.push(group);
                }
            }
        }
    }

    let directory = EntityDirectory::new(
        courses.iter().cloned(),
        groups,
        classrooms.iter().cloned(),
        teachers,
    );

    Ok(Snapshot {
        courses,
        classrooms,
        directory,
    })
}

/// One weekly session owed by a course to a group.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SessionDemand {
    pub course_id: CourseId,
    pub group_id: GroupId,
    pub teacher_id: TeacherId,
    pub duration: u16,
    /// Seats the session needs; `None` when the group is unknown.
    pub required_capacity: Option<u32>,
    pub session_index: u32,
}

/// Expand courses into per-session demands, in course/group/session order.
pub(crate) fn session_demands(
    courses: &[Course],
    directory: &EntityDirectory,
) -> Vec<SessionDemand> {
    let mut demands = Vec::new();
    for course in courses {
        for group_id in &course.student_group_ids {
            let required_capacity = directory.group(group_id).map(|g| g.size);
            for session_index in 0..course.frequency {
                demands.push(SessionDemand {
                    course_id: course.id.clone(),
                    group_id: group_id.clone(),
                    teacher_id: course.teacher_id.clone(),
                    duration: course.duration,
                    required_capacity,
                    session_index,
                });
            }
        }
    }
    demands
}
