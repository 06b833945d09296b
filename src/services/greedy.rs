//! Deterministic first-fit timetable generation.
//!
//! Sweeps course → group → session → day → start time → classroom in
//! fixed order and accepts the first placement the conflict kernel
//! admits. Re-running on identical inputs yields an identical schedule.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::load_snapshot;
use crate::api::{CourseId, GroupId};
use crate::config::EngineConfig;
use crate::conflict::{check_conflicts, Placement};
use crate::db::TimetableRepository;
use crate::error::EngineResult;
use crate::models::{TimetableEntry, Weekday};

/// Parameters for a greedy generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreedyRequest {
    pub semester: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Attach per-session failure reasons to the outcome.
    #[serde(default)]
    pub debug: bool,
}

/// A session no generator could place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledSession {
    pub course_id: CourseId,
    pub student_group_id: GroupId,
    /// Zero-based index within the course's weekly frequency.
    pub session: u32,
    /// Diagnostic reasons; populated only when debug output is requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

/// Result of a greedy generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreedyOutcome {
    pub entries: Vec<TimetableEntry>,
    pub scheduled: usize,
    pub unscheduled: Vec<UnscheduledSession>,
}

/// Generate a timetable with the first-fit sweep.
///
/// Placement failures are data, not errors: sessions that fit nowhere are
/// reported in `unscheduled` and the run continues.
pub async fn generate_greedy(
    repo: &dyn TimetableRepository,
    config: &EngineConfig,
    request: &GreedyRequest,
) -> EngineResult<GreedyOutcome> {
    let snapshot = load_snapshot(repo, &request.semester, request.department.as_deref()).await?;
    let debug_requested = request.debug || config.debug;
    info!(
        semester = %request.semester,
        courses = snapshot.courses.len(),
        classrooms = snapshot.classrooms.len(),
        "starting greedy generation"
    );

    let mut pending: Vec<TimetableEntry> = Vec::new();
    let mut unscheduled = Vec::new();

    for course in &snapshot.courses {
        let slots = config.grid.slots(course.duration);
        for group_id in &course.student_group_ids {
            let group_size = snapshot.directory.group(group_id).map(|g| g.size);

            for session in 0..course.frequency {
                let mut placed = false;
                let mut last_conflicts: Vec<String> = Vec::new();

                if let Some(size) = group_size {
                    'search: for day in Weekday::ALL {
                        for &start in &slots {
                            for classroom in
                                snapshot.classrooms.iter().filter(|r| r.capacity >= size)
                            {
                                let placement = Placement::new(
                                    course.id.clone(),
                                    group_id.clone(),
                                    course.teacher_id.clone(),
                                    classroom.id.clone(),
                                    day,
                                    start,
                                    course.duration,
                                );
                                let conflicts = check_conflicts(
                                    repo,
                                    &placement,
                                    None,
                                    &pending,
                                    &snapshot.directory,
                                    &config.caps,
                                )
                                .await?;

                                if conflicts.is_empty() {
                                    pending.push(TimetableEntry::new(
                                        course.id.clone(),
                                        group_id.clone(),
                                        course.teacher_id.clone(),
                                        classroom.id.clone(),
                                        day,
                                        start,
                                        course.duration,
                                        request.semester.clone(),
                                        request.academic_year.clone(),
                                    ));
                                    placed = true;
                                    break 'search;
                                }
                                last_conflicts =
                                    conflicts.into_iter().map(|c| c.message).collect();
                            }
                        }
                    }
                } else {
                    last_conflicts = vec![format!("Student group {} not found", group_id)];
                }

                if !placed {
                    debug!(
                        course = %course.id,
                        group = %group_id,
                        session,
                        "no admissible slot found"
                    );
                    unscheduled.push(UnscheduledSession {
                        course_id: course.id.clone(),
                        student_group_id: group_id.clone(),
                        session,
                        reasons: if debug_requested {
                            last_conflicts
                        } else {
                            Vec::new()
                        },
                    });
                }
            }
        }
    }

    info!(
        scheduled = pending.len(),
        unscheduled = unscheduled.len(),
        "greedy generation finished"
    );
    Ok(GreedyOutcome {
        scheduled: pending.len(),
        entries: pending,
        unscheduled,
    })
}
