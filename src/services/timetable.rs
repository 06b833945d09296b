//! Manual timetable operations: placement, listing, update, delete, and
//! bulk save of generated schedules.
//!
//! Role scoping lives here rather than in any transport layer: faculty
//! see their own entries, students their groups' entries, admins
//! everything. Mutations require the admin role.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ClassroomId, CourseId, EntryId, GroupId, TeacherId};
use crate::config::EngineConfig;
use crate::conflict::{check_conflicts, Placement};
use crate::db::{EntryQuery, RepositoryError, TimetableRepository};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    EntityDirectory, EntryStatus, TimeOfDay, TimetableEntry, Weekday, MAX_COURSE_DURATION,
    MIN_COURSE_DURATION,
};

/// The caller's identity as seen by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "role", content = "scope")]
pub enum Requester {
    Admin,
    /// A faculty member; sees only their own entries.
    Faculty(TeacherId),
    /// A student; sees only entries of the groups they belong to.
    Student(Vec<GroupId>),
}

impl Requester {
    fn require_admin(&self, operation: &str) -> EngineResult<()> {
        match self {
            Requester::Admin => Ok(()),
            _ => Err(EngineError::authorization(format!(
                "{} requires the admin role",
                operation
            ))),
        }
    }
}

/// Input for a manual placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub course_id: CourseId,
    pub student_group_id: GroupId,
    pub classroom_id: ClassroomId,
    /// Defaults to the course's teacher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<TeacherId>,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    /// Defaults to the course's duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u16>,
    pub semester: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Whitelisted fields for updating an existing entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classroom_id: Option<ClassroomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
}

impl EntryPatch {
    /// Whether the patch moves the session in space or time.
    fn moves_placement(&self, entry: &TimetableEntry) -> bool {
        self.day.is_some_and(|d| d != entry.day)
            || self.start_time.is_some_and(|s| s != entry.start_time)
            || self.duration.is_some_and(|d| d != entry.duration)
            || self
                .classroom_id
                .as_ref()
                .is_some_and(|c| c != &entry.classroom_id)
    }
}

fn validate_duration(duration: u16) -> EngineResult<()> {
    if !(MIN_COURSE_DURATION..=MAX_COURSE_DURATION).contains(&duration) {
        return Err(EngineError::validation(format!(
            "duration must lie in {}..={} minutes, got {}",
            MIN_COURSE_DURATION, MAX_COURSE_DURATION, duration
        )));
    }
    Ok(())
}

/// Validate a manual placement, run the kernel, and persist it when
/// admissible.
pub async fn place_entry(
    repo: &dyn TimetableRepository,
    config: &EngineConfig,
    requester: &Requester,
    draft: EntryDraft,
) -> EngineResult<TimetableEntry> {
    requester.require_admin("creating a timetable entry")?;

    let course = repo
        .find_course(&draft.course_id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("course {}", draft.course_id)))?;
    let group = repo
        .find_student_group(&draft.student_group_id)
        .await?
        .ok_or_else(|| {
            EngineError::not_found(format!("student group {}", draft.student_group_id))
        })?;
    let classroom = repo
        .find_classroom(&draft.classroom_id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("classroom {}", draft.classroom_id)))?;
    let teacher_id = draft.teacher_id.unwrap_or_else(|| course.teacher_id.clone());
    let teacher = repo
        .find_teacher(&teacher_id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("teacher {}", teacher_id)))?;

    let duration = draft.duration.unwrap_or(course.duration);
    validate_duration(duration)?;
    if classroom.capacity < group.size {
        return Err(EngineError::validation(format!(
            "classroom {} seats {} but group {} has {} students",
            classroom.name, classroom.capacity, group.name, group.size
        )));
    }

    let placement = Placement::new(
        draft.course_id.clone(),
        draft.student_group_id.clone(),
        teacher_id.clone(),
        draft.classroom_id.clone(),
        draft.day,
        draft.start_time,
        duration,
    );
    let directory = EntityDirectory::new([course], [group], [classroom], [teacher]);
    let conflicts = check_conflicts(repo, &placement, None, &[], &directory, &config.caps).await?;
    if !conflicts.is_empty() {
        return Err(EngineError::conflict(conflicts));
    }

    let mut entry = TimetableEntry::new(
        draft.course_id,
        draft.student_group_id,
        teacher_id,
        draft.classroom_id,
        draft.day,
        draft.start_time,
        duration,
        draft.semester,
        draft.academic_year,
    );
    if let Some(week) = draft.week_number {
        entry.week_number = week;
    }
    entry.notes = draft.notes;

    repo.insert_entry(entry.clone()).await?;
    info!(entry = %entry.id, course = %entry.course_id, "timetable entry created");
    Ok(entry)
}

/// Role-scoped timetable listing.
///
/// Faculty asking for another teacher's entries and students asking for a
/// group they do not belong to receive an empty list, not an error.
pub async fn list_entries(
    repo: &dyn TimetableRepository,
    requester: &Requester,
    query: &EntryQuery,
) -> EngineResult<Vec<TimetableEntry>> {
    match requester {
        Requester::Admin => Ok(repo.query_entries(query).await?),
        Requester::Faculty(teacher_id) => {
            if query
                .teacher_id
                .as_ref()
                .is_some_and(|wanted| wanted != teacher_id)
            {
                return Ok(Vec::new());
            }
            let mut scoped = query.clone();
            scoped.teacher_id = Some(teacher_id.clone());
            Ok(repo.query_entries(&scoped).await?)
        }
        Requester::Student(memberships) => {
            if let Some(wanted) = &query.student_group_id {
                if !memberships.contains(wanted) {
                    return Ok(Vec::new());
                }
                return Ok(repo.query_entries(query).await?);
            }
            let mut entries = repo.query_entries(query).await?;
            entries.retain(|e| memberships.contains(&e.student_group_id));
            Ok(entries)
        }
    }
}

/// Apply a whitelisted patch; placements that move re-run the kernel
/// excluding the entry itself.
pub async fn update_entry(
    repo: &dyn TimetableRepository,
    config: &EngineConfig,
    requester: &Requester,
    id: &EntryId,
    patch: EntryPatch,
) -> EngineResult<TimetableEntry> {
    requester.require_admin("updating a timetable entry")?;

    let mut entry = repo
        .find_entry(id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("timetable entry {}", id)))?;

    let day = patch.day.unwrap_or(entry.day);
    let start_time = patch.start_time.unwrap_or(entry.start_time);
    let duration = patch.duration.unwrap_or(entry.duration);
    validate_duration(duration)?;
    let classroom_id = patch
        .classroom_id
        .clone()
        .unwrap_or_else(|| entry.classroom_id.clone());

    if patch.moves_placement(&entry) {
        let classroom = repo
            .find_classroom(&classroom_id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("classroom {}", classroom_id)))?;
        let group = repo.find_student_group(&entry.student_group_id).await?;
        if let Some(group) = &group {
            if classroom.capacity < group.size {
                return Err(EngineError::validation(format!(
                    "classroom {} seats {} but group {} has {} students",
                    classroom.name, classroom.capacity, group.name, group.size
                )));
            }
        }

        let placement = Placement::new(
            entry.course_id.clone(),
            entry.student_group_id.clone(),
            entry.teacher_id.clone(),
            classroom_id.clone(),
            day,
            start_time,
            duration,
        );
        let course = repo.find_course(&entry.course_id).await?;
        let teacher = repo.find_teacher(&entry.teacher_id).await?;
        let directory = EntityDirectory::new(course, group, [classroom], teacher);
        let conflicts =
            check_conflicts(repo, &placement, Some(id), &[], &directory, &config.caps).await?;
        if !conflicts.is_empty() {
            return Err(EngineError::conflict(conflicts));
        }
    }

    entry.reschedule(day, start_time, duration);
    entry.classroom_id = classroom_id;
    if let Some(notes) = patch.notes {
        entry.notes = Some(notes);
    }
    if let Some(status) = patch.status {
        entry.status = status;
    }

    repo.update_entry(entry.clone()).await?;
    info!(entry = %entry.id, "timetable entry updated");
    Ok(entry)
}

/// Remove an entry.
pub async fn delete_entry(
    repo: &dyn TimetableRepository,
    requester: &Requester,
    id: &EntryId,
) -> EngineResult<()> {
    requester.require_admin("deleting a timetable entry")?;
    match repo.delete_entry(id).await {
        Ok(()) => {
            info!(entry = %id, "timetable entry deleted");
            Ok(())
        }
        Err(RepositoryError::NotFound(msg)) => Err(EngineError::not_found(msg)),
        Err(other) => Err(other.into()),
    }
}

/// Bulk-insert a generated schedule verbatim.
///
/// No conflict re-check happens here; this path is meant for schedules
/// the engine itself just produced.
pub async fn save_schedule(
    repo: &dyn TimetableRepository,
    requester: &Requester,
    entries: Vec<TimetableEntry>,
) -> EngineResult<usize> {
    requester.require_admin("saving a generated schedule")?;
    let inserted = repo.insert_many(entries).await?;
    info!(inserted, "generated schedule saved");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::models::{Classroom, Course, StudentGroup, Teacher};

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn seed(repo: &LocalRepository) {
        repo.seed_teacher(Teacher::new("t1", "Dr. Ada"));
        repo.seed_group(StudentGroup::new("sg1", "CS-1", 30).with_semester("fall"));
        repo.seed_group(StudentGroup::new("sg2", "CS-2", 25).with_semester("fall"));
        repo.seed_classroom(Classroom::new("cl1", "Room A", 40));
        repo.seed_classroom(Classroom::new("cl2", "Room B", 40));
        repo.seed_course(
            Course::new("c1", "Algorithms", "t1")
                .with_semester("fall")
                .with_group("sg1"),
        );
    }

    fn draft(start: &str) -> EntryDraft {
        EntryDraft {
            course_id: "c1".into(),
            student_group_id: "sg1".into(),
            classroom_id: "cl1".into(),
            teacher_id: None,
            day: Weekday::Monday,
            start_time: t(start),
            duration: None,
            semester: "fall".into(),
            academic_year: "2025-2026".into(),
            week_number: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_place_entry_persists_admissible_placement() {
        let repo = LocalRepository::new();
        seed(&repo);

        let entry = place_entry(&repo, &EngineConfig::default(), &Requester::Admin, draft("09:00"))
            .await
            .unwrap();
        assert_eq!(entry.teacher_id.value(), "t1");
        assert_eq!(entry.end_time, t("10:00"));
        assert_eq!(repo.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_place_entry_conflict_is_rejected() {
        let repo = LocalRepository::new();
        seed(&repo);
        place_entry(&repo, &EngineConfig::default(), &Requester::Admin, draft("09:00"))
            .await
            .unwrap();

        let mut second = draft("09:30");
        second.student_group_id = "sg2".into();
        second.classroom_id = "cl2".into();
        // Same teacher, overlapping interval
        let err = place_entry(&repo, &EngineConfig::default(), &Requester::Admin, second)
            .await
            .unwrap_err();
        match err {
            EngineError::Conflict { conflicts, .. } => {
                assert!(conflicts.iter().any(|c| c.message.contains("Teacher")));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(repo.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_place_entry_requires_admin() {
        let repo = LocalRepository::new();
        seed(&repo);
        let err = place_entry(
            &repo,
            &EngineConfig::default(),
            &Requester::Faculty("t1".into()),
            draft("09:00"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_place_entry_unknown_course_is_not_found() {
        let repo = LocalRepository::new();
        seed(&repo);
        let mut bad = draft("09:00");
        bad.course_id = "ghost".into();
        let err = place_entry(&repo, &EngineConfig::default(), &Requester::Admin, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_place_entry_capacity_validation() {
        let repo = LocalRepository::new();
        seed(&repo);
        repo.seed_group(StudentGroup::new("big", "Cohort", 200).with_semester("fall"));
        let mut bad = draft("09:00");
        bad.student_group_id = "big".into();
        let err = place_entry(&repo, &EngineConfig::default(), &Requester::Admin, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_student_sees_only_member_groups() {
        let repo = LocalRepository::new();
        seed(&repo);
        place_entry(&repo, &EngineConfig::default(), &Requester::Admin, draft("09:00"))
            .await
            .unwrap();
        let mut other = draft("10:00");
        other.student_group_id = "sg2".into();
        other.classroom_id = "cl2".into();
        place_entry(&repo, &EngineConfig::default(), &Requester::Admin, other)
            .await
            .unwrap();

        let student = Requester::Student(vec!["sg1".into()]);

        // Unscoped query: membership filtering applies
        let visible = list_entries(&repo, &student, &EntryQuery::default())
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].student_group_id.value(), "sg1");

        // Explicit own group
        let own = list_entries(
            &repo,
            &student,
            &EntryQuery {
                student_group_id: Some("sg1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(own.len(), 1);

        // Non-member group: empty list, not an error
        let foreign = list_entries(
            &repo,
            &student,
            &EntryQuery {
                student_group_id: Some("sg2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(foreign.is_empty());
    }

    #[tokio::test]
    async fn test_faculty_scoped_to_own_entries() {
        let repo = LocalRepository::new();
        seed(&repo);
        repo.seed_teacher(Teacher::new("t2", "Dr. Bob"));
        repo.seed_course(
            Course::new("c2", "Compilers", "t2")
                .with_semester("fall")
                .with_group("sg2"),
        );
        place_entry(&repo, &EngineConfig::default(), &Requester::Admin, draft("09:00"))
            .await
            .unwrap();
        let mut other = draft("10:00");
        other.course_id = "c2".into();
        other.student_group_id = "sg2".into();
        other.classroom_id = "cl2".into();
        place_entry(&repo, &EngineConfig::default(), &Requester::Admin, other)
            .await
            .unwrap();

        let faculty = Requester::Faculty("t1".into());
        let visible = list_entries(&repo, &faculty, &EntryQuery::default())
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].teacher_id.value(), "t1");

        // Asking for someone else's entries yields nothing
        let foreign = list_entries(
            &repo,
            &faculty,
            &EntryQuery {
                teacher_id: Some("t2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(foreign.is_empty());

        let admin_view = list_entries(&repo, &Requester::Admin, &EntryQuery::default())
            .await
            .unwrap();
        assert_eq!(admin_view.len(), 2);
    }

    #[tokio::test]
    async fn test_update_moving_placement_rechecks_kernel() {
        let repo = LocalRepository::new();
        seed(&repo);
        let first = place_entry(&repo, &EngineConfig::default(), &Requester::Admin, draft("09:00"))
            .await
            .unwrap();
        let mut other = draft("10:00");
        other.student_group_id = "sg2".into();
        other.classroom_id = "cl2".into();
        let second = place_entry(&repo, &EngineConfig::default(), &Requester::Admin, other)
            .await
            .unwrap();

        // Moving the second entry onto the first one's slot: teacher clash
        let err = update_entry(
            &repo,
            &EngineConfig::default(),
            &Requester::Admin,
            &second.id,
            EntryPatch {
                start_time: Some(t("09:00")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Conflict { .. }));

        // Moving it to a free slot succeeds and recomputes the end time
        let moved = update_entry(
            &repo,
            &EngineConfig::default(),
            &Requester::Admin,
            &second.id,
            EntryPatch {
                start_time: Some(t("11:00")),
                duration: Some(90),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.start_time, t("11:00"));
        assert_eq!(moved.end_time, t("12:30"));

        // Re-saving the first entry's own slot is not a self-conflict
        let unchanged = update_entry(
            &repo,
            &EngineConfig::default(),
            &Requester::Admin,
            &first.id,
            EntryPatch {
                day: Some(Weekday::Monday),
                classroom_id: Some("cl2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(unchanged.classroom_id.value(), "cl2");
    }

    #[tokio::test]
    async fn test_update_notes_only_skips_kernel() {
        let repo = LocalRepository::new();
        seed(&repo);
        let entry = place_entry(&repo, &EngineConfig::default(), &Requester::Admin, draft("09:00"))
            .await
            .unwrap();

        let updated = update_entry(
            &repo,
            &EngineConfig::default(),
            &Requester::Admin,
            &entry.id,
            EntryPatch {
                notes: Some("bring projector".into()),
                status: Some(EntryStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("bring projector"));
        assert_eq!(updated.status, EntryStatus::Cancelled);
        assert_eq!(updated.start_time, t("09:00"));
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let repo = LocalRepository::new();
        seed(&repo);
        let entry = place_entry(&repo, &EngineConfig::default(), &Requester::Admin, draft("09:00"))
            .await
            .unwrap();

        delete_entry(&repo, &Requester::Admin, &entry.id).await.unwrap();
        assert_eq!(repo.entry_count(), 0);
        let err = delete_entry(&repo, &Requester::Admin, &entry.id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_schedule_bulk_inserts_verbatim() {
        let repo = LocalRepository::new();
        let entries = vec![
            TimetableEntry::new(
                "c1".into(),
                "sg1".into(),
                "t1".into(),
                "cl1".into(),
                Weekday::Monday,
                t("09:00"),
                60,
                "fall",
                "2025-2026",
            ),
            TimetableEntry::new(
                "c1".into(),
                "sg1".into(),
                "t1".into(),
                "cl1".into(),
                Weekday::Tuesday,
                t("09:00"),
                60,
                "fall",
                "2025-2026",
            ),
        ];

        let inserted = save_schedule(&repo, &Requester::Admin, entries).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(repo.entry_count(), 2);

        let err = save_schedule(&repo, &Requester::Student(vec![]), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Authorization(_)));
    }
}
