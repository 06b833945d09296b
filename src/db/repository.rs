//! Repository trait consumed by the scheduling engine.
//!
//! The engine reads entity snapshots and persisted timetable entries
//! through this interface and never mutates state on its own; inserting a
//! generated schedule is a separate caller-driven step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RepositoryResult;
use crate::api::{ClassroomId, CourseId, EntryId, GroupId, TeacherId};
use crate::models::{Classroom, Course, StudentGroup, Teacher, TimetableEntry, Weekday};

/// Any-of identifier filter used by the conflict kernel.
///
/// An entry matches when it shares at least one of the populated
/// identifiers; an empty filter matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifierFilter {
    pub course_id: Option<CourseId>,
    pub student_group_id: Option<GroupId>,
    pub teacher_id: Option<TeacherId>,
    pub classroom_id: Option<ClassroomId>,
}

impl IdentifierFilter {
    pub fn matches(&self, entry: &TimetableEntry) -> bool {
        self.course_id.as_ref() == Some(&entry.course_id)
            || self.student_group_id.as_ref() == Some(&entry.student_group_id)
            || self.teacher_id.as_ref() == Some(&entry.teacher_id)
            || self.classroom_id.as_ref() == Some(&entry.classroom_id)
    }
}

/// All-of filter for timetable listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryQuery {
    pub day: Option<Weekday>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub course_id: Option<CourseId>,
    pub teacher_id: Option<TeacherId>,
    pub student_group_id: Option<GroupId>,
    pub classroom_id: Option<ClassroomId>,
}

impl EntryQuery {
    pub fn matches(&self, entry: &TimetableEntry) -> bool {
        if let Some(day) = self.day {
            if entry.day != day {
                return false;
            }
        }
        if let Some(ref semester) = self.semester {
            if &entry.semester != semester {
                return false;
            }
        }
        if let Some(ref year) = self.academic_year {
            if &entry.academic_year != year {
                return false;
            }
        }
        if let Some(ref id) = self.course_id {
            if &entry.course_id != id {
                return false;
            }
        }
        if let Some(ref id) = self.teacher_id {
            if &entry.teacher_id != id {
                return false;
            }
        }
        if let Some(ref id) = self.student_group_id {
            if &entry.student_group_id != id {
                return false;
            }
        }
        if let Some(ref id) = self.classroom_id {
            if &entry.classroom_id != id {
                return false;
            }
        }
        true
    }
}

/// Storage interface for timetable entries and entity snapshots.
///
/// Entity finders return active records only. Implementations must be
/// `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TimetableRepository: Send + Sync {
    // ==================== Timetable entries ====================

    /// Persisted entries on `day` matching at least one identifier of
    /// `filter`, excluding the entry designated by `exclude` if any.
    ///
    /// This is the conflict kernel's lookup.
    async fn find_day_entries(
        &self,
        day: Weekday,
        filter: &IdentifierFilter,
        exclude: Option<&EntryId>,
    ) -> RepositoryResult<Vec<TimetableEntry>>;

    /// Entries matching every populated field of `query`.
    async fn query_entries(&self, query: &EntryQuery) -> RepositoryResult<Vec<TimetableEntry>>;

    /// Single entry by id.
    async fn find_entry(&self, id: &EntryId) -> RepositoryResult<Option<TimetableEntry>>;

    /// Persist a single entry.
    async fn insert_entry(&self, entry: TimetableEntry) -> RepositoryResult<()>;

    /// Bulk-persist a generated schedule; returns the number inserted.
    async fn insert_many(&self, entries: Vec<TimetableEntry>) -> RepositoryResult<usize>;

    /// Replace the stored entry with the same id.
    async fn update_entry(&self, entry: TimetableEntry) -> RepositoryResult<()>;

    /// Remove an entry by id.
    async fn delete_entry(&self, id: &EntryId) -> RepositoryResult<()>;

    // ==================== Entity snapshots ====================

    /// Active courses for a semester, optionally restricted to a department.
    async fn find_courses(
        &self,
        semester: &str,
        department: Option<&str>,
    ) -> RepositoryResult<Vec<Course>>;

    async fn find_course(&self, id: &CourseId) -> RepositoryResult<Option<Course>>;

    /// Active student groups for a semester/department.
    async fn find_student_groups(
        &self,
        semester: &str,
        department: Option<&str>,
    ) -> RepositoryResult<Vec<StudentGroup>>;

    async fn find_student_group(&self, id: &GroupId) -> RepositoryResult<Option<StudentGroup>>;

    /// Active classrooms.
    async fn find_classrooms(&self) -> RepositoryResult<Vec<Classroom>>;

    async fn find_classroom(&self, id: &ClassroomId) -> RepositoryResult<Option<Classroom>>;

    /// Active faculty, optionally restricted to a department.
    async fn find_faculty(&self, department: Option<&str>) -> RepositoryResult<Vec<Teacher>>;

    async fn find_teacher(&self, id: &TeacherId) -> RepositoryResult<Option<Teacher>>;
}
