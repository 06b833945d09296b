//! In-memory repository for unit testing, local development, and demos.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::{RepositoryError, RepositoryResult};
use super::repository::{EntryQuery, IdentifierFilter, TimetableRepository};
use crate::api::{ClassroomId, CourseId, EntryId, GroupId, TeacherId};
use crate::models::{Classroom, Course, StudentGroup, Teacher, TimetableEntry, Weekday};

#[derive(Debug, Default)]
struct Store {
    entries: Vec<TimetableEntry>,
    courses: Vec<Course>,
    groups: Vec<StudentGroup>,
    classrooms: Vec<Classroom>,
    teachers: Vec<Teacher>,
}

/// In-memory [`TimetableRepository`] backed by a `parking_lot::RwLock`.
///
/// Seed helpers take `&self`, so a shared repository can be populated
/// after handing clones of its `Arc` to the engine.
#[derive(Debug, Default)]
pub struct LocalRepository {
    store: RwLock<Store>,
}

impl LocalRepository {
    pub fn new() -> Self {
        LocalRepository::default()
    }

    pub fn seed_course(&self, course: Course) {
        self.store.write().courses.push(course);
    }

    pub fn seed_group(&self, group: StudentGroup) {
        self.store.write().groups.push(group);
    }

    pub fn seed_classroom(&self, classroom: Classroom) {
        self.store.write().classrooms.push(classroom);
    }

    pub fn seed_teacher(&self, teacher: Teacher) {
        self.store.write().teachers.push(teacher);
    }

    pub fn seed_entry(&self, entry: TimetableEntry) {
        self.store.write().entries.push(entry);
    }

    /// Number of persisted entries.
    pub fn entry_count(&self) -> usize {
        self.store.read().entries.len()
    }
}

fn department_matches(department: Option<&str>, entity_department: Option<&String>) -> bool {
    match department {
        Some(wanted) => entity_department.map(|d| d.as_str()) == Some(wanted),
        None => true,
    }
}

#[async_trait]
impl TimetableRepository for LocalRepository {
    async fn find_day_entries(
        &self,
        day: Weekday,
        filter: &IdentifierFilter,
        exclude: Option<&EntryId>,
    ) -> RepositoryResult<Vec<TimetableEntry>> {
        let store = self.store.read();
        Ok(store
            .entries
            .iter()
            .filter(|e| e.day == day)
            .filter(|e| Some(&e.id) != exclude)
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn query_entries(&self, query: &EntryQuery) -> RepositoryResult<Vec<TimetableEntry>> {
        let store = self.store.read();
        Ok(store
            .entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect())
    }

    async fn find_entry(&self, id: &EntryId) -> RepositoryResult<Option<TimetableEntry>> {
        let store = self.store.read();
        Ok(store.entries.iter().find(|e| &e.id == id).cloned())
    }

    async fn insert_entry(&self, entry: TimetableEntry) -> RepositoryResult<()> {
        self.store.write().entries.push(entry);
        Ok(())
    }

    async fn insert_many(&self, entries: Vec<TimetableEntry>) -> RepositoryResult<usize> {
        let count = entries.len();
        self.store.write().entries.extend(entries);
        Ok(count)
    }

    async fn update_entry(&self, entry: TimetableEntry) -> RepositoryResult<()> {
        let mut store = self.store.write();
        match store.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(slot) => {
                *slot = entry;
                Ok(())
            }
            None => Err(RepositoryError::not_found(format!(
                "timetable entry {}",
                entry.id
            ))),
        }
    }

    async fn delete_entry(&self, id: &EntryId) -> RepositoryResult<()> {
        let mut store = self.store.write();
        let before = store.entries.len();
        store.entries.retain(|e| &e.id != id);
        if store.entries.len() == before {
            return Err(RepositoryError::not_found(format!("timetable entry {}", id)));
        }
        Ok(())
    }

    async fn find_courses(
        &self,
        semester: &str,
        department: Option<&str>,
    ) -> RepositoryResult<Vec<Course>> {
        let store = self.store.read();
        Ok(store
            .courses
            .iter()
            .filter(|c| c.active && c.semester == semester)
            .filter(|c| department_matches(department, c.department.as_ref()))
            .cloned()
            .collect())
    }

    async fn find_course(&self, id: &CourseId) -> RepositoryResult<Option<Course>> {
        let store = self.store.read();
        Ok(store.courses.iter().find(|c| &c.id == id && c.active).cloned())
    }

    async fn find_student_groups(
        &self,
        semester: &str,
        department: Option<&str>,
    ) -> RepositoryResult<Vec<StudentGroup>> {
        let store = self.store.read();
        Ok(store
            .groups
            .iter()
            .filter(|g| g.active && g.semester == semester)
            .filter(|g| department_matches(department, g.department.as_ref()))
            .cloned()
            .collect())
    }

    async fn find_student_group(&self, id: &GroupId) -> RepositoryResult<Option<StudentGroup>> {
        let store = self.store.read();
        Ok(store.groups.iter().find(|g| &g.id == id && g.active).cloned())
    }

    async fn find_classrooms(&self) -> RepositoryResult<Vec<Classroom>> {
        let store = self.store.read();
        Ok(store.classrooms.iter().filter(|r| r.active).cloned().collect())
    }

    async fn find_classroom(&self, id: &ClassroomId) -> RepositoryResult<Option<Classroom>> {
        let store = self.store.read();
        Ok(store.classrooms.iter().find(|r| &r.id == id && r.active).cloned())
    }

    async fn find_faculty(&self, department: Option<&str>) -> RepositoryResult<Vec<Teacher>> {
        let store = self.store.read();
        Ok(store
            .teachers
            .iter()
            .filter(|t| t.active)
            .filter(|t| department_matches(department, t.department.as_ref()))
            .cloned()
            .collect())
    }

    async fn find_teacher(&self, id: &TeacherId) -> RepositoryResult<Option<Teacher>> {
        let store = self.store.read();
        Ok(store.teachers.iter().find(|t| &t.id == id && t.active).cloned())
    }
}
