//! Repository pattern for timetable persistence.
//!
//! The engine consumes persisted entries and entity snapshots through the
//! [`TimetableRepository`] trait; storage backends are swappable behind
//! it. The in-process [`LocalRepository`] serves unit tests, local
//! development, and the demo binary.

pub mod error;
pub mod local;
pub mod repository;

pub use error::{RepositoryError, RepositoryResult};
pub use local::LocalRepository;
pub use repository::{EntryQuery, IdentifierFilter, TimetableRepository};
