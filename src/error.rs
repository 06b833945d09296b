//! Engine error taxonomy.
//!
//! Callers map these onto their transport: validation to 400, missing
//! targets to 404 (400 on create), authorization to 401/403, conflicting
//! placements to 409 with the conflict list, and everything else to 500.

use crate::conflict::Conflict;
use crate::db::RepositoryError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error type for engine operations.
///
/// A generator failing to place a session is *not* an error; unplaced
/// sessions are data, reported in the generator's outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity or operation target does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requester's role does not permit the operation.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// The placement collides with the existing timetable.
    #[error("{message}")]
    Conflict {
        message: String,
        conflicts: Vec<Conflict>,
    },

    /// Repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        EngineError::NotFound(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        EngineError::Authorization(message.into())
    }

    pub fn conflict(conflicts: Vec<Conflict>) -> Self {
        EngineError::Conflict {
            message: format!(
                "scheduling conflict detected ({} issue{})",
                conflicts.len(),
                if conflicts.len() == 1 { "" } else { "s" }
            ),
            conflicts,
        }
    }
}
