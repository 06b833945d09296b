//! Error types for repository operations.

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error type for repository operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// Requested record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A lookup or filter could not be executed.
    #[error("query error: {0}")]
    Query(String),

    /// Unexpected storage failure.
    #[error("internal repository error: {0}")]
    Internal(String),
}

impl RepositoryError {
    pub fn not_found(message: impl Into<String>) -> Self {
        RepositoryError::NotFound(message.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        RepositoryError::Query(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RepositoryError::Internal(message.into())
    }
}
