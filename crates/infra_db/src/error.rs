//! Persistence error types
//!
//! Three layers of errors live here:
//!
//! - [`DatabaseError`]: PostgreSQL failures classified by SQLSTATE
//! - [`StoreError`]: what an [`EntityStore`](crate::store::EntityStore) reports
//! - [`RepositoryError`]: what callers of the generic repository see

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use core_kernel::CoreError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Check or not-null constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Value too long for its column
    #[error("Value too long: {0}")]
    ValueTooLong(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ConstraintViolation(_)
                | DatabaseError::ValueTooLong(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Classifies SQLx errors by PostgreSQL error code
///
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23502") | Some("23514") => DatabaseError::ConstraintViolation(message),
                    Some("22001") => DatabaseError::ValueTooLong(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

/// One entry the store refused to write because its token was stale
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    /// Type name of the conflicting entity
    pub entity_type: String,
    /// Identifier of the conflicting row
    pub id: String,
    /// The values the caller tried to write
    pub proposed: serde_json::Value,
}

/// The set of entries that failed the version check in one commit
#[derive(Debug, Clone, PartialEq)]
pub struct ConcurrencyViolation {
    pub entries: Vec<ConflictEntry>,
}

impl fmt::Display for ConcurrencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{} '{}'", e.entity_type, e.id))
            .collect();
        write!(f, "{}", ids.join(", "))
    }
}

/// Errors reported by a storage engine
#[derive(Debug, Error)]
pub enum StoreError {
    /// A Modified or Deleted change did not match the persisted version,
    /// or its row no longer exists
    #[error("Concurrency violation on {0}")]
    Concurrency(ConcurrencyViolation),

    /// An Added change collided with an existing identifier
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error(transparent)]
    Database(DatabaseError),

    /// A row could not be mapped to or from its entity
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<DatabaseError> for StoreError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::DuplicateEntry(message) => StoreError::DuplicateEntry(message),
            other => StoreError::Database(other),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::from(DatabaseError::from(&error))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization(error.to_string())
    }
}

/// Errors surfaced by the generic repository
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: &'static str, id: String },

    /// A validation hook vetoed the save, or a query argument was rejected
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    /// The row was changed by someone else; `current` holds its latest values
    #[error("{entity_type} '{id}' was modified by another user")]
    ConcurrencyConflict {
        entity_type: String,
        id: String,
        current: serde_json::Value,
    },

    #[error("{entity_type} '{id}' was deleted by another user")]
    EntityDeletedConflict { entity_type: String, id: String },

    #[error("Concurrency conflict on unsupported entity type {0}")]
    UnsupportedConflictType(String),

    #[error("Argument '{0}' cannot be null or empty")]
    NullArgument(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    pub fn not_found(entity_type: &'static str, id: impl fmt::Display) -> Self {
        RepositoryError::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        RepositoryError::ValidationFailure(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// True for every outcome of the optimistic concurrency check
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RepositoryError::ConcurrencyConflict { .. }
                | RepositoryError::EntityDeletedConflict { .. }
                | RepositoryError::UnsupportedConflictType(_)
                | RepositoryError::Store(StoreError::DuplicateEntry(_))
        )
    }
}

impl From<CoreError> for RepositoryError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound(id) => RepositoryError::NotFound {
                entity_type: "Entity",
                id,
            },
            other => RepositoryError::ValidationFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_database_error_becomes_store_duplicate() {
        let err = StoreError::from(DatabaseError::DuplicateEntry("pk".to_string()));
        assert!(matches!(err, StoreError::DuplicateEntry(_)));
    }

    #[test]
    fn test_unknown_sort_column_is_validation_failure() {
        let err = RepositoryError::from(CoreError::unknown_sort_column("bogus"));
        assert!(matches!(err, RepositoryError::ValidationFailure(ref m) if m.contains("bogus")));
    }

    #[test]
    fn test_conflict_classification() {
        let err = RepositoryError::EntityDeletedConflict {
            entity_type: "WeatherForecast".to_string(),
            id: "x".to_string(),
        };
        assert!(err.is_conflict());
        assert!(!RepositoryError::not_found("WeatherForecast", "x").is_conflict());
    }

    #[test]
    fn test_violation_display_lists_entries() {
        let violation = ConcurrencyViolation {
            entries: vec![ConflictEntry {
                entity_type: "WeatherForecast".to_string(),
                id: "abc".to_string(),
                proposed: serde_json::Value::Null,
            }],
        };
        assert_eq!(violation.to_string(), "WeatherForecast 'abc'");
    }
}
