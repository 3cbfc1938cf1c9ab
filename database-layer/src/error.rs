use error_common::YatraError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::MigrationError(err.to_string())
    }
}

impl From<DatabaseError> for YatraError {
    fn from(err: DatabaseError) -> Self {
        YatraError::DatabaseError(err.to_string())
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// PostgreSQL SQLSTATE for foreign key violations
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL SQLSTATE for unique constraint violations
pub const UNIQUE_VIOLATION: &str = "23505";

/// Constraint violation details pulled out of a driver error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    ForeignKey { constraint: Option<String> },
    Unique { constraint: Option<String> },
}

/// Classify a sqlx error as a constraint violation, if it is one
#[must_use]
pub fn constraint_violation(err: &sqlx::Error) -> Option<ConstraintViolation> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    let constraint = db_err.constraint().map(ToString::to_string);
    match db_err.code().as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => Some(ConstraintViolation::ForeignKey { constraint }),
        Some(UNIQUE_VIOLATION) => Some(ConstraintViolation::Unique { constraint }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_constraint_violations() {
        assert_eq!(constraint_violation(&sqlx::Error::RowNotFound), None);
        assert_eq!(constraint_violation(&sqlx::Error::PoolTimedOut), None);
    }

    #[test]
    fn converts_into_workspace_error() {
        let err: YatraError = DatabaseError::QueryFailed("syntax".into()).into();
        assert!(matches!(err, YatraError::DatabaseError(msg) if msg.contains("syntax")));
    }
}
