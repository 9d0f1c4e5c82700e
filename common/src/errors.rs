// Error handling framework for the scheduling core

use thiserror::Error;

/// Errors produced while invoking a job's backend.
///
/// These never abort the pipeline: the worker folds them into the
/// `JobResult` so that the marker still records the run.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Remote function invocation failed: {0}")]
    RemoteInvocationFailed(String),

    #[error("Remote function '{function_name}' reported failure status {status_code}")]
    SoftFailure {
        function_name: String,
        status_code: i32,
    },

    #[error("HTTP request failed: {0}")]
    HttpRequestFailed(String),

    #[error("Invalid template properties: {0}")]
    InvalidTemplateProperties(String),

    #[error("Payload serialization failed: {0}")]
    PayloadSerialization(String),
}

/// Errors surfaced by the store abstraction
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    DuplicateKey(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Validation errors raised when templates and jobs are submitted
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Unknown template type: {0}")]
    UnknownTemplateType(String),

    #[error("Invalid interval '{input}': {reason}")]
    InvalidInterval { input: String, reason: String },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

/// Errors that abort a single scheduling cycle
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch queue closed")]
    QueueClosed,

    #[error("Scheduler pipeline already started")]
    AlreadyStarted,
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateKey(db_err.message().to_string()),
                        "23503" => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionFailed(err.to_string())
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(err.to_string())
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) | DatabaseError::ForeignKeyViolation(msg) => {
                StoreError::NotFound(msg)
            }
            DatabaseError::DuplicateKey(msg) => StoreError::DuplicateKey(msg),
            DatabaseError::ConnectionFailed(msg) | DatabaseError::HealthCheckFailed(msg) => {
                StoreError::ConnectionFailed(msg)
            }
            other => StoreError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::InvalidJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_failure_display() {
        let err = ExecutionError::SoftFailure {
            function_name: "f1".to_string(),
            status_code: 103,
        };
        let msg = err.to_string();
        assert!(msg.contains("f1"));
        assert!(msg.contains("103"));
    }

    #[test]
    fn test_database_not_found_maps_to_store_not_found() {
        let err: StoreError = DatabaseError::NotFound("job".to_string()).into();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_store_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_foreign_key_violation_maps_to_not_found() {
        let err: StoreError = DatabaseError::ForeignKeyViolation("template_id".to_string()).into();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_migration_failure_maps_to_query_failed() {
        let err: StoreError = DatabaseError::MigrationFailed("boom".to_string()).into();
        assert!(matches!(err, StoreError::QueryFailed(_)));
    }

    #[test]
    fn test_invalid_interval_display() {
        let err = ValidationError::InvalidInterval {
            input: "0s".to_string(),
            reason: "must be positive".to_string(),
        };
        assert!(err.to_string().contains("0s"));
    }
}
