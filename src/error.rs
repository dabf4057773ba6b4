use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream fetch failed for {source_alias}: {reason}")]
    UpstreamFetch { source_alias: String, reason: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("unreadable term row {row}: {reason}")]
    RowRead { row: usize, reason: String },

    #[error("invalid source alias: {0}")]
    InvalidSource(String),

    #[error("storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("run not found: {0}")]
    RunNotFound(i64),

    #[error("invalid run status transition to {0}")]
    InvalidTransition(String),

    #[error("invalid period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },
}

pub type IngestResult<T> = Result<T, IngestError>;

impl From<rusqlite::Error> for IngestError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                Self::ConstraintViolation(err.to_string())
            }
            Some(rusqlite::ErrorCode::CannotOpen)
            | Some(rusqlite::ErrorCode::DatabaseBusy)
            | Some(rusqlite::ErrorCode::DatabaseLocked)
            | Some(rusqlite::ErrorCode::NotADatabase) => Self::StorageUnavailable(err.to_string()),
            _ => Self::Storage(err),
        }
    }
}

impl IngestError {
    pub fn row_read(row: usize, reason: impl Into<String>) -> Self {
        Self::RowRead {
            row,
            reason: reason.into(),
        }
    }
}
