use std::path::PathBuf;

use thiserror::Error;

/// Why a single session record was rejected at ingestion.
///
/// These never abort a run: the record is skipped and reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is not a valid session object: {0}")]
    Malformed(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unknown session status '{0}'")]
    UnknownStatus(String),

    #[error("invalid timestamp in `{field}`: '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("duplicate session id '{0}'")]
    DuplicateId(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read session data from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session data is not a recognised study plan payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid timestamp '{0}' (expected RFC 3339 or YYYY-MM-DD)")]
    InvalidNow(String),

    #[error("no session data source; pass --file or set SATPLAN_SESSIONS")]
    MissingSource,

    #[error("no session with id '{0}'")]
    SessionNotFound(String),

    #[error("no timer stored for session '{0}'")]
    TimerNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
