//! Error types for sessions and device-local storage

use thiserror::Error;

use crate::session::SessionState;

pub type SessionResult<T> = Result<T, SessionError>;
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Cannot generate {requested} distinct values from a domain of {available}")]
    GenerationImpossible { requested: usize, available: usize },

    #[error("Response received while session is {state:?}")]
    UnexpectedResponse { state: SessionState },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown score key: {0}")]
    UnknownKey(String),

    #[error("Score value is not a whole number: {0}")]
    InvalidValue(String),
}
