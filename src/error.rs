use thiserror::Error;

use crate::catalog::Conflict;

/// Errors surfaced by the video catalog core.
///
/// Everything except [`VideoError::StorageUnavailable`] is a normal negative
/// result the command layer turns into an informational reply.
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("conflicting video already exists: {}", describe_conflicts(.0))]
    DuplicateConflict(Vec<Conflict>),

    #[error("video not found: {0}")]
    NotFound(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("catalog store unavailable: {0}")]
    StorageUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for VideoError {
    fn from(err: rusqlite::Error) -> Self {
        VideoError::StorageUnavailable(err.to_string())
    }
}

impl From<tokio::task::JoinError> for VideoError {
    fn from(err: tokio::task::JoinError) -> Self {
        VideoError::StorageUnavailable(format!("store task aborted: {}", err))
    }
}

fn describe_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| format!("{} (`{}` -> {})", c.field, c.name, c.url))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, VideoError>;
