use thiserror::Error;

use crate::transport::TransportKind;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("transport {kind:?} to {destination} lists no acceptable item set")]
    MissingItemSets { kind: TransportKind, destination: String },
    #[error("invalid catalog row {row}: {reason}")]
    InvalidRow { row: i64, reason: String },
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("path worker is gone")]
    WorkerGone,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WalkError>;
