//! Storage error types.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying SQLite operation failed.
    #[error("sqlite error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An event payload could not be encoded as JSON for storage.
    #[error("event encoding error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A session lookup matched nothing (or too much, for a prefix).
    #[error("{0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
