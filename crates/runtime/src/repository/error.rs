//! Error types raised by key-value store implementations.

use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("key-value store lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
