use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file is missing. Only surfaced by `load`; `open` heals it
    /// by writing an empty document.
    #[error("database file not found")]
    NotFound,

    #[error("resource does not exist")]
    NotExist,

    #[error("user already exists")]
    AlreadyExists,

    #[error("not the author of this chirp")]
    NotAuthor,

    #[error("refresh token is already revoked")]
    AlreadyRevoked,

    #[error("database corrupt: {0}")]
    Corrupt(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
