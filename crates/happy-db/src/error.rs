use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("user {0} does not exist")]
    UnknownUser(i64),

    #[error("DB lock poisoned")]
    LockPoisoned,

    #[error("storage unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
}
