//! Error types for reward-ledger

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Quest already claimed: {0}")]
    AlreadyClaimed(String),

    #[error("Achievement already unlocked: {0}")]
    AlreadyUnlocked(String),

    #[error("Quest expired: {0}")]
    Expired(String),

    #[error("Quest not completed: {0}")]
    NotCompleted(String),

    #[error("Insufficient coins: need {required}, have {available}")]
    InsufficientCoins { required: i32, available: i32 },

    #[error("Item not owned: {0}")]
    NotOwned(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<diesel::result::Error> for RewardError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match e {
            Error::NotFound => RewardError::NotFound("record not found".into()),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RewardError::Conflict(info.message().to_string())
            }
            other => RewardError::Internal(format!("Database error: {}", other)),
        }
    }
}

impl From<diesel::r2d2::PoolError> for RewardError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        RewardError::Pool(e.to_string())
    }
}
