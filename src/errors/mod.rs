use thiserror::Error;

/// Failures surfaced by game operations.
///
/// Everything except `Storage` is detected before any mutation is applied,
/// so a failed request never leaves partial ledger or bracket changes behind.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Conflict(String),

    #[error("This game already has a winner.")]
    AlreadySettled,

    #[error("You already played this game.")]
    AlreadyReported,

    #[error("{0}")]
    Validation(String),

    #[error("Tournament is full.")]
    Full,

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type GameResult<T> = Result<T, GameError>;

impl From<rusqlite::Error> for GameError {
    fn from(err: rusqlite::Error) -> Self {
        GameError::Storage(err.into())
    }
}

impl GameError {
    pub fn not_found(what: &str) -> Self {
        GameError::NotFound(what.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        GameError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        GameError::Conflict(message.into())
    }

    pub fn denied(message: impl Into<String>) -> Self {
        GameError::PermissionDenied(message.into())
    }
}
