use crate::state::Screen;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Insufficient funds: cost {cost}, balance {money}")]
    InsufficientFunds { cost: u64, money: u64 },

    #[error("'{key}' is already owned")]
    AlreadyOwned { key: String },

    #[error("Unknown catalog item '{key}'")]
    UnknownItem { key: String },

    #[error("Unknown newspaper '{key}'")]
    UnknownNewspaper { key: String },

    #[error("Newspaper '{key}' lists no jobs")]
    NoJobs { key: String },

    #[error("Action '{action}' is not available on the {screen:?} screen")]
    InvalidAction { action: &'static str, screen: Screen },

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GameError {
    /// Rejections the player can recover from by choosing something else.
    /// Everything in this core is recoverable; this only separates player
    /// mistakes from infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::AlreadyOwned { .. }
                | Self::UnknownItem { .. }
                | Self::UnknownNewspaper { .. }
                | Self::NoJobs { .. }
                | Self::InvalidAction { .. }
        )
    }
}

pub type GameResult<T> = Result<T, GameError>;
