use crate::types::{MatchId, TeamId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Match {match_id} not found")]
    MatchNotFound { match_id: MatchId },

    #[error("Match {match_id} already has a live runner")]
    MatchAlreadyRunning { match_id: MatchId },

    #[error("Team {team_id} has no eligible players")]
    EmptyRoster { team_id: TeamId },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
