//! External collaborators of the engine.
//!
//! RULE: Simulation code never talks to a database directly. It goes
//! through these traits; the sqlite implementation lives in
//! store/sqlite.rs and is the only module that executes SQL.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::EngineResult;
use crate::event::MatchEvent;
use crate::roster::Player;
use crate::state::MatchStatus;
use crate::stats::{PlayerStatLine, TeamStatLine};
use crate::types::{GameSeconds, MatchId, PlayerId, TeamId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A match row as stored durably.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub match_id:       MatchId,
    pub home_team_id:   TeamId,
    pub away_team_id:   TeamId,
    pub status:         MatchStatus,
    pub scheduled_time: DateTime<Utc>,
    pub home_score:     u32,
    pub away_score:     u32,
    pub game_time:      GameSeconds,
    pub current_half:   u8,
    /// Configured duration, written at the initial live update so
    /// recovery knows an exhibition from a regulation match.
    pub max_time:       GameSeconds,
    /// Trailing play-by-play window from the last snapshot.
    pub event_window:   Vec<MatchEvent>,
    pub error:          Option<String>,
}

/// Partial update of a match row. None fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MatchUpdate {
    pub status:       Option<MatchStatus>,
    pub home_score:   Option<u32>,
    pub away_score:   Option<u32>,
    pub game_time:    Option<GameSeconds>,
    pub current_half: Option<u8>,
    pub max_time:     Option<GameSeconds>,
    pub event_window: Option<Vec<MatchEvent>>,
    pub error:        Option<String>,
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn create_match(
        &self,
        home_team_id: TeamId,
        away_team_id: TeamId,
        scheduled_time: DateTime<Utc>,
    ) -> EngineResult<MatchId>;

    async fn get_match(&self, match_id: MatchId) -> EngineResult<Option<MatchRecord>>;

    async fn update_match(&self, match_id: MatchId, update: MatchUpdate) -> EngineResult<()>;
}

#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Active players for one team, with simulation attributes.
    async fn active_players(&self, team_id: TeamId) -> EngineResult<Vec<Player>>;
}

/// One completed match's contribution to a player's lifetime totals.
#[derive(Debug, Clone, Copy)]
pub struct CareerDelta {
    pub games_played: u32,
    pub stats: PlayerStatLine,
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn record_player_match_stats(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
        line: &PlayerStatLine,
    ) -> EngineResult<()>;

    async fn record_team_match_stats(
        &self,
        match_id: MatchId,
        team_id: TeamId,
        line: &TeamStatLine,
    ) -> EngineResult<()>;

    async fn accumulate_career_stats(
        &self,
        player_id: PlayerId,
        delta: &CareerDelta,
    ) -> EngineResult<()>;
}
