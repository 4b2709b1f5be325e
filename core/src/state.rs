//! In-memory state of one live match.
//!
//! RULE: A LiveMatchState is mutated only by the runner task that owns
//! it. Everyone else sees clones taken under a read lock. No two
//! runners may exist for the same match id at once — the registry's
//! entry API enforces that.

use crate::event::MatchEvent;
use crate::generator::PlayOutcome;
use crate::roster::Player;
use crate::stats::{PlayerStatLine, TeamStatLine};
use crate::types::{GameSeconds, MatchId, PlayerId, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Paused,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live      => "live",
            Self::Paused    => "paused",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "live"      => Some(Self::Live),
            "paused"    => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveMatchState {
    pub match_id:     MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,

    /// Elapsed simulated seconds. Monotonically non-decreasing;
    /// never exceeds max_time.
    pub game_time: GameSeconds,
    pub max_time:  GameSeconds,
    pub current_half: u8,

    pub home_score: u32,
    pub away_score: u32,
    pub status: MatchStatus,

    /// Trailing play-by-play window, oldest first.
    pub events: Vec<MatchEvent>,
    #[serde(skip)]
    event_window: usize,

    pub possessing_team_id: Option<TeamId>,
    /// Game time at which the current possession spell began.
    pub possession_start_time: GameSeconds,
    /// The team that received the opening kickoff. Halftime gives the
    /// ball to the other one.
    pub opening_possession: TeamId,

    pub player_stats: HashMap<PlayerId, PlayerStatLine>,
    pub team_stats:   HashMap<TeamId, TeamStatLine>,
}

impl LiveMatchState {
    /// Fresh state at kickoff. Every rostered player starts with a
    /// zeroed stat line so completion can roll up games_played even
    /// for players who never touched the ball.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        match_id: MatchId,
        home_team_id: TeamId,
        away_team_id: TeamId,
        max_time: GameSeconds,
        event_window: usize,
        home_roster: &[Player],
        away_roster: &[Player],
        opening_possession: TeamId,
    ) -> Self {
        let mut player_stats = HashMap::new();
        for p in home_roster.iter().chain(away_roster.iter()) {
            player_stats.insert(p.id, PlayerStatLine::default());
        }

        let mut team_stats = HashMap::new();
        team_stats.insert(home_team_id, TeamStatLine::default());
        team_stats.insert(away_team_id, TeamStatLine::default());

        Self {
            match_id,
            home_team_id,
            away_team_id,
            game_time: 0,
            max_time,
            current_half: 1,
            home_score: 0,
            away_score: 0,
            status: MatchStatus::Live,
            events: Vec::new(),
            event_window,
            possessing_team_id: Some(opening_possession),
            possession_start_time: 0,
            opening_possession,
            player_stats,
            team_stats,
        }
    }

    pub fn other_team(&self, team: TeamId) -> TeamId {
        if team == self.home_team_id {
            self.away_team_id
        } else {
            self.home_team_id
        }
    }

    /// Append to the trailing window, evicting the oldest entry once
    /// the window is full.
    pub fn record_event(&mut self, event: MatchEvent) {
        if self.events.len() >= self.event_window {
            self.events.remove(0);
        }
        self.events.push(event);
    }

    /// Credit one tick's worth of possession time to the current
    /// holder. Called exactly once per tick, so the sum of both teams'
    /// possession seconds tracks game_time to the tick.
    pub fn accrue_possession(&mut self, secs: GameSeconds) {
        if let Some(team) = self.possessing_team_id {
            self.team_stats
                .entry(team)
                .or_default()
                .time_of_possession_seconds += secs;
        }
    }

    /// Hand the ball to `team`. Returns the length of the spell that
    /// just ended (time already accrued tick-by-tick; the spell length
    /// feeds event payloads). No-op if `team` already has the ball.
    pub fn change_possession(&mut self, team: TeamId) -> GameSeconds {
        if self.possessing_team_id == Some(team) {
            return 0;
        }
        let spell = self.game_time.saturating_sub(self.possession_start_time);
        self.possessing_team_id = Some(team);
        self.possession_start_time = self.game_time;
        spell
    }

    /// Apply a generated play: event, stat deltas, score, possession.
    pub fn apply(&mut self, outcome: PlayOutcome) {
        for (player_id, delta) in &outcome.player_deltas {
            self.player_stats.entry(*player_id).or_default().merge(delta);
        }
        for (team_id, delta) in &outcome.team_deltas {
            self.team_stats.entry(*team_id).or_default().merge(delta);
        }
        if let Some(team) = outcome.scoring_team {
            if team == self.home_team_id {
                self.home_score += 1;
            } else {
                self.away_score += 1;
            }
        }
        self.record_event(outcome.event);
        if let Some(team) = outcome.new_possession {
            self.change_possession(team);
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }
}
