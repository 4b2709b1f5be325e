//! Play-by-play events.
//!
//! RULE: Events are append-only. A tick may append at most one play,
//! plus engine bookkeeping entries (kickoff, halftime). Only a trailing
//! window is retained — full history is not a goal of this subsystem.

use crate::types::{GameSeconds, PlayerId, TeamId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEventKind {
    Kickoff,
    Halftime,
    PassComplete,
    PassIncomplete,
    PassDrop,
    Interception,
    Rush,
    Fumble,
    Tackle,
    Knockdown,
    Score,
    NoOneOpen,
}

impl MatchEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kickoff        => "kickoff",
            Self::Halftime       => "halftime",
            Self::PassComplete   => "pass_complete",
            Self::PassIncomplete => "pass_incomplete",
            Self::PassDrop       => "pass_drop",
            Self::Interception   => "interception",
            Self::Rush           => "rush",
            Self::Fumble         => "fumble",
            Self::Tackle         => "tackle",
            Self::Knockdown      => "knockdown",
            Self::Score          => "score",
            Self::NoOneOpen      => "no_one_open",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Simulated seconds from kickoff.
    pub time: GameSeconds,
    pub kind: MatchEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acting_player_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_player_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defensive_player_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    /// Free-form payload, e.g. {"yards": 12}.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    pub description: String,
}

impl MatchEvent {
    pub fn new(time: GameSeconds, kind: MatchEventKind, description: impl Into<String>) -> Self {
        Self {
            time,
            kind,
            acting_player_id: None,
            target_player_id: None,
            defensive_player_id: None,
            team_id: None,
            data: serde_json::Value::Null,
            description: description.into(),
        }
    }

    pub fn acting(mut self, id: PlayerId) -> Self {
        self.acting_player_id = Some(id);
        self
    }

    pub fn target(mut self, id: PlayerId) -> Self {
        self.target_player_id = Some(id);
        self
    }

    pub fn defender(mut self, id: PlayerId) -> Self {
        self.defensive_player_id = Some(id);
        self
    }

    pub fn team(mut self, id: TeamId) -> Self {
        self.team_id = Some(id);
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
