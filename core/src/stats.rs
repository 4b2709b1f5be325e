//! Stat snapshots — plain value types with no behavior beyond merging.
//!
//! One PlayerStatLine / TeamStatLine per match. Career totals are the
//! running sum of match lines, maintained by the stats store.

use crate::types::GameSeconds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatLine {
    pub pass_attempts:    u32,
    pub pass_completions: u32,
    pub passing_yards:    i64,
    pub rushing_yards:    i64,
    pub receiving_yards:  i64,
    pub catches:          u32,
    pub drops:            u32,
    pub tackles:          u32,
    pub knockdowns:       u32,
    pub interceptions:    u32,
    pub fumbles:          u32,
    pub turnovers:        u32,
    pub scores:           u32,
}

impl PlayerStatLine {
    pub fn merge(&mut self, other: &PlayerStatLine) {
        self.pass_attempts += other.pass_attempts;
        self.pass_completions += other.pass_completions;
        self.passing_yards += other.passing_yards;
        self.rushing_yards += other.rushing_yards;
        self.receiving_yards += other.receiving_yards;
        self.catches += other.catches;
        self.drops += other.drops;
        self.tackles += other.tackles;
        self.knockdowns += other.knockdowns;
        self.interceptions += other.interceptions;
        self.fumbles += other.fumbles;
        self.turnovers += other.turnovers;
        self.scores += other.scores;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatLine {
    pub offensive_yards:            i64,
    pub time_of_possession_seconds: GameSeconds,
    pub turnovers:                  u32,
    pub knockdowns:                 u32,
}

impl TeamStatLine {
    pub fn merge(&mut self, other: &TeamStatLine) {
        self.offensive_yards += other.offensive_yards;
        self.time_of_possession_seconds += other.time_of_possession_seconds;
        self.turnovers += other.turnovers;
        self.knockdowns += other.knockdowns;
    }
}
