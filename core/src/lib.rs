//! Live match simulation engine.
//!
//! Advances in-progress matches through simulated time: one tokio task
//! per match generates play-by-play events from player attributes and
//! probability, tracks running statistics, snapshots to durable
//! storage, and resumes from that storage after a restart.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod recovery;
pub mod registry;
pub mod rng;
pub mod roster;
pub mod runner;
pub mod state;
pub mod stats;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use engine::LiveMatchEngine;
pub use error::{EngineError, EngineResult};
pub use event::{MatchEvent, MatchEventKind};
pub use roster::{Player, PlayerRole};
pub use state::{LiveMatchState, MatchStatus};
pub use stats::{PlayerStatLine, TeamStatLine};
pub use store::{
    CareerDelta, MatchRecord, MatchStore, MatchUpdate, RosterProvider, SqliteStore, StatsStore,
};
pub use types::{GameSeconds, MatchId, PlayerId, TeamId};
