//! The engine's public surface — what the route layer calls.
//!
//! One LiveMatchEngine per process, constructed at service startup and
//! shared by handle. There is no ambient global registry: everything
//! hangs off the EngineDeps the engine was built with.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::event::{MatchEvent, MatchEventKind};
use crate::recovery;
use crate::registry::{spawn_sweeper, MatchRegistry};
use crate::rng::MatchRng;
use crate::runner::MatchRunner;
use crate::state::{LiveMatchState, MatchStatus};
use crate::store::{MatchStore, MatchUpdate, RosterProvider, StatsStore};
use crate::types::MatchId;
use std::sync::Arc;

/// Everything a runner or recovery task needs, bundled once.
pub struct EngineDeps {
    pub config: EngineConfig,
    pub master_seed: u64,
    pub match_store: Arc<dyn MatchStore>,
    pub rosters: Arc<dyn RosterProvider>,
    pub stats: Arc<dyn StatsStore>,
    pub registry: Arc<MatchRegistry>,
}

pub struct LiveMatchEngine {
    deps: Arc<EngineDeps>,
}

impl LiveMatchEngine {
    /// Wire the engine and start the abandonment sweep. Must be called
    /// from within a tokio runtime.
    pub fn new(
        config: EngineConfig,
        master_seed: u64,
        match_store: Arc<dyn MatchStore>,
        rosters: Arc<dyn RosterProvider>,
        stats: Arc<dyn StatsStore>,
    ) -> Self {
        let deps = Arc::new(EngineDeps {
            config,
            master_seed,
            match_store,
            rosters,
            stats,
            registry: Arc::new(MatchRegistry::new()),
        });
        spawn_sweeper(deps.clone());
        Self { deps }
    }

    /// Begin live simulation of a scheduled match.
    ///
    /// Fails before any runner exists if the match record is missing,
    /// either roster is empty, or a runner is already registered.
    pub async fn start_live_match(
        &self,
        match_id: MatchId,
        exhibition: bool,
    ) -> EngineResult<LiveMatchState> {
        let deps = &self.deps;
        if deps.registry.lookup(match_id).is_some() {
            return Err(EngineError::MatchAlreadyRunning { match_id });
        }

        let record = deps
            .match_store
            .get_match(match_id)
            .await?
            .ok_or(EngineError::MatchNotFound { match_id })?;

        let home_roster = deps.rosters.active_players(record.home_team_id).await?;
        if home_roster.is_empty() {
            return Err(EngineError::EmptyRoster {
                team_id: record.home_team_id,
            });
        }
        let away_roster = deps.rosters.active_players(record.away_team_id).await?;
        if away_roster.is_empty() {
            return Err(EngineError::EmptyRoster {
                team_id: record.away_team_id,
            });
        }

        let mut rng = MatchRng::for_match(deps.master_seed, match_id);
        let opening = if rng.chance(0.5) {
            record.home_team_id
        } else {
            record.away_team_id
        };

        let mut state = LiveMatchState::new(
            match_id,
            record.home_team_id,
            record.away_team_id,
            deps.config.max_time(exhibition),
            deps.config.event_window,
            &home_roster,
            &away_roster,
            opening,
        );
        state.record_event(
            MatchEvent::new(
                0,
                MatchEventKind::Kickoff,
                format!("Team {opening} receives the opening kickoff"),
            )
            .team(opening),
        );

        // Mark the row live before ticking starts: a crash from here on
        // leaves a recoverable record.
        deps.match_store
            .update_match(
                match_id,
                MatchUpdate {
                    status: Some(MatchStatus::Live),
                    home_score: Some(0),
                    away_score: Some(0),
                    game_time: Some(0),
                    current_half: Some(1),
                    max_time: Some(state.max_time),
                    event_window: Some(state.events.clone()),
                    error: None,
                },
            )
            .await?;

        MatchRunner::launch(deps.clone(), state.clone(), home_roster, away_roster, rng)?;
        log::info!(
            "match {match_id}: live, team {} vs team {}, {}s",
            record.home_team_id,
            record.away_team_id,
            state.max_time
        );
        Ok(state)
    }

    /// Current state of a match, recovering it from durable storage if
    /// this process has no runner for it.
    pub async fn sync_match_state(&self, match_id: MatchId) -> EngineResult<LiveMatchState> {
        if let Some(handle) = self.deps.registry.lookup(match_id) {
            return Ok(handle.snapshot().await);
        }
        match recovery::reconcile(&self.deps, match_id).await {
            Err(EngineError::MatchAlreadyRunning { .. }) => {
                // Another caller recovered it first; that runner is
                // authoritative.
                match self.deps.registry.lookup(match_id) {
                    Some(handle) => Ok(handle.snapshot().await),
                    None => Err(EngineError::MatchNotFound { match_id }),
                }
            }
            other => other,
        }
    }

    /// Force early completion. Idempotent: unknown or already-completed
    /// matches are a silent no-op.
    pub fn stop_match(&self, match_id: MatchId) {
        if let Some(handle) = self.deps.registry.lookup(match_id) {
            log::info!("match {match_id}: stop requested by caller");
            handle.signal_stop();
        }
    }

    pub async fn list_active_matches(&self) -> Vec<LiveMatchState> {
        let mut states = Vec::new();
        for handle in self.deps.registry.list_active() {
            states.push(handle.snapshot().await);
        }
        states
    }
}
