//! The match runner — one task per live match.
//!
//! RULE: The runner is the only writer of its match's state. Each tick
//! runs to completion before the next is considered (missed ticks are
//! skipped, never stacked), so a slow persistence write can delay the
//! simulation but never overlap it.

use crate::engine::EngineDeps;
use crate::event::{MatchEvent, MatchEventKind};
use crate::generator::generate_play;
use crate::registry::MatchHandle;
use crate::rng::MatchRng;
use crate::roster::Player;
use crate::state::{LiveMatchState, MatchStatus};
use crate::store::{CareerDelta, MatchUpdate};
use crate::error::EngineResult;
use crate::types::GameSeconds;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;

pub struct MatchRunner {
    deps: Arc<EngineDeps>,
    state: Arc<RwLock<LiveMatchState>>,
    handle: MatchHandle,
    home_roster: Vec<Player>,
    away_roster: Vec<Player>,
    rng: MatchRng,
    stop_rx: watch::Receiver<bool>,
    last_snapshot: GameSeconds,
}

impl MatchRunner {
    /// Register a handle for `state` and spawn the tick loop. Fails
    /// without spawning anything if the match already has a runner.
    pub fn launch(
        deps: Arc<EngineDeps>,
        state: LiveMatchState,
        home_roster: Vec<Player>,
        away_roster: Vec<Player>,
        rng: MatchRng,
    ) -> EngineResult<MatchHandle> {
        let match_id = state.match_id;
        let shared = Arc::new(RwLock::new(state));
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = MatchHandle::new(match_id, shared.clone(), stop_tx);

        deps.registry.register(handle.clone())?;

        let runner = MatchRunner {
            deps,
            state: shared,
            handle: handle.clone(),
            home_roster,
            away_roster,
            rng,
            stop_rx,
            last_snapshot: 0,
        };
        tokio::spawn(runner.run());
        Ok(handle)
    }

    async fn run(mut self) {
        let match_id = self.handle.match_id;
        log::info!("match {match_id}: runner started");

        let mut interval = tokio::time::interval(self.deps.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.stop_rx.changed() => {
                    log::info!("match {match_id}: stop requested, completing early");
                    break;
                }
                _ = interval.tick() => {
                    if self.tick().await {
                        break;
                    }
                }
            }
        }

        self.complete().await;
    }

    /// One simulation step. Returns true once the match has run its
    /// full duration.
    async fn tick(&mut self) -> bool {
        let (game_time, finished) = {
            let mut state = self.state.write().await;
            if state.is_completed() {
                return true;
            }

            // Clamp the final tick so possession time never outruns
            // the game clock.
            let advance = self
                .deps
                .config
                .seconds_per_tick
                .min(state.max_time - state.game_time);
            state.game_time += advance;
            state.accrue_possession(advance);

            if self.rng.chance(self.deps.config.event_probability) {
                if let Some(outcome) =
                    generate_play(&state, &self.home_roster, &self.away_roster, &mut self.rng)
                {
                    log::debug!(
                        "match {} [{}s] {}",
                        state.match_id,
                        state.game_time,
                        outcome.event.description
                    );
                    state.apply(outcome);
                }
            }

            if state.current_half == 1 && state.game_time >= state.max_time / 2 {
                state.current_half = 2;
                let receiver = state.other_team(state.opening_possession);
                state.change_possession(receiver);
                let halftime = MatchEvent::new(
                    state.game_time,
                    MatchEventKind::Halftime,
                    format!("Halftime — team {receiver} receives the second-half kickoff"),
                )
                .team(receiver);
                state.record_event(halftime);
                log::debug!("match {}: halftime at {}s", state.match_id, state.game_time);
            }

            (state.game_time, state.game_time >= state.max_time)
        };

        self.handle.touch();

        if finished {
            return true;
        }
        // Elapsed-based cadence: fires even when the per-tick advance
        // does not divide the snapshot interval.
        if game_time - self.last_snapshot >= self.deps.config.snapshot_interval_secs {
            match self.persist_snapshot().await {
                Ok(()) => self.last_snapshot = game_time,
                Err(e) => {
                    // Swallowed: the next tick retries with fresher data.
                    log::warn!(
                        "match {}: snapshot write failed, retrying next tick: {e}",
                        self.handle.match_id
                    );
                }
            }
        }
        false
    }

    /// Periodic partial write: score, status, clock, trailing events.
    async fn persist_snapshot(&self) -> EngineResult<()> {
        let update = {
            let state = self.state.read().await;
            MatchUpdate {
                status: Some(state.status),
                home_score: Some(state.home_score),
                away_score: Some(state.away_score),
                game_time: Some(state.game_time),
                current_half: Some(state.current_half),
                max_time: None,
                event_window: Some(state.events.clone()),
                error: None,
            }
        };
        self.deps
            .match_store
            .update_match(self.handle.match_id, update)
            .await
    }

    async fn complete(self) {
        {
            let mut state = self.state.write().await;
            finalize_match(&self.deps, &mut state).await;
        }
        self.deps.registry.remove(self.handle.match_id);

        let state = self.state.read().await;
        log::info!(
            "match {}: completed {}–{} at {}s",
            state.match_id,
            state.home_score,
            state.away_score,
            state.game_time
        );
    }
}

/// Shared completion path: natural end, explicit stop, abandonment
/// sweep, and recovery of an over-elapsed match all land here.
/// Idempotent — a second call on a completed state does nothing.
pub(crate) async fn finalize_match(deps: &EngineDeps, state: &mut LiveMatchState) {
    if state.is_completed() {
        return;
    }
    state.status = MatchStatus::Completed;

    if let Err(e) = persist_completion(deps, state).await {
        log::error!(
            "match {}: completion write failed: {e}",
            state.match_id
        );
        // Do not leave the row perpetually "live": mark it completed
        // with the failure annotated on the record.
        let fallback = MatchUpdate {
            status: Some(MatchStatus::Completed),
            error: Some(format!("completion persistence failed: {e}")),
            ..Default::default()
        };
        if let Err(e2) = deps.match_store.update_match(state.match_id, fallback).await {
            log::error!(
                "match {}: could not annotate completion failure: {e2}",
                state.match_id
            );
        }
    }
}

/// The completion unit of work. Stat rows are written first and are
/// best-effort; the match-status write goes last so a partial failure
/// leaves the row "live" rather than falsely "completed".
async fn persist_completion(deps: &EngineDeps, state: &LiveMatchState) -> EngineResult<()> {
    let match_id = state.match_id;
    let mut side_failure: Option<String> = None;

    for (player_id, line) in &state.player_stats {
        if let Err(e) = deps
            .stats
            .record_player_match_stats(match_id, *player_id, line)
            .await
        {
            log::warn!("match {match_id}: player {player_id} stat row failed: {e}");
            side_failure.get_or_insert_with(|| e.to_string());
        }
        let delta = CareerDelta {
            games_played: 1,
            stats: *line,
        };
        if let Err(e) = deps.stats.accumulate_career_stats(*player_id, &delta).await {
            log::warn!("match {match_id}: player {player_id} career rollup failed: {e}");
            side_failure.get_or_insert_with(|| e.to_string());
        }
    }

    for (team_id, line) in &state.team_stats {
        if let Err(e) = deps
            .stats
            .record_team_match_stats(match_id, *team_id, line)
            .await
        {
            log::warn!("match {match_id}: team {team_id} stat row failed: {e}");
            side_failure.get_or_insert_with(|| e.to_string());
        }
    }

    let update = MatchUpdate {
        status: Some(MatchStatus::Completed),
        home_score: Some(state.home_score),
        away_score: Some(state.away_score),
        game_time: Some(state.game_time),
        current_half: Some(state.current_half),
        max_time: None,
        event_window: Some(state.events.clone()),
        error: side_failure,
    };
    deps.match_store.update_match(match_id, update).await
}
