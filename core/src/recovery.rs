//! Recovery reconciliation — rebuilding a live match after a restart.
//!
//! A match row marked "live" with no registered runner means the
//! process died mid-game. We reconstruct an approximate state from the
//! row and resume, or complete immediately if the match should already
//! have ended. In-progress player and team stats are not snapshotted,
//! so a recovered match restarts them at zero.

use crate::engine::EngineDeps;
use crate::error::{EngineError, EngineResult};
use crate::rng::MatchRng;
use crate::runner::{finalize_match, MatchRunner};
use crate::state::{LiveMatchState, MatchStatus};
use crate::types::{GameSeconds, MatchId};
use chrono::Utc;
use std::sync::Arc;

/// Reconcile a match that has no registry entry against durable state.
/// Returns the reconstructed state (possibly already completed), or
/// MatchNotFound when the stored record is absent or not live.
pub(crate) async fn reconcile(
    deps: &Arc<EngineDeps>,
    match_id: MatchId,
) -> EngineResult<LiveMatchState> {
    let Some(record) = deps.match_store.get_match(match_id).await? else {
        return Err(EngineError::MatchNotFound { match_id });
    };
    if record.status != MatchStatus::Live {
        return Err(EngineError::MatchNotFound { match_id });
    }

    let cfg = &deps.config;

    // Wall time since the scheduled start, converted at the configured
    // simulation rate, tells us roughly where the game clock should be.
    // Never rewind behind the last persisted snapshot.
    let sim_per_wall_sec =
        cfg.seconds_per_tick as f64 * 1000.0 / cfg.tick_interval_ms as f64;
    let wall_elapsed = (Utc::now() - record.scheduled_time).num_seconds().max(0) as f64;
    let mut elapsed = (wall_elapsed * sim_per_wall_sec) as GameSeconds;
    elapsed = elapsed.max(record.game_time);
    elapsed -= elapsed % cfg.seconds_per_tick;

    // Duration is written at the initial live update, so an exhibition
    // recovers with its real length.
    let max_time = record.max_time;

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

    // Possession: whoever the last recorded play credits, else a coin flip.
    let possession = record
        .event_window
        .iter()
        .rev()
        .find_map(|e| e.team_id)
        .unwrap_or_else(|| {
            if rng.chance(0.5) {
                record.home_team_id
            } else {
                record.away_team_id
            }
        });

    let mut state = LiveMatchState::new(
        match_id,
        record.home_team_id,
        record.away_team_id,
        max_time,
        cfg.event_window,
        &home_roster,
        &away_roster,
        possession,
    );
    state.game_time = elapsed.min(max_time);
    state.possession_start_time = state.game_time;
    state.home_score = record.home_score;
    state.away_score = record.away_score;
    state.current_half = record.current_half.max(1);
    state.events = record.event_window.clone();

    if state.game_time >= max_time {
        // The match missed its natural end while the process was down.
        log::warn!(
            "match {match_id}: recovered past its full duration ({}s), completing",
            state.game_time
        );
        finalize_match(deps, &mut state).await;
        return Ok(state);
    }

    log::info!(
        "match {match_id}: recovered at {}s ({}–{}), resuming",
        state.game_time,
        state.home_score,
        state.away_score
    );
    MatchRunner::launch(
        deps.clone(),
        state.clone(),
        home_roster,
        away_roster,
        rng,
    )?;
    Ok(state)
}
