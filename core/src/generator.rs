//! Play-by-play generation.
//!
//! RULE: generate_play is pure with respect to the state it reads.
//! It performs no I/O and never mutates the match — it returns a
//! PlayOutcome that the runner applies. All randomness comes from the
//! caller's MatchRng, so a seed fully determines the play sequence.
//!
//! The stat model is intentionally simple: attribute-weighted dice,
//! not a tactical simulation.

use crate::event::{MatchEvent, MatchEventKind};
use crate::rng::MatchRng;
use crate::roster::{Player, PlayerRole};
use crate::state::LiveMatchState;
use crate::stats::{PlayerStatLine, TeamStatLine};
use crate::types::{PlayerId, TeamId};
use serde_json::json;

// Action mix per generated play.
const PASS_WEIGHT: f64 = 0.55;
const RUSH_WEIGHT: f64 = 0.35; // remainder is a defensive play

// Pass resolution.
const PASS_BASE_COMPLETION: f64 = 0.35;
const PASS_MIN_COMPLETION: f64 = 0.15;
const PASS_MAX_COMPLETION: f64 = 0.90;
const PASS_SCORE_CHANCE: f64 = 0.12;
const PASS_DROP_SHARE: f64 = 0.40; // of failed passes
const PASS_DEFENDED_SHARE: f64 = 0.35; // of failed passes; rest intercept

// Rush resolution.
const RUSH_BASELINE: i64 = 6;
const RUSH_SCORE_CHANCE: f64 = 0.05;
const RUSH_FUMBLE_CHANCE: f64 = 0.04;

// Defensive play mix.
const KNOCKDOWN_SHARE: f64 = 0.30;

// Passers are three times as likely to take the snap.
const PASSER_SELECTION_WEIGHT: u64 = 3;

/// Everything a single play changes, as data. The runner hands this to
/// LiveMatchState::apply.
#[derive(Debug, Clone)]
pub struct PlayOutcome {
    pub event: MatchEvent,
    pub player_deltas: Vec<(PlayerId, PlayerStatLine)>,
    pub team_deltas: Vec<(TeamId, TeamStatLine)>,
    /// Exactly one team, on a score event only. Worth one point.
    pub scoring_team: Option<TeamId>,
    /// Set whenever the play flips possession (score, turnover, drop).
    pub new_possession: Option<TeamId>,
}

impl PlayOutcome {
    fn from_event(event: MatchEvent) -> Self {
        Self {
            event,
            player_deltas: Vec::new(),
            team_deltas: Vec::new(),
            scoring_team: None,
            new_possession: None,
        }
    }

    fn player(mut self, id: PlayerId, delta: PlayerStatLine) -> Self {
        self.player_deltas.push((id, delta));
        self
    }

    fn team(mut self, id: TeamId, delta: TeamStatLine) -> Self {
        self.team_deltas.push((id, delta));
        self
    }
}

/// Produce at most one play for the current tick.
///
/// Returns None when no team holds the ball or the possessing team has
/// no eligible players — the clock still runs, nothing happens.
pub fn generate_play(
    state: &LiveMatchState,
    home_roster: &[Player],
    away_roster: &[Player],
    rng: &mut MatchRng,
) -> Option<PlayOutcome> {
    let possessing = state.possessing_team_id?;

    let (offense, defense) = if possessing == state.home_team_id {
        (home_roster, away_roster)
    } else {
        (away_roster, home_roster)
    };
    if offense.is_empty() {
        return None;
    }

    let actor = select_actor(offense, rng);
    let defending_team = state.other_team(possessing);

    let roll = rng.next_f64();
    if roll < PASS_WEIGHT {
        Some(resolve_pass(state, actor, offense, defense, possessing, defending_team, rng))
    } else if roll < PASS_WEIGHT + RUSH_WEIGHT || defense.is_empty() {
        Some(resolve_rush(state, actor, possessing, defending_team, rng))
    } else {
        resolve_defensive_play(state, defense, defending_team, rng)
    }
}

/// Pick the acting player, biased toward passers.
fn select_actor<'a>(offense: &'a [Player], rng: &mut MatchRng) -> &'a Player {
    let total: u64 = offense.iter().map(selection_weight).sum();
    let mut roll = rng.next_u64_below(total);
    for p in offense {
        let w = selection_weight(p);
        if roll < w {
            return p;
        }
        roll -= w;
    }
    // Unreachable: weights sum to total.
    &offense[offense.len() - 1]
}

fn selection_weight(p: &Player) -> u64 {
    if p.role == PlayerRole::Passer {
        PASSER_SELECTION_WEIGHT
    } else {
        1
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_pass(
    state: &LiveMatchState,
    thrower: &Player,
    offense: &[Player],
    defense: &[Player],
    possessing: TeamId,
    defending_team: TeamId,
    rng: &mut MatchRng,
) -> PlayOutcome {
    let targets: Vec<&Player> = offense.iter().filter(|p| p.id != thrower.id).collect();
    let Some(target) = rng.pick(&targets).copied() else {
        // Minimum viable roster of one: nobody to throw to.
        let event = MatchEvent::new(
            state.game_time,
            MatchEventKind::NoOneOpen,
            format!("{} looks downfield but no one is open", thrower.name),
        )
        .acting(thrower.id)
        .team(possessing);
        return PlayOutcome::from_event(event);
    };
    let defender = rng.pick(defense);

    let interference = defender.map(|d| d.agility as f64 / 500.0).unwrap_or(0.0);
    let completion = (PASS_BASE_COMPLETION + thrower.throwing as f64 / 250.0 - interference)
        .clamp(PASS_MIN_COMPLETION, PASS_MAX_COMPLETION);

    let mut thrower_delta = PlayerStatLine {
        pass_attempts: 1,
        ..Default::default()
    };

    if rng.chance(completion) {
        let ceiling = (target.catching as u64 / 8) + (target.speed as u64 / 12) + 1;
        let yards = 4 + rng.next_u64_below(ceiling) as i64;

        thrower_delta.pass_completions = 1;
        thrower_delta.passing_yards = yards;
        let target_delta = PlayerStatLine {
            catches: 1,
            receiving_yards: yards,
            ..Default::default()
        };
        let team_delta = TeamStatLine {
            offensive_yards: yards,
            ..Default::default()
        };

        if rng.chance(PASS_SCORE_CHANCE) {
            let mut target_delta = target_delta;
            target_delta.scores = 1;
            let event = MatchEvent::new(
                state.game_time,
                MatchEventKind::Score,
                format!(
                    "{} hits {} for a {}-yard score",
                    thrower.name, target.name, yards
                ),
            )
            .acting(thrower.id)
            .target(target.id)
            .team(possessing)
            .data(json!({ "yards": yards }));

            let mut outcome = PlayOutcome::from_event(event)
                .player(thrower.id, thrower_delta)
                .player(target.id, target_delta)
                .team(possessing, team_delta);
            outcome.scoring_team = Some(possessing);
            // Kickoff-equivalent: the scored-on team takes over.
            outcome.new_possession = Some(defending_team);
            return outcome;
        }

        let event = MatchEvent::new(
            state.game_time,
            MatchEventKind::PassComplete,
            format!(
                "{} completes to {} for {} yards",
                thrower.name, target.name, yards
            ),
        )
        .acting(thrower.id)
        .target(target.id)
        .team(possessing)
        .data(json!({ "yards": yards }));

        return PlayOutcome::from_event(event)
            .player(thrower.id, thrower_delta)
            .player(target.id, target_delta)
            .team(possessing, team_delta);
    }

    // Incompletion: drop, defended, or picked off. All hand the ball over.
    let failure = rng.next_f64();
    if failure < PASS_DROP_SHARE {
        let target_delta = PlayerStatLine {
            drops: 1,
            ..Default::default()
        };
        let event = MatchEvent::new(
            state.game_time,
            MatchEventKind::PassDrop,
            format!("{} drops the pass from {}", target.name, thrower.name),
        )
        .acting(thrower.id)
        .target(target.id)
        .team(possessing);

        let mut outcome = PlayOutcome::from_event(event)
            .player(thrower.id, thrower_delta)
            .player(target.id, target_delta);
        outcome.new_possession = Some(defending_team);
        return outcome;
    }

    if failure < PASS_DROP_SHARE + PASS_DEFENDED_SHARE || defender.is_none() {
        let mut event = MatchEvent::new(
            state.game_time,
            MatchEventKind::PassIncomplete,
            match defender {
                Some(d) => format!("{}'s pass broken up by {}", thrower.name, d.name),
                None => format!("{}'s pass falls incomplete", thrower.name),
            },
        )
        .acting(thrower.id)
        .target(target.id)
        .team(possessing);
        if let Some(d) = defender {
            event = event.defender(d.id);
        }

        let mut outcome = PlayOutcome::from_event(event).player(thrower.id, thrower_delta);
        outcome.new_possession = Some(defending_team);
        return outcome;
    }

    // defender.is_some() guaranteed by the branch above.
    let picker = defender.unwrap();
    thrower_delta.turnovers = 1;
    let picker_delta = PlayerStatLine {
        interceptions: 1,
        ..Default::default()
    };
    let team_delta = TeamStatLine {
        turnovers: 1,
        ..Default::default()
    };
    let event = MatchEvent::new(
        state.game_time,
        MatchEventKind::Interception,
        format!("{} intercepts {}'s pass", picker.name, thrower.name),
    )
    .acting(thrower.id)
    .target(target.id)
    .defender(picker.id)
    .team(possessing);

    let mut outcome = PlayOutcome::from_event(event)
        .player(thrower.id, thrower_delta)
        .player(picker.id, picker_delta)
        .team(possessing, team_delta);
    outcome.new_possession = Some(defending_team);
    outcome
}

fn resolve_rush(
    state: &LiveMatchState,
    runner: &Player,
    possessing: TeamId,
    defending_team: TeamId,
    rng: &mut MatchRng,
) -> PlayOutcome {
    let burst = (runner.speed as i64 + runner.power as i64) / 20;
    let yards = burst + rng.next_u64_below(12) as i64 - RUSH_BASELINE;

    let runner_delta = PlayerStatLine {
        rushing_yards: yards,
        ..Default::default()
    };
    let team_delta = TeamStatLine {
        offensive_yards: yards,
        ..Default::default()
    };

    // A fumble can happen whatever the yardage came to.
    if rng.chance(RUSH_FUMBLE_CHANCE) {
        let mut runner_delta = runner_delta;
        runner_delta.fumbles = 1;
        runner_delta.turnovers = 1;
        let mut team_delta = team_delta;
        team_delta.turnovers = 1;

        let event = MatchEvent::new(
            state.game_time,
            MatchEventKind::Fumble,
            format!("{} coughs up the ball on the run", runner.name),
        )
        .acting(runner.id)
        .team(possessing)
        .data(json!({ "yards": yards }));

        let mut outcome = PlayOutcome::from_event(event)
            .player(runner.id, runner_delta)
            .team(possessing, team_delta);
        outcome.new_possession = Some(defending_team);
        return outcome;
    }

    if yards > 0 && rng.chance(RUSH_SCORE_CHANCE) {
        let mut runner_delta = runner_delta;
        runner_delta.scores = 1;

        let event = MatchEvent::new(
            state.game_time,
            MatchEventKind::Score,
            format!("{} breaks free for a {}-yard score", runner.name, yards),
        )
        .acting(runner.id)
        .team(possessing)
        .data(json!({ "yards": yards }));

        let mut outcome = PlayOutcome::from_event(event)
            .player(runner.id, runner_delta)
            .team(possessing, team_delta);
        outcome.scoring_team = Some(possessing);
        outcome.new_possession = Some(defending_team);
        return outcome;
    }

    let description = if yards <= 0 {
        format!("{} is stuffed at the line", runner.name)
    } else {
        format!("{} rushes for {} yards", runner.name, yards)
    };
    let event = MatchEvent::new(state.game_time, MatchEventKind::Rush, description)
        .acting(runner.id)
        .team(possessing)
        .data(json!({ "yards": yards }));

    PlayOutcome::from_event(event)
        .player(runner.id, runner_delta)
        .team(possessing, team_delta)
}

/// A defensive stop: tackle or blocking knockdown. Stat credit only —
/// possession stays where it was.
fn resolve_defensive_play(
    state: &LiveMatchState,
    defense: &[Player],
    defending_team: TeamId,
    rng: &mut MatchRng,
) -> Option<PlayOutcome> {
    let defender = rng.pick(defense)?;

    if rng.chance(KNOCKDOWN_SHARE) {
        let delta = PlayerStatLine {
            knockdowns: 1,
            ..Default::default()
        };
        let team_delta = TeamStatLine {
            knockdowns: 1,
            ..Default::default()
        };
        let event = MatchEvent::new(
            state.game_time,
            MatchEventKind::Knockdown,
            format!("{} levels his man with a crushing block", defender.name),
        )
        .defender(defender.id)
        .team(defending_team);

        return Some(
            PlayOutcome::from_event(event)
                .player(defender.id, delta)
                .team(defending_team, team_delta),
        );
    }

    let delta = PlayerStatLine {
        tackles: 1,
        ..Default::default()
    };
    let event = MatchEvent::new(
        state.game_time,
        MatchEventKind::Tackle,
        format!("{} wraps up the ball carrier", defender.name),
    )
    .defender(defender.id)
    .team(defending_team);

    Some(PlayOutcome::from_event(event).player(defender.id, delta))
}
