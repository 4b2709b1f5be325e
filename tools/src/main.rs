//! match-runner: headless live match driver.
//!
//! Seeds two rosters into a sqlite database, starts one live match at
//! an accelerated tick rate, and prints the final summary.
//!
//! Usage:
//!   match-runner --seed 42 --db match.db
//!   match-runner --seed 42 --exhibition --tick-ms 10

use anyhow::{anyhow, Result};
use chrono::Utc;
use gridiron_core::{
    EngineConfig, LiveMatchEngine, MatchStore, PlayerRole, SqliteStore, TeamId,
};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const HOME_TEAM: TeamId = 1;
const AWAY_TEAM: TeamId = 2;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let tick_ms = parse_arg(&args, "--tick-ms", 20u64);
    let exhibition = args.iter().any(|a| a == "--exhibition");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| ":memory:".to_string());

    println!("match-runner");
    println!("  seed:    {seed}");
    println!("  db:      {db}");
    println!("  tick:    {tick_ms} ms");
    println!();

    let store = Arc::new(if db == ":memory:" {
        SqliteStore::in_memory()?
    } else {
        SqliteStore::open(&db)?
    });
    store.migrate()?;
    log::info!("schema ready ({db})");

    seed_roster(&store, HOME_TEAM, &HOME_NAMES)?;
    seed_roster(&store, AWAY_TEAM, &AWAY_NAMES)?;

    let match_id = store.create_match(HOME_TEAM, AWAY_TEAM, Utc::now()).await?;
    log::info!("created match {match_id}");

    let config = EngineConfig {
        tick_interval_ms: tick_ms,
        ..Default::default()
    };
    let engine = LiveMatchEngine::new(
        config,
        seed,
        store.clone(),
        store.clone(),
        store.clone(),
    );

    let state = engine.start_live_match(match_id, exhibition).await?;
    println!(
        "kickoff: team {HOME_TEAM} vs team {AWAY_TEAM}, {} simulated seconds",
        state.max_time
    );

    loop {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let active = engine.list_active_matches().await;
        match active.iter().find(|s| s.match_id == match_id) {
            Some(s) => println!(
                "  [{:>4}s] {}-{}  half {}",
                s.game_time, s.home_score, s.away_score, s.current_half
            ),
            None => break,
        }
    }

    let record = store
        .get_match(match_id)
        .await?
        .ok_or_else(|| anyhow!("final match record missing"))?;

    println!();
    println!(
        "FINAL: team {HOME_TEAM} {} — team {AWAY_TEAM} {}  ({})",
        record.home_score,
        record.away_score,
        record.status.as_str()
    );
    println!();
    println!("last plays:");
    for event in record.event_window.iter().rev().take(5).rev() {
        println!("  [{:>4}s] {}", event.time, event.description);
    }

    println!();
    for team in [HOME_TEAM, AWAY_TEAM] {
        if let Some(line) = store.team_stats_row(match_id, team)? {
            println!(
                "team {team}: {} yards, {}s possession, {} turnovers, {} knockdowns",
                line.offensive_yards,
                line.time_of_possession_seconds,
                line.turnovers,
                line.knockdowns
            );
        }
    }

    Ok(())
}

const HOME_NAMES: [(&str, PlayerRole); 6] = [
    ("Dex Harmon", PlayerRole::Passer),
    ("Toro Vance", PlayerRole::Rusher),
    ("Miles Okafor", PlayerRole::Rusher),
    ("Jet Calloway", PlayerRole::Receiver),
    ("Reno Parks", PlayerRole::Receiver),
    ("Brick Tatum", PlayerRole::Defender),
];

const AWAY_NAMES: [(&str, PlayerRole); 6] = [
    ("Ash Caldera", PlayerRole::Passer),
    ("Gunnar Holt", PlayerRole::Rusher),
    ("Fen Marlow", PlayerRole::Rusher),
    ("Sky Donovan", PlayerRole::Receiver),
    ("Creed Abara", PlayerRole::Receiver),
    ("Moss Killian", PlayerRole::Defender),
];

fn seed_roster(store: &SqliteStore, team_id: TeamId, names: &[(&str, PlayerRole)]) -> Result<()> {
    for (i, (name, role)) in names.iter().enumerate() {
        // Spread attributes so rosters are uneven but plausible.
        let base = 55 + (i as u8 * 7) % 35;
        store.insert_player(team_id, name, *role, base, base, base, base, base)?;
    }
    Ok(())
}

fn parse_arg<T: FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
