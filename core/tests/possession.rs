//! Time-of-possession accounting: the two teams' possession clocks
//! always sum to exactly the elapsed game clock, live and at rest.

use chrono::Utc;
use gridiron_core::{
    EngineConfig, LiveMatchEngine, MatchId, MatchStatus, MatchStore, PlayerRole, SqliteStore,
    TeamId,
};
use std::sync::Arc;
use std::time::Duration;

const HOME: TeamId = 1;
const AWAY: TeamId = 2;

fn test_config() -> EngineConfig {
    EngineConfig {
        tick_interval_ms: 2,
        ..Default::default()
    }
}

fn seed_team(store: &SqliteStore, team_id: TeamId) {
    let roles = [
        PlayerRole::Passer,
        PlayerRole::Rusher,
        PlayerRole::Receiver,
        PlayerRole::Defender,
    ];
    for (i, role) in roles.iter().enumerate() {
        store
            .insert_player(team_id, &format!("T{team_id}-P{i}"), *role, 70, 65, 60, 55, 50)
            .expect("seed player");
    }
}

async fn setup() -> (Arc<SqliteStore>, LiveMatchEngine, MatchId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
    store.migrate().expect("migration");
    seed_team(&store, HOME);
    seed_team(&store, AWAY);
    let match_id = store
        .create_match(HOME, AWAY, Utc::now())
        .await
        .expect("create match");
    let engine = LiveMatchEngine::new(
        test_config(),
        11,
        store.clone(),
        store.clone(),
        store.clone(),
    );
    (store, engine, match_id)
}

/// While the match is live, home TOP + away TOP equals game_time on
/// every observed snapshot. The snapshot is taken under the state
/// lock, so there is no in-between reading.
#[tokio::test]
async fn possession_clocks_sum_to_game_time_live() {
    let (_store, engine, match_id) = setup().await;
    engine.start_live_match(match_id, false).await.expect("start");

    let mut observed = 0;
    loop {
        match engine.sync_match_state(match_id).await {
            Ok(state) if state.status == MatchStatus::Live => {
                let home_top = state
                    .team_stats
                    .get(&HOME)
                    .map(|s| s.time_of_possession_seconds)
                    .unwrap_or(0);
                let away_top = state
                    .team_stats
                    .get(&AWAY)
                    .map(|s| s.time_of_possession_seconds)
                    .unwrap_or(0);
                assert_eq!(
                    home_top + away_top,
                    state.game_time,
                    "TOP drifted from the game clock at {}",
                    state.game_time
                );
                observed += 1;
            }
            _ => break,
        }
        tokio::time::sleep(Duration::from_millis(3)).await;
    }
    assert!(observed > 0, "never observed a live snapshot");
}

/// After completion the persisted team rows still account for every
/// second of regulation, and both teams have a recorded row.
#[tokio::test]
async fn persisted_possession_accounts_for_full_match() {
    let (store, engine, match_id) = setup().await;
    engine.start_live_match(match_id, false).await.expect("start");

    while matches!(
        engine.sync_match_state(match_id).await,
        Ok(state) if state.status == MatchStatus::Live
    ) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // Give the completion write a moment to land.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let home = store
        .team_stats_row(match_id, HOME)
        .expect("read home row")
        .expect("home row exists");
    let away = store
        .team_stats_row(match_id, AWAY)
        .expect("read away row")
        .expect("away row exists");

    assert_eq!(
        home.time_of_possession_seconds + away.time_of_possession_seconds,
        1800
    );
    assert!(home.time_of_possession_seconds > 0);
    assert!(away.time_of_possession_seconds > 0);
}
