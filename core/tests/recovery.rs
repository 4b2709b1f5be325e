//! Restart reconciliation: a "live" row with no runner is rebuilt from
//! durable state and resumed, or completed outright if its natural end
//! already passed while the process was down.

use chrono::{Duration as ChronoDuration, Utc};
use gridiron_core::{
    EngineConfig, EngineError, LiveMatchEngine, MatchEvent, MatchEventKind, MatchId, MatchStatus,
    MatchStore, MatchUpdate, PlayerRole, SqliteStore, TeamId,
};
use std::sync::Arc;
use std::time::Duration;

const HOME: TeamId = 1;
const AWAY: TeamId = 2;

// Slow wall-to-sim conversion (30 sim seconds per wall second) keeps a
// just-created match near its stored game clock during the test.
fn test_config() -> EngineConfig {
    EngineConfig {
        tick_interval_ms: 1000,
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

async fn setup() -> (Arc<SqliteStore>, LiveMatchEngine) {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
    store.migrate().expect("migration");
    seed_team(&store, HOME);
    seed_team(&store, AWAY);
    let engine = LiveMatchEngine::new(
        test_config(),
        13,
        store.clone(),
        store.clone(),
        store.clone(),
    );
    (store, engine)
}

/// Write the durable shape of a crashed-mid-game match: live status,
/// a partial clock and score, no registered runner.
async fn crashed_match(
    store: &SqliteStore,
    game_time: u32,
    home_score: u32,
    away_score: u32,
    events: Option<Vec<MatchEvent>>,
) -> MatchId {
    let match_id = store
        .create_match(HOME, AWAY, Utc::now())
        .await
        .expect("create match");
    store
        .update_match(
            match_id,
            MatchUpdate {
                status: Some(MatchStatus::Live),
                home_score: Some(home_score),
                away_score: Some(away_score),
                game_time: Some(game_time),
                current_half: Some(1),
                event_window: events,
                ..Default::default()
            },
        )
        .await
        .expect("mark live");
    match_id
}

/// Unknown ids and rows that are not live both come back as not found.
#[tokio::test]
async fn sync_rejects_unknown_and_inert_matches() {
    let (store, engine) = setup().await;

    match engine.sync_match_state(9999).await {
        Err(EngineError::MatchNotFound { match_id }) => assert_eq!(match_id, 9999),
        other => panic!("expected MatchNotFound, got {other:?}"),
    }

    // A scheduled match has nothing to recover.
    let scheduled = store.create_match(HOME, AWAY, Utc::now()).await.expect("create");
    match engine.sync_match_state(scheduled).await {
        Err(EngineError::MatchNotFound { match_id }) => assert_eq!(match_id, scheduled),
        other => panic!("expected MatchNotFound, got {other:?}"),
    }
    assert!(engine.list_active_matches().await.is_empty());
}

/// Syncing a live row with no runner resumes it: clock and score come
/// from the row, possession follows the last recorded play, and the
/// match rejoins the active list.
#[tokio::test]
async fn sync_resumes_a_crashed_match() {
    let (store, engine) = setup().await;
    let events = vec![
        MatchEvent::new(570, MatchEventKind::Rush, "rush up the middle").team(AWAY),
    ];
    let match_id = crashed_match(&store, 600, 3, 2, Some(events)).await;

    let state = engine.sync_match_state(match_id).await.expect("sync");
    assert_eq!(state.status, MatchStatus::Live);
    assert_eq!(state.game_time, 600);
    assert_eq!(state.home_score, 3);
    assert_eq!(state.away_score, 2);
    assert_eq!(state.possessing_team_id, Some(AWAY));
    assert_eq!(state.events.len(), 1);

    assert_eq!(engine.list_active_matches().await.len(), 1);

    // A second sync reads the registered runner, not a fresh recovery.
    let again = engine.sync_match_state(match_id).await.expect("second sync");
    assert!(again.game_time >= 600);

    engine.stop_match(match_id);
    for _ in 0..500 {
        if engine.list_active_matches().await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let record = store.get_match(match_id).await.unwrap().unwrap();
    assert_eq!(record.status, MatchStatus::Completed);
    assert!(record.game_time >= 600);
}

/// A live row whose scheduled start is far enough in the past that the
/// whole game has elapsed is completed immediately, without ever being
/// registered.
#[tokio::test]
async fn sync_completes_an_expired_match() {
    let (store, engine) = setup().await;
    let match_id = store
        .create_match(HOME, AWAY, Utc::now() - ChronoDuration::seconds(120))
        .await
        .expect("create match");
    store
        .update_match(
            match_id,
            MatchUpdate {
                status: Some(MatchStatus::Live),
                home_score: Some(1),
                away_score: Some(4),
                game_time: Some(1500),
                current_half: Some(2),
                ..Default::default()
            },
        )
        .await
        .expect("mark live");

    let state = engine.sync_match_state(match_id).await.expect("sync");
    assert_eq!(state.status, MatchStatus::Completed);
    assert_eq!(state.game_time, 1800);
    assert!(engine.list_active_matches().await.is_empty());

    let record = store.get_match(match_id).await.unwrap().unwrap();
    assert_eq!(record.status, MatchStatus::Completed);
    assert_eq!(record.game_time, 1800);
    assert_eq!(record.home_score, 1);
    assert_eq!(record.away_score, 4);

    // Expired completion still rolls careers forward.
    for player_id in 1..=8 {
        let (games, _line) = store
            .career_totals(player_id)
            .expect("career read")
            .expect("career row exists");
        assert_eq!(games, 1);
    }
}

/// The match row stores its configured duration, so a crashed
/// exhibition past its 900-second end completes instead of resuming
/// toward regulation length.
#[tokio::test]
async fn recovered_exhibition_keeps_its_duration() {
    let (store, engine) = setup().await;
    let match_id = store
        .create_match(HOME, AWAY, Utc::now())
        .await
        .expect("create match");
    store
        .update_match(
            match_id,
            MatchUpdate {
                status: Some(MatchStatus::Live),
                home_score: Some(2),
                away_score: Some(1),
                game_time: Some(900),
                current_half: Some(2),
                max_time: Some(900),
                ..Default::default()
            },
        )
        .await
        .expect("mark live");

    let state = engine.sync_match_state(match_id).await.expect("sync");
    assert_eq!(state.max_time, 900);
    assert_eq!(state.game_time, 900);
    assert_eq!(state.status, MatchStatus::Completed);
    assert!(engine.list_active_matches().await.is_empty());

    let record = store.get_match(match_id).await.unwrap().unwrap();
    assert_eq!(record.status, MatchStatus::Completed);
    assert_eq!(record.max_time, 900);
    assert_eq!(record.game_time, 900);
}
