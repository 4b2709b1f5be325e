//! Abandonment sweep: a match whose runner stops reporting is first
//! asked to stop, and a runner that cannot respond is finalized by the
//! sweeper itself, so no match stays registered forever.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridiron_core::{
    EngineConfig, EngineResult, LiveMatchEngine, MatchId, MatchRecord, MatchStatus, MatchStore,
    MatchUpdate, PlayerRole, SqliteStore, TeamId,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const HOME: TeamId = 1;
const AWAY: TeamId = 2;

/// Delegates to sqlite, but update_match hangs forever from the
/// `stall_after`-th call on. Models a wedged database connection.
struct StallingStore {
    inner: Arc<SqliteStore>,
    calls: AtomicU32,
    stall_after: u32,
}

#[async_trait]
impl MatchStore for StallingStore {
    async fn create_match(
        &self,
        home_team_id: TeamId,
        away_team_id: TeamId,
        scheduled_time: DateTime<Utc>,
    ) -> EngineResult<MatchId> {
        self.inner
            .create_match(home_team_id, away_team_id, scheduled_time)
            .await
    }

    async fn get_match(&self, match_id: MatchId) -> EngineResult<Option<MatchRecord>> {
        self.inner.get_match(match_id).await
    }

    async fn update_match(&self, match_id: MatchId, update: MatchUpdate) -> EngineResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.stall_after {
            std::future::pending::<()>().await;
        }
        self.inner.update_match(match_id, update).await
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

fn sweep_config(tick_interval_ms: u64) -> EngineConfig {
    EngineConfig {
        tick_interval_ms,
        abandonment_threshold_secs: 1,
        sweep_interval_secs: 1,
        ..Default::default()
    }
}

async fn wait_until_gone(engine: &LiveMatchEngine, match_id: MatchId, secs: u64) -> bool {
    for _ in 0..(secs * 20) {
        if !engine
            .list_active_matches()
            .await
            .iter()
            .any(|s| s.match_id == match_id)
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// A runner that goes silent (here: an absurdly long tick interval)
/// is stopped by the sweep and completes through the normal path:
/// completed record, stat rows, no registry entry.
#[tokio::test]
async fn sweep_stops_a_stale_match() {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
    store.migrate().expect("migration");
    seed_team(&store, HOME);
    seed_team(&store, AWAY);
    let match_id = store
        .create_match(HOME, AWAY, Utc::now())
        .await
        .expect("create match");

    // Ten-minute ticks: after the immediate first tick the runner never
    // touches its handle again.
    let engine = LiveMatchEngine::new(
        sweep_config(600_000),
        3,
        store.clone(),
        store.clone(),
        store.clone(),
    );
    engine.start_live_match(match_id, false).await.expect("start");

    assert!(
        wait_until_gone(&engine, match_id, 6).await,
        "stale match was never swept out of the registry"
    );

    let record = store.get_match(match_id).await.unwrap().unwrap();
    assert_eq!(record.status, MatchStatus::Completed);
    assert!(record.game_time < 1800, "sweep ended the match early");
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
        record.game_time
    );
}

/// A runner wedged inside a hung store write cannot observe the stop
/// channel. The sweeper escalates: one interval after the ignored
/// signal it drops the registry entry and finalizes directly.
#[tokio::test]
async fn sweep_evicts_a_wedged_runner() {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
    store.migrate().expect("migration");
    seed_team(&store, HOME);
    seed_team(&store, AWAY);
    let match_id = store
        .create_match(HOME, AWAY, Utc::now())
        .await
        .expect("create match");

    // First update_match (the initial live write) succeeds; the first
    // snapshot write hangs forever, wedging the runner mid-tick.
    let stalling = Arc::new(StallingStore {
        inner: store.clone(),
        calls: AtomicU32::new(0),
        stall_after: 1,
    });
    let engine = LiveMatchEngine::new(
        sweep_config(2),
        3,
        stalling,
        store.clone(),
        store.clone(),
    );
    engine.start_live_match(match_id, false).await.expect("start");

    assert!(
        wait_until_gone(&engine, match_id, 6).await,
        "sweep never evicted the wedged match"
    );

    // The forced finalize writes stat rows through the healthy stats
    // store even though the match row write stays hung.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let home = store
        .team_stats_row(match_id, HOME)
        .expect("read home row")
        .expect("home row exists");
    let away = store
        .team_stats_row(match_id, AWAY)
        .expect("read away row")
        .expect("away row exists");
    assert!(home.time_of_possession_seconds + away.time_of_possession_seconds > 0);
}
