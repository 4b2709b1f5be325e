//! Process-wide registry of live matches.
//!
//! RULE: One handle per match id. register() uses the map's entry API,
//! so a duplicate start can never race its way to two runners. The map
//! is sharded (DashMap): operations on different matches never block
//! each other.

use crate::engine::EngineDeps;
use crate::error::{EngineError, EngineResult};
use crate::runner::finalize_match;
use crate::state::LiveMatchState;
use crate::types::MatchId;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Registry entry for one running match. The runner task owns the
/// state; everyone else reads through this handle.
#[derive(Clone)]
pub struct MatchHandle {
    pub match_id: MatchId,
    state: Arc<RwLock<LiveMatchState>>,
    stop_tx: Arc<watch::Sender<bool>>,
    last_update: Arc<AtomicI64>,
    stop_signaled: Arc<AtomicI64>,
}

impl MatchHandle {
    pub fn new(
        match_id: MatchId,
        state: Arc<RwLock<LiveMatchState>>,
        stop_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            match_id,
            state,
            stop_tx: Arc::new(stop_tx),
            last_update: Arc::new(AtomicI64::new(Utc::now().timestamp())),
            stop_signaled: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Ask the runner to complete now. Takes effect before its next tick.
    pub fn signal_stop(&self) {
        let _ = self.stop_signaled.compare_exchange(
            0,
            Utc::now().timestamp(),
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
        let _ = self.stop_tx.send(true);
    }

    /// When the first stop signal was sent, if ever.
    pub fn stop_signaled_at(&self) -> Option<i64> {
        match self.stop_signaled.load(Ordering::Relaxed) {
            0 => None,
            at => Some(at),
        }
    }

    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    /// Stamp the handle as alive. Called by the runner every tick.
    pub fn touch(&self) {
        self.last_update.store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    pub fn last_update(&self) -> i64 {
        self.last_update.load(Ordering::Relaxed)
    }

    pub async fn snapshot(&self) -> LiveMatchState {
        self.state.read().await.clone()
    }

    pub(crate) fn state_cell(&self) -> Arc<RwLock<LiveMatchState>> {
        self.state.clone()
    }
}

pub struct MatchRegistry {
    matches: DashMap<MatchId, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    /// Insert a handle; rejects a match that already has a runner.
    pub fn register(&self, handle: MatchHandle) -> EngineResult<()> {
        match self.matches.entry(handle.match_id) {
            Entry::Occupied(_) => Err(EngineError::MatchAlreadyRunning {
                match_id: handle.match_id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, match_id: MatchId) -> Option<MatchHandle> {
        self.matches.get(&match_id).map(|h| h.value().clone())
    }

    pub fn remove(&self, match_id: MatchId) -> Option<MatchHandle> {
        self.matches.remove(&match_id).map(|(_, h)| h)
    }

    pub fn list_active(&self) -> Vec<MatchHandle> {
        self.matches.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Independent sweep that force-completes abandoned matches, so no
/// match runs forever if its owner loses track of it. A stale handle
/// is first asked to stop. If it is still registered a full sweep
/// interval after the signal, its runner is wedged or dead and cannot
/// observe the stop channel, so the sweeper drops the registry entry
/// and finalizes the match itself.
pub fn spawn_sweeper(deps: Arc<EngineDeps>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            deps.config.sweep_interval_secs,
        ));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let now = Utc::now().timestamp();
            let cutoff = now - deps.config.abandonment_threshold_secs;
            for handle in deps.registry.list_active() {
                if handle.last_update() >= cutoff {
                    continue;
                }
                match handle.stop_signaled_at() {
                    None => {
                        log::warn!(
                            "match {}: no update since {}, requesting stop",
                            handle.match_id,
                            handle.last_update()
                        );
                        handle.signal_stop();
                    }
                    Some(at) if now - at >= deps.config.sweep_interval_secs as i64 => {
                        log::warn!(
                            "match {}: runner unresponsive since stop at {at}, finalizing directly",
                            handle.match_id
                        );
                        deps.registry.remove(handle.match_id);
                        let deps = deps.clone();
                        let cell = handle.state_cell();
                        // Spawned so a wedged state write cannot stall
                        // the sweep of other matches.
                        tokio::spawn(async move {
                            let mut state = cell.write().await;
                            finalize_match(&deps, &mut state).await;
                        });
                    }
                    Some(_) => {}
                }
            }
        }
    })
}
