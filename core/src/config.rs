//! Engine tuning knobs.
//!
//! RULE: No module hardcodes a duration, interval, or probability.
//! Everything timing-related flows through EngineConfig so tests can
//! run full matches in milliseconds.

use crate::types::GameSeconds;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Real milliseconds between runner ticks.
    pub tick_interval_ms: u64,
    /// Simulated seconds that pass on each tick.
    pub seconds_per_tick: GameSeconds,
    /// Total simulated duration of a regulation match.
    pub regulation_secs: GameSeconds,
    /// Total simulated duration of an exhibition match.
    pub exhibition_secs: GameSeconds,
    /// Probability that a tick produces a play.
    pub event_probability: f64,
    /// Simulated seconds between periodic persistence snapshots.
    pub snapshot_interval_secs: GameSeconds,
    /// Trailing play-by-play entries retained in memory and in the
    /// match row's event window.
    pub event_window: usize,
    /// Wall seconds of silence after which the sweep force-completes
    /// a registered match.
    pub abandonment_threshold_secs: i64,
    /// Wall seconds between abandonment sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms:           3_000,
            seconds_per_tick:           30,
            regulation_secs:            1_800,
            exhibition_secs:            900,
            event_probability:          0.45,
            snapshot_interval_secs:     60,
            event_window:               50,
            abandonment_threshold_secs: 300,
            sweep_interval_secs:        60,
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn max_time(&self, exhibition: bool) -> GameSeconds {
        if exhibition {
            self.exhibition_secs
        } else {
            self.regulation_secs
        }
    }
}
