//! SQLite-backed implementation of all three collaborator traits.
//!
//! The connection sits behind a Mutex: sqlite work here is short,
//! synchronous row traffic, and each match persists at most once per
//! snapshot interval, so contention is negligible.

use super::{CareerDelta, MatchRecord, MatchStore, MatchUpdate, RosterProvider, StatsStore};
use crate::error::{EngineError, EngineResult};
use crate::event::MatchEvent;
use crate::roster::{Player, PlayerRole};
use crate::state::MatchStatus;
use crate::stats::{PlayerStatLine, TeamStatLine};
use crate::types::{GameSeconds, MatchId, PlayerId, TeamId};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance. :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn()?
            .execute_batch(include_str!("../../../migrations/001_engine.sql"))?;
        Ok(())
    }

    fn conn(&self) -> EngineResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EngineError::Other(anyhow!("store mutex poisoned")))
    }

    // ── Seeding and inspection helpers (tools and tests) ─────────

    #[allow(clippy::too_many_arguments)]
    pub fn insert_player(
        &self,
        team_id: TeamId,
        name: &str,
        role: PlayerRole,
        throwing: u8,
        catching: u8,
        speed: u8,
        power: u8,
        agility: u8,
    ) -> EngineResult<PlayerId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO player (team_id, name, role, throwing, catching, speed, power, agility)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![team_id, name, role.name(), throwing, catching, speed, power, agility],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Lifetime totals for one player: (games_played, summed stat line).
    pub fn career_totals(&self, player_id: PlayerId) -> EngineResult<Option<(u32, PlayerStatLine)>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT games_played, pass_attempts, pass_completions, passing_yards,
                        rushing_yards, receiving_yards, catches, drops, tackles,
                        knockdowns, interceptions, fumbles, turnovers, scores
                 FROM player_career_stats WHERE player_id = ?1",
                params![player_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        PlayerStatLine {
                            pass_attempts:    row.get(1)?,
                            pass_completions: row.get(2)?,
                            passing_yards:    row.get(3)?,
                            rushing_yards:    row.get(4)?,
                            receiving_yards:  row.get(5)?,
                            catches:          row.get(6)?,
                            drops:            row.get(7)?,
                            tackles:          row.get(8)?,
                            knockdowns:       row.get(9)?,
                            interceptions:    row.get(10)?,
                            fumbles:          row.get(11)?,
                            turnovers:        row.get(12)?,
                            scores:           row.get(13)?,
                        },
                    ))
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn team_stats_row(
        &self,
        match_id: MatchId,
        team_id: TeamId,
    ) -> EngineResult<Option<TeamStatLine>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT offensive_yards, time_of_possession_seconds, turnovers, knockdowns
                 FROM team_match_stats WHERE match_id = ?1 AND team_id = ?2",
                params![match_id, team_id],
                |row| {
                    Ok(TeamStatLine {
                        offensive_yards:            row.get(0)?,
                        time_of_possession_seconds: row.get(1)?,
                        turnovers:                  row.get(2)?,
                        knockdowns:                 row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

#[async_trait]
impl MatchStore for SqliteStore {
    async fn create_match(
        &self,
        home_team_id: TeamId,
        away_team_id: TeamId,
        scheduled_time: DateTime<Utc>,
    ) -> EngineResult<MatchId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO match_record (home_team_id, away_team_id, status, scheduled_time)
             VALUES (?1, ?2, 'scheduled', ?3)",
            params![home_team_id, away_team_id, scheduled_time.timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn get_match(&self, match_id: MatchId) -> EngineResult<Option<MatchRecord>> {
        let raw = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT match_id, home_team_id, away_team_id, status, scheduled_time,
                        home_score, away_score, game_time, current_half, max_time,
                        event_log, error
                 FROM match_record WHERE match_id = ?1",
                params![match_id],
                |row| {
                    Ok((
                        row.get::<_, MatchId>(0)?,
                        row.get::<_, TeamId>(1)?,
                        row.get::<_, TeamId>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, u32>(5)?,
                        row.get::<_, u32>(6)?,
                        row.get::<_, GameSeconds>(7)?,
                        row.get::<_, u8>(8)?,
                        row.get::<_, GameSeconds>(9)?,
                        row.get::<_, String>(10)?,
                        row.get::<_, Option<String>>(11)?,
                    ))
                },
            )
            .optional()?
        };

        let Some((id, home, away, status, scheduled, hs, as_, gt, half, max, log_json, error)) =
            raw
        else {
            return Ok(None);
        };

        let status = MatchStatus::parse(&status)
            .ok_or_else(|| anyhow!("match {id}: unknown status '{status}'"))?;
        let event_window: Vec<MatchEvent> = serde_json::from_str(&log_json)?;
        let scheduled_time =
            DateTime::from_timestamp(scheduled, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        Ok(Some(MatchRecord {
            match_id: id,
            home_team_id: home,
            away_team_id: away,
            status,
            scheduled_time,
            home_score: hs,
            away_score: as_,
            game_time: gt,
            current_half: half,
            max_time: max,
            event_window,
            error,
        }))
    }

    async fn update_match(&self, match_id: MatchId, update: MatchUpdate) -> EngineResult<()> {
        let event_json = match &update.event_window {
            Some(events) => Some(serde_json::to_string(events)?),
            None => None,
        };
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE match_record SET
                status       = COALESCE(?1, status),
                home_score   = COALESCE(?2, home_score),
                away_score   = COALESCE(?3, away_score),
                game_time    = COALESCE(?4, game_time),
                current_half = COALESCE(?5, current_half),
                max_time     = COALESCE(?6, max_time),
                event_log    = COALESCE(?7, event_log),
                error        = COALESCE(?8, error)
             WHERE match_id = ?9",
            params![
                update.status.map(|s| s.as_str()),
                update.home_score,
                update.away_score,
                update.game_time,
                update.current_half,
                update.max_time,
                event_json,
                update.error,
                match_id,
            ],
        )?;
        if changed == 0 {
            return Err(EngineError::MatchNotFound { match_id });
        }
        Ok(())
    }
}

#[async_trait]
impl RosterProvider for SqliteStore {
    async fn active_players(&self, team_id: TeamId) -> EngineResult<Vec<Player>> {
        let rows: Vec<(PlayerId, String, String, u8, u8, u8, u8, u8)> = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(
                "SELECT player_id, name, role, throwing, catching, speed, power, agility
                 FROM player WHERE team_id = ?1 AND active = 1
                 ORDER BY player_id ASC",
            )?;
            let mapped = stmt.query_map(params![team_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })?;
            mapped.collect::<Result<Vec<_>, _>>()?
        };

        rows.into_iter()
            .map(|(id, name, role, throwing, catching, speed, power, agility)| {
                let role = PlayerRole::parse(&role)
                    .ok_or_else(|| anyhow!("player {id}: unknown role '{role}'"))?;
                Ok(Player {
                    id,
                    team_id,
                    name,
                    role,
                    throwing,
                    catching,
                    speed,
                    power,
                    agility,
                })
            })
            .collect()
    }
}

#[async_trait]
impl StatsStore for SqliteStore {
    async fn record_player_match_stats(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
        line: &PlayerStatLine,
    ) -> EngineResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO player_match_stats
                (player_id, match_id, pass_attempts, pass_completions, passing_yards,
                 rushing_yards, receiving_yards, catches, drops, tackles, knockdowns,
                 interceptions, fumbles, turnovers, scores)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                player_id,
                match_id,
                line.pass_attempts,
                line.pass_completions,
                line.passing_yards,
                line.rushing_yards,
                line.receiving_yards,
                line.catches,
                line.drops,
                line.tackles,
                line.knockdowns,
                line.interceptions,
                line.fumbles,
                line.turnovers,
                line.scores,
            ],
        )?;
        Ok(())
    }

    async fn record_team_match_stats(
        &self,
        match_id: MatchId,
        team_id: TeamId,
        line: &TeamStatLine,
    ) -> EngineResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO team_match_stats
                (match_id, team_id, offensive_yards, time_of_possession_seconds,
                 turnovers, knockdowns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                match_id,
                team_id,
                line.offensive_yards,
                line.time_of_possession_seconds,
                line.turnovers,
                line.knockdowns,
            ],
        )?;
        Ok(())
    }

    /// Lifetime rollup is an upsert: completing the same match twice
    /// must not double-count, so callers guard with the completed flag.
    async fn accumulate_career_stats(
        &self,
        player_id: PlayerId,
        delta: &CareerDelta,
    ) -> EngineResult<()> {
        let s = &delta.stats;
        self.conn()?.execute(
            "INSERT INTO player_career_stats
                (player_id, games_played, pass_attempts, pass_completions, passing_yards,
                 rushing_yards, receiving_yards, catches, drops, tackles, knockdowns,
                 interceptions, fumbles, turnovers, scores)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(player_id) DO UPDATE SET
                games_played     = games_played     + excluded.games_played,
                pass_attempts    = pass_attempts    + excluded.pass_attempts,
                pass_completions = pass_completions + excluded.pass_completions,
                passing_yards    = passing_yards    + excluded.passing_yards,
                rushing_yards    = rushing_yards    + excluded.rushing_yards,
                receiving_yards  = receiving_yards  + excluded.receiving_yards,
                catches          = catches          + excluded.catches,
                drops            = drops            + excluded.drops,
                tackles          = tackles          + excluded.tackles,
                knockdowns       = knockdowns       + excluded.knockdowns,
                interceptions    = interceptions    + excluded.interceptions,
                fumbles          = fumbles          + excluded.fumbles,
                turnovers        = turnovers        + excluded.turnovers,
                scores           = scores           + excluded.scores",
            params![
                player_id,
                delta.games_played,
                s.pass_attempts,
                s.pass_completions,
                s.passing_yards,
                s.rushing_yards,
                s.receiving_yards,
                s.catches,
                s.drops,
                s.tackles,
                s.knockdowns,
                s.interceptions,
                s.fumbles,
                s.turnovers,
                s.scores,
            ],
        )?;
        Ok(())
    }
}
