//! SQLite implementation of every collaborator seam
//!
//! One connection behind a mutex. Fact replacement runs DELETE + INSERT in a
//! single transaction so a failed rebuild never leaves the table half cleared.

use super::backend::{
    CategorySource, EventSource, FactStore, PlayerStore, QuarantinedSelection, SelectionBatch,
    SelectionSource, StoreError,
};
use super::migrations::run_schema_migrations;
use crate::model::{
    parse_end_time, EventInfo, FactRow, PerformanceCategory, PlayerRecord, PlayerSummary,
    SelectionPayload, SelectionRecord,
};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteStatsStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStatsStore {
    /// Open (or create) the database and apply the schema
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;
        run_schema_migrations(&conn)?;

        log::info!("✅ Stats database ready: {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".to_string()))
    }

    pub fn upsert_selection(&self, record: &SelectionRecord) -> Result<(), StoreError> {
        let payload_json = serde_json::to_string(&record.payload())?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO selections (
                event_id, team_number, period_number, duration_minutes,
                captain_id, performance_category_id, payload_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(event_id, team_number, period_number) DO UPDATE SET
                duration_minutes = excluded.duration_minutes,
                captain_id = excluded.captain_id,
                performance_category_id = excluded.performance_category_id,
                payload_json = excluded.payload_json",
            params![
                record.event_id,
                record.team_number,
                record.period_number,
                record.duration_minutes,
                record.captain_id,
                record.performance_category_id,
                payload_json,
            ],
        )?;
        Ok(())
    }

    /// Store a payload exactly as received (tooling and import paths)
    pub fn upsert_selection_raw(
        &self,
        event_id: &str,
        team_number: u32,
        period_number: u32,
        payload_json: &str,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO selections (event_id, team_number, period_number, payload_json)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(event_id, team_number, period_number) DO UPDATE SET
                payload_json = excluded.payload_json",
            params![event_id, team_number, period_number, payload_json],
        )?;
        Ok(())
    }

    pub fn delete_selections_for_event(&self, event_id: &str) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM selections WHERE event_id = ?1", params![event_id])?)
    }

    pub fn upsert_event(&self, event: &EventInfo) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO events (id, event_date, end_time, opponent, player_of_match_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                event_date = excluded.event_date,
                end_time = excluded.end_time,
                opponent = excluded.opponent,
                player_of_match_id = excluded.player_of_match_id",
            params![
                event.id,
                event.date.format(DATE_FORMAT).to_string(),
                event.end_time.map(|t| t.format("%H:%M:%S").to_string()),
                event.opponent,
                event.player_of_match_id,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_category(&self, category: &PerformanceCategory) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO performance_categories (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![category.id, category.name],
        )?;
        Ok(())
    }

    /// Insert or update the roster fields; `summary_json` is left alone
    pub fn upsert_player(&self, player: &PlayerRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO players (id, name, objectives, comments) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                objectives = excluded.objectives,
                comments = excluded.comments",
            params![player.id, player.name, player.objectives, player.comments],
        )?;
        Ok(())
    }

    pub fn get_player(&self, player_id: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, name, objectives, comments, summary_json FROM players WHERE id = ?1",
                params![player_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, objectives, comments, summary_json)) = row else {
            return Ok(None);
        };
        let summary = summary_json
            .as_deref()
            .map(PlayerSummary::from_json)
            .transpose()?;

        Ok(Some(PlayerRecord {
            id,
            name,
            objectives,
            comments,
            summary,
        }))
    }

    /// Raw stored summary text, as end users would read it
    pub fn summary_json(&self, player_id: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT summary_json FROM players WHERE id = ?1",
                params![player_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(value.flatten())
    }
}

fn fact_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FactRow> {
    Ok(FactRow {
        player_id: row.get(0)?,
        event_id: row.get(1)?,
        team_number: row.get(2)?,
        period_number: row.get(3)?,
        position: row.get(4)?,
        minutes_played: row.get(5)?,
        is_captain: row.get(6)?,
        is_substitute: row.get(7)?,
        performance_category_id: row.get(8)?,
    })
}

const FACT_COLUMNS: &str = "player_id, event_id, team_number, period_number, position,
    minutes_played, is_captain, is_substitute, performance_category_id";

#[async_trait]
impl SelectionSource for SqliteStatsStore {
    async fn list_selections(&self) -> Result<SelectionBatch, StoreError> {
        let rows = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT event_id, team_number, period_number, duration_minutes,
                        captain_id, performance_category_id, payload_json
                 FROM selections
                 ORDER BY event_id, team_number, period_number",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        SelectionRecord {
                            event_id: row.get(0)?,
                            team_number: row.get(1)?,
                            period_number: row.get(2)?,
                            duration_minutes: row.get(3)?,
                            captain_id: row.get(4)?,
                            performance_category_id: row.get(5)?,
                            assignments: Vec::new(),
                            substitutes: Vec::new(),
                        },
                        row.get::<_, String>(6)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut batch = SelectionBatch::default();
        for (mut record, payload_json) in rows {
            match SelectionPayload::from_json(&payload_json) {
                Ok(payload) => {
                    record.set_payload(payload);
                    batch.records.push(record);
                }
                Err(e) => {
                    log::warn!("⚠️  Quarantined selection {}: {}", record.label(), e);
                    batch.quarantined.push(QuarantinedSelection {
                        event_id: record.event_id,
                        team_number: record.team_number,
                        period_number: record.period_number,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }
}

#[async_trait]
impl EventSource for SqliteStatsStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventInfo>, StoreError> {
        let row = {
            let conn = self.lock()?;
            let row = conn
                .query_row(
                    "SELECT id, event_date, end_time, opponent, player_of_match_id
                     FROM events WHERE id = ?1",
                    params![event_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    },
                )
                .optional()?;
            row
        };

        let Some((id, raw_date, raw_end, opponent, player_of_match_id)) = row else {
            return Ok(None);
        };

        let date = match NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                log::warn!("⚠️  Event {} has unreadable date '{}': {}", id, raw_date, e);
                return Ok(None);
            }
        };

        let end_time = raw_end.as_deref().and_then(|raw| {
            let parsed = parse_end_time(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                log::warn!("⚠️  Event {} has unreadable end time '{}'", id, raw);
            }
            parsed
        });

        Ok(Some(EventInfo {
            id,
            date,
            end_time,
            opponent,
            player_of_match_id,
        }))
    }
}

#[async_trait]
impl CategorySource for SqliteStatsStore {
    async fn list_performance_categories(&self) -> Result<Vec<PerformanceCategory>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name FROM performance_categories ORDER BY id")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(PerformanceCategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}

#[async_trait]
impl FactStore for SqliteStatsStore {
    async fn replace_all_facts(&self, facts: &[FactRow]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM fact_rows", [])?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO fact_rows ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                FACT_COLUMNS
            ))?;
            for fact in facts {
                stmt.execute(params![
                    fact.player_id,
                    fact.event_id,
                    fact.team_number,
                    fact.period_number,
                    fact.position,
                    fact.minutes_played,
                    fact.is_captain,
                    fact.is_substitute,
                    fact.performance_category_id,
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("✅ Replaced fact rows: {} removed, {} inserted", removed, facts.len());
        Ok(facts.len())
    }

    async fn list_facts(&self) -> Result<Vec<FactRow>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM fact_rows
             ORDER BY player_id, event_id, team_number, period_number",
            FACT_COLUMNS
        ))?;
        let facts = stmt
            .query_map([], fact_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(facts)
    }

    async fn facts_for_player(&self, player_id: &str) -> Result<Vec<FactRow>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM fact_rows WHERE player_id = ?1
             ORDER BY event_id, team_number, period_number",
            FACT_COLUMNS
        ))?;
        let facts = stmt
            .query_map(params![player_id], fact_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(facts)
    }
}

#[async_trait]
impl PlayerStore for SqliteStatsStore {
    async fn write_summary(&self, player_id: &str, summary: &PlayerSummary) -> Result<(), StoreError> {
        let summary_json = summary.to_json()?;
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE players SET summary_json = ?1 WHERE id = ?2",
            params![summary_json, player_id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("player {}", player_id)));
        }
        Ok(())
    }

    async fn read_summary(&self, player_id: &str) -> Result<Option<PlayerSummary>, StoreError> {
        match self.get_player(player_id)? {
            Some(player) => Ok(player.summary),
            None => Err(StoreError::NotFound(format!("player {}", player_id))),
        }
    }
}
