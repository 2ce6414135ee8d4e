//! In-memory store with failure injection, used by tests and dry runs

use super::backend::{
    CategorySource, EventSource, FactStore, PlayerStore, QuarantinedSelection, SelectionBatch,
    SelectionSource, StoreError,
};
use crate::model::{
    EventInfo, FactRow, PerformanceCategory, PlayerRecord, PlayerSummary, SelectionPayload,
    SelectionRecord,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    /// Keyed by (event, team, period); value is the record plus its raw payload
    selections: BTreeMap<(String, u32, u32), (SelectionRecord, String)>,
    events: HashMap<String, EventInfo>,
    categories: BTreeMap<String, PerformanceCategory>,
    players: BTreeMap<String, PlayerRecord>,
    facts: Vec<FactRow>,
    summary_writes: usize,
    fail_selections: bool,
    fail_fact_replace: bool,
    failing_players: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStatsStore {
    state: Mutex<MemoryState>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }

    pub fn upsert_selection(&self, record: SelectionRecord) -> Result<(), StoreError> {
        let payload_json = serde_json::to_string(&record.payload())?;
        let key = (record.event_id.clone(), record.team_number, record.period_number);
        self.state()?.selections.insert(key, (record, payload_json));
        Ok(())
    }

    /// Store a payload without validating it
    pub fn upsert_selection_raw(
        &self,
        event_id: &str,
        team_number: u32,
        period_number: u32,
        payload_json: &str,
    ) -> Result<(), StoreError> {
        let record = SelectionRecord::new(event_id, team_number, period_number);
        let key = (event_id.to_string(), team_number, period_number);
        self.state()?
            .selections
            .insert(key, (record, payload_json.to_string()));
        Ok(())
    }

    pub fn delete_selections_for_event(&self, event_id: &str) -> Result<usize, StoreError> {
        let mut state = self.state()?;
        let before = state.selections.len();
        state.selections.retain(|(event, _, _), _| event != event_id);
        Ok(before - state.selections.len())
    }

    pub fn upsert_event(&self, event: EventInfo) -> Result<(), StoreError> {
        self.state()?.events.insert(event.id.clone(), event);
        Ok(())
    }

    pub fn upsert_category(&self, category: PerformanceCategory) -> Result<(), StoreError> {
        self.state()?
            .categories
            .insert(category.id.clone(), category);
        Ok(())
    }

    /// Insert or update roster fields, keeping any existing summary
    pub fn upsert_player(&self, player: PlayerRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state.players.get_mut(&player.id) {
            Some(existing) => {
                existing.name = player.name;
                existing.objectives = player.objectives;
                existing.comments = player.comments;
            }
            None => {
                state.players.insert(player.id.clone(), player);
            }
        }
        Ok(())
    }

    pub fn get_player(&self, player_id: &str) -> Result<Option<PlayerRecord>, StoreError> {
        Ok(self.state()?.players.get(player_id).cloned())
    }

    pub fn summary_writes(&self) -> Result<usize, StoreError> {
        Ok(self.state()?.summary_writes)
    }

    pub fn set_fail_selections(&self, fail: bool) -> Result<(), StoreError> {
        self.state()?.fail_selections = fail;
        Ok(())
    }

    pub fn set_fail_fact_replace(&self, fail: bool) -> Result<(), StoreError> {
        self.state()?.fail_fact_replace = fail;
        Ok(())
    }

    /// Make `write_summary` fail for one player
    pub fn fail_player(&self, player_id: &str) -> Result<(), StoreError> {
        self.state()?.failing_players.insert(player_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl SelectionSource for MemoryStatsStore {
    async fn list_selections(&self) -> Result<SelectionBatch, StoreError> {
        let state = self.state()?;
        if state.fail_selections {
            return Err(StoreError::Unavailable("selection store offline".to_string()));
        }

        let mut batch = SelectionBatch::default();
        for (record, payload_json) in state.selections.values() {
            match SelectionPayload::from_json(payload_json) {
                Ok(payload) => {
                    let mut record = record.clone();
                    record.set_payload(payload);
                    batch.records.push(record);
                }
                Err(e) => {
                    log::warn!("⚠️  Quarantined selection {}: {}", record.label(), e);
                    batch.quarantined.push(QuarantinedSelection {
                        event_id: record.event_id.clone(),
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
impl EventSource for MemoryStatsStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventInfo>, StoreError> {
        Ok(self.state()?.events.get(event_id).cloned())
    }
}

#[async_trait]
impl CategorySource for MemoryStatsStore {
    async fn list_performance_categories(&self) -> Result<Vec<PerformanceCategory>, StoreError> {
        Ok(self.state()?.categories.values().cloned().collect())
    }
}

#[async_trait]
impl FactStore for MemoryStatsStore {
    async fn replace_all_facts(&self, facts: &[FactRow]) -> Result<usize, StoreError> {
        let mut state = self.state()?;
        if state.fail_fact_replace {
            return Err(StoreError::Unavailable("fact store offline".to_string()));
        }

        let mut seen = HashSet::with_capacity(facts.len());
        for fact in facts {
            if !seen.insert(fact.key()) {
                return Err(StoreError::Unavailable(format!(
                    "duplicate fact key {}",
                    fact.key()
                )));
            }
        }

        state.facts = facts.to_vec();
        Ok(facts.len())
    }

    async fn list_facts(&self) -> Result<Vec<FactRow>, StoreError> {
        let mut facts = self.state()?.facts.clone();
        facts.sort_by_key(FactRow::key);
        Ok(facts)
    }

    async fn facts_for_player(&self, player_id: &str) -> Result<Vec<FactRow>, StoreError> {
        let mut facts: Vec<FactRow> = self
            .state()?
            .facts
            .iter()
            .filter(|f| f.player_id == player_id)
            .cloned()
            .collect();
        facts.sort_by_key(FactRow::key);
        Ok(facts)
    }
}

#[async_trait]
impl PlayerStore for MemoryStatsStore {
    async fn write_summary(&self, player_id: &str, summary: &PlayerSummary) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if state.failing_players.contains(player_id) {
            return Err(StoreError::Unavailable(format!(
                "summary write rejected for {}",
                player_id
            )));
        }
        let player = state
            .players
            .get_mut(player_id)
            .ok_or_else(|| StoreError::NotFound(format!("player {}", player_id)))?;
        player.summary = Some(summary.clone());
        state.summary_writes += 1;
        Ok(())
    }

    async fn read_summary(&self, player_id: &str) -> Result<Option<PlayerSummary>, StoreError> {
        self.state()?
            .players
            .get(player_id)
            .map(|p| p.summary.clone())
            .ok_or_else(|| StoreError::NotFound(format!("player {}", player_id)))
    }
}
