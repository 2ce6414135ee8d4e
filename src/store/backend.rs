//! Collaborator interfaces consumed and produced by the statistics engine
//!
//! Every call is an async I/O boundary. The orchestrator is the only writer of
//! fact rows and player summaries.

use crate::model::{EventInfo, FactRow, PerformanceCategory, PlayerSummary, SelectionRecord};
use async_trait::async_trait;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Serialization(serde_json::Error),
    NotFound(String),
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Serialization(e) => write!(f, "Serialization error: {}", e),
            StoreError::NotFound(what) => write!(f, "Not found: {}", what),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            StoreError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

/// A selection whose payload failed schema validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinedSelection {
    pub event_id: String,
    pub team_number: u32,
    pub period_number: u32,
    pub reason: String,
}

/// Validated selections plus the rows that were held back
#[derive(Debug, Clone, Default)]
pub struct SelectionBatch {
    pub records: Vec<SelectionRecord>,
    pub quarantined: Vec<QuarantinedSelection>,
}

#[async_trait]
pub trait SelectionSource: Send + Sync {
    /// All selections in (event, team, period) order
    async fn list_selections(&self) -> Result<SelectionBatch, StoreError>;
}

#[async_trait]
pub trait EventSource: Send + Sync {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventInfo>, StoreError>;

    /// Bulk lookup; unknown ids are simply absent from the result
    async fn get_events(&self, event_ids: &[String]) -> Result<Vec<EventInfo>, StoreError> {
        let mut events = Vec::with_capacity(event_ids.len());
        for id in event_ids {
            if let Some(event) = self.get_event(id).await? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn list_performance_categories(&self) -> Result<Vec<PerformanceCategory>, StoreError>;
}

#[async_trait]
pub trait FactStore: Send + Sync {
    /// Delete every fact row and insert `facts` as one atomic step. On error
    /// the previous fact set must still be in place.
    async fn replace_all_facts(&self, facts: &[FactRow]) -> Result<usize, StoreError>;

    async fn list_facts(&self) -> Result<Vec<FactRow>, StoreError>;

    async fn facts_for_player(&self, player_id: &str) -> Result<Vec<FactRow>, StoreError>;
}

#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// Replace the summary field only; other player attributes are untouched
    async fn write_summary(&self, player_id: &str, summary: &PlayerSummary) -> Result<(), StoreError>;

    async fn read_summary(&self, player_id: &str) -> Result<Option<PlayerSummary>, StoreError>;
}

/// Every collaborator behind one handle
pub trait StatsStore: SelectionSource + EventSource + CategorySource + FactStore + PlayerStore {}

impl<T> StatsStore for T where T: SelectionSource + EventSource + CategorySource + FactStore + PlayerStore {}
