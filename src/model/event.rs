//! Event and performance-category records owned by other collaborators

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// The slice of an event the statistics engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub player_of_match_id: Option<String>,
}

impl EventInfo {
    pub fn new(id: &str, date: NaiveDate) -> Self {
        Self {
            id: id.to_string(),
            date,
            end_time: None,
            opponent: None,
            player_of_match_id: None,
        }
    }

    pub fn is_player_of_match(&self, player_id: &str) -> bool {
        self.player_of_match_id.as_deref() == Some(player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceCategory {
    pub id: String,
    pub name: String,
}

/// Parse `HH:MM` or `HH:MM:SS` end times as stored by the events screens
pub fn parse_end_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}
