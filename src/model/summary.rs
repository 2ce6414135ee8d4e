//! Denormalized statistics attached to a player

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minutes keyed by normalized position. Ordered so serialized summaries are
/// byte-identical across rebuilds.
pub type PositionMinutes = BTreeMap<String, u32>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub total_games: u32,
    pub total_minutes: u32,
    pub minutes_by_position: PositionMinutes,
    pub captain_games: u32,
    pub player_of_match_count: u32,
    pub recent_games: Vec<GameSummary>,
}

impl PlayerSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// `total_minutes` must equal the per-position sum
    pub fn is_consistent(&self) -> bool {
        self.minutes_by_position
            .values()
            .fold(0u32, |acc, m| acc.saturating_add(*m))
            == self.total_minutes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub event_id: String,
    pub opponent: Option<String>,
    pub date: NaiveDate,
    pub minutes_by_position: PositionMinutes,
    pub total_minutes: u32,
    pub captain: bool,
    pub player_of_match: bool,
    pub performance_category: Option<String>,
}

/// Player entity as stored by the roster screens. Only `summary` is owned by
/// the statistics engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub objectives: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub summary: Option<PlayerSummary>,
}

impl PlayerRecord {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            objectives: None,
            comments: None,
            summary: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_is_stable() {
        let mut summary = PlayerSummary {
            total_games: 1,
            total_minutes: 90,
            ..Default::default()
        };
        summary.minutes_by_position.insert("ST".to_string(), 45);
        summary.minutes_by_position.insert("CM".to_string(), 45);

        let first = summary.to_json().unwrap();
        let second = PlayerSummary::from_json(&first).unwrap().to_json().unwrap();

        assert_eq!(first, second);
        assert!(first.find("\"CM\"").unwrap() < first.find("\"ST\"").unwrap());
        assert!(summary.is_consistent());
    }
}
