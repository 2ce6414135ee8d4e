//! Normalized per-player-per-period playing-time facts

use serde::{Deserialize, Serialize};

/// Uniqueness key of a fact row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactKey {
    pub player_id: String,
    pub event_id: String,
    pub team_number: u32,
    pub period_number: u32,
}

impl std::fmt::Display for FactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "player={} event={} team={} period={}",
            self.player_id, self.event_id, self.team_number, self.period_number
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRow {
    pub player_id: String,
    pub event_id: String,
    pub team_number: u32,
    pub period_number: u32,
    pub position: String,
    pub minutes_played: u32,
    pub is_captain: bool,
    pub is_substitute: bool,
    #[serde(default)]
    pub performance_category_id: Option<String>,
}

impl FactRow {
    pub fn key(&self) -> FactKey {
        FactKey {
            player_id: self.player_id.clone(),
            event_id: self.event_id.clone(),
            team_number: self.team_number,
            period_number: self.period_number,
        }
    }

    /// Bench time and zero-minute rows never contribute to totals
    pub fn counts_toward_totals(&self) -> bool {
        !self.is_substitute && self.minutes_played > 0
    }
}
