//! Selection records as read from the selection store
//!
//! A selection is the coach's lineup for one (event, team-number, period-number)
//! slice. The assignment lists arrive as a JSON payload; they are parsed into
//! the typed structures below at the store boundary so nothing loosely typed
//! reaches the fact deriver.

use serde::{Deserialize, Serialize};

/// One player placed into a position for a selection slice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Missing or null ids are kept so the deriver can report them
    #[serde(default, alias = "player_id")]
    pub player_id: Option<String>,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub minutes: Option<u32>,
}

impl Assignment {
    pub fn new(player_id: &str, position: &str) -> Self {
        Self {
            player_id: Some(player_id.to_string()),
            position: position.to_string(),
            minutes: None,
        }
    }

    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.minutes = Some(minutes);
        self
    }

    /// Player id with surrounding whitespace removed, `None` when blank
    pub fn player(&self) -> Option<&str> {
        self.player_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Assignment lists stored as `payload_json` next to each selection row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPayload {
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub substitutes: Vec<Assignment>,
}

impl SelectionPayload {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRecord {
    pub event_id: String,
    pub team_number: u32,
    pub period_number: u32,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub captain_id: Option<String>,
    #[serde(default)]
    pub performance_category_id: Option<String>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub substitutes: Vec<Assignment>,
}

impl SelectionRecord {
    pub fn new(event_id: &str, team_number: u32, period_number: u32) -> Self {
        Self {
            event_id: event_id.to_string(),
            team_number,
            period_number,
            duration_minutes: None,
            captain_id: None,
            performance_category_id: None,
            assignments: Vec::new(),
            substitutes: Vec::new(),
        }
    }

    pub fn payload(&self) -> SelectionPayload {
        SelectionPayload {
            assignments: self.assignments.clone(),
            substitutes: self.substitutes.clone(),
        }
    }

    pub fn set_payload(&mut self, payload: SelectionPayload) {
        self.assignments = payload.assignments;
        self.substitutes = payload.substitutes;
    }

    /// Short identifier used in log lines
    pub fn label(&self) -> String {
        format!(
            "event={} team={} period={}",
            self.event_id, self.team_number, self.period_number
        )
    }
}
