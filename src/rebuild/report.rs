//! Results handed back to the administrative and diagnostic callers

use crate::model::PlayerSummary;
use crate::stats_core::TrendScore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFailure {
    pub player_id: String,
    pub message: String,
}

/// Counts surfaced by a rebuild. Never carries raw errors beyond a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildReport {
    pub players_succeeded: usize,
    pub players_failed: usize,
    pub fact_rows_created: usize,
    pub selections_quarantined: usize,
    pub malformed_assignments: usize,
    pub duplicate_assignments: usize,
    /// Players never scheduled because the rebuild was cancelled
    pub players_skipped: usize,
    pub cancelled: bool,
    /// Wall-clock time; differs between otherwise identical runs, so compare
    /// reports with it zeroed
    pub elapsed_ms: u64,
    pub failures: Vec<PlayerFailure>,
}

impl RebuildReport {
    pub fn players_processed(&self) -> usize {
        self.players_succeeded + self.players_failed
    }

    pub fn is_clean(&self) -> bool {
        self.players_failed == 0 && !self.cancelled
    }
}

/// Structured output of a single-player diagnostic rebuild
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTrace {
    pub player_id: String,
    /// Materialized facts found for the player
    pub facts_considered: usize,
    /// Facts whose event has finished
    pub facts_eligible: usize,
    pub substitute_facts_ignored: usize,
    /// Known events not finished yet
    pub unfinished_events: Vec<String>,
    /// Events referenced by facts but missing from the event store
    pub unknown_events: Vec<String>,
    pub summary: PlayerSummary,
    pub trend: TrendScore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_camel_case() {
        let report = RebuildReport {
            players_succeeded: 3,
            players_failed: 1,
            fact_rows_created: 40,
            failures: vec![PlayerFailure {
                player_id: "p9".to_string(),
                message: "Not found: player p9".to_string(),
            }],
            ..Default::default()
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["playersSucceeded"], 3);
        assert_eq!(json["playersFailed"], 1);
        assert_eq!(json["factRowsCreated"], 40);
        assert_eq!(json["failures"][0]["playerId"], "p9");
        assert_eq!(report.players_processed(), 4);
        assert!(!report.is_clean());
    }
}
