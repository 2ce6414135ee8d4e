//! Aggregator: folds a player's eligible facts into a `PlayerSummary`
//!
//! The summary is recomputed from scratch on every run and replaces the
//! previous one as a whole, so removed positions or events never linger.

use super::recent::{recent_games, DEFAULT_RECENT_GAMES};
use crate::model::{EventInfo, FactRow, PerformanceCategory, PlayerSummary, PositionMinutes};
use std::collections::{BTreeSet, HashMap};

/// Lookups joined into facts by event id / category id
#[derive(Debug, Clone, Default)]
pub struct AggregationContext {
    pub events: HashMap<String, EventInfo>,
    /// Category id → display name
    pub categories: HashMap<String, String>,
}

impl AggregationContext {
    pub fn new(events: Vec<EventInfo>, categories: Vec<PerformanceCategory>) -> Self {
        Self {
            events: events.into_iter().map(|e| (e.id.clone(), e)).collect(),
            categories: categories.into_iter().map(|c| (c.id, c.name)).collect(),
        }
    }
}

pub struct Aggregator {
    recent_limit: usize,
}

impl Aggregator {
    pub fn new(recent_limit: usize) -> Self {
        Self { recent_limit }
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Build the summary for `player_id` from facts that already passed the
    /// completion filter. Rows of other players, substitute rows and
    /// zero-minute rows are ignored.
    pub fn aggregate(
        &self,
        player_id: &str,
        facts: &[FactRow],
        ctx: &AggregationContext,
    ) -> PlayerSummary {
        let played: Vec<&FactRow> = facts
            .iter()
            .filter(|f| f.player_id == player_id && f.counts_toward_totals())
            .collect();

        let mut games: BTreeSet<(&str, u32)> = BTreeSet::new();
        let mut events: BTreeSet<&str> = BTreeSet::new();
        let mut captain_events: BTreeSet<&str> = BTreeSet::new();
        let mut minutes_by_position = PositionMinutes::new();
        let mut total_minutes = 0u32;

        for fact in &played {
            games.insert((fact.event_id.as_str(), fact.team_number));
            events.insert(fact.event_id.as_str());
            if fact.is_captain {
                captain_events.insert(fact.event_id.as_str());
            }
            let slot = minutes_by_position.entry(fact.position.clone()).or_insert(0);
            *slot = slot.saturating_add(fact.minutes_played);
            total_minutes = total_minutes.saturating_add(fact.minutes_played);
        }

        let player_of_match_count = events
            .iter()
            .filter(|id| {
                ctx.events
                    .get(**id)
                    .is_some_and(|e| e.is_player_of_match(player_id))
            })
            .count();

        PlayerSummary {
            total_games: games.len() as u32,
            total_minutes,
            minutes_by_position,
            captain_games: captain_events.len() as u32,
            player_of_match_count: player_of_match_count as u32,
            recent_games: recent_games(player_id, &played, ctx, self.recent_limit),
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_GAMES)
    }
}
