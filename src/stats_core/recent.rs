//! Per-event game summaries and the recent-games window

use super::aggregator::AggregationContext;
use crate::model::{FactRow, GameSummary, PositionMinutes};
use std::collections::BTreeMap;

pub const DEFAULT_RECENT_GAMES: usize = 10;

/// Fold every played period of one event into a single summary. Returns
/// `None` when the event is unknown (no date to place it in time).
pub fn game_summary(
    player_id: &str,
    event_id: &str,
    facts: &[&FactRow],
    ctx: &AggregationContext,
) -> Option<GameSummary> {
    let event = ctx.events.get(event_id)?;

    let mut ordered: Vec<&FactRow> = facts.to_vec();
    ordered.sort_by_key(|f| (f.team_number, f.period_number));

    let mut minutes_by_position = PositionMinutes::new();
    let mut total_minutes = 0u32;
    let mut captain = false;
    for fact in &ordered {
        let slot = minutes_by_position.entry(fact.position.clone()).or_insert(0);
        *slot = slot.saturating_add(fact.minutes_played);
        total_minutes = total_minutes.saturating_add(fact.minutes_played);
        captain |= fact.is_captain;
    }

    let performance_category = ordered
        .iter()
        .find_map(|f| f.performance_category_id.as_deref())
        .and_then(|id| ctx.categories.get(id).cloned());

    Some(GameSummary {
        event_id: event_id.to_string(),
        opponent: event.opponent.clone(),
        date: event.date,
        minutes_by_position,
        total_minutes,
        captain,
        player_of_match: event.is_player_of_match(player_id),
        performance_category,
    })
}

/// Most recent `limit` distinct events, newest first. Same-day events are
/// ordered by event id so repeated rebuilds produce the same list.
pub fn recent_games(
    player_id: &str,
    played: &[&FactRow],
    ctx: &AggregationContext,
    limit: usize,
) -> Vec<GameSummary> {
    let mut by_event: BTreeMap<&str, Vec<&FactRow>> = BTreeMap::new();
    for fact in played.iter().copied() {
        by_event.entry(fact.event_id.as_str()).or_default().push(fact);
    }

    let mut games: Vec<GameSummary> = by_event
        .iter()
        .filter_map(|(event_id, facts)| game_summary(player_id, event_id, facts, ctx))
        .collect();

    games.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.event_id.cmp(&b.event_id)));
    games.truncate(limit);
    games
}
