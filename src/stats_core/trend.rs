//! Read-time performance trend heuristic
//!
//! Compares the newer half of a player's most recent played facts with the
//! older half. The point values are product-tuned constants, not derived from
//! any statistical model; keep them unchanged unless product signs off.

use super::aggregator::AggregationContext;
use crate::model::FactRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_TREND_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceTrend {
    Improving,
    Maintaining,
    NeedsWork,
}

impl PerformanceTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTrend::Improving => "improving",
            PerformanceTrend::Maintaining => "maintaining",
            PerformanceTrend::NeedsWork => "needs-work",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendThresholds {
    pub min_facts: usize,
    /// Recent average above `older * rise_ratio` scores `+minutes_points`
    pub minutes_rise_ratio: f64,
    /// Recent average below `older * drop_ratio` scores `-minutes_points`
    pub minutes_drop_ratio: f64,
    pub minutes_points: i32,
    pub captain_gain: i32,
    pub captain_loss: i32,
    pub player_of_match_gain: i32,
    pub player_of_match_loss: i32,
    pub improving_at: i32,
    pub needs_work_at: i32,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            min_facts: 3,
            minutes_rise_ratio: 1.1,
            minutes_drop_ratio: 0.8,
            minutes_points: 30,
            captain_gain: 35,
            captain_loss: -15,
            player_of_match_gain: 35,
            player_of_match_loss: -20,
            improving_at: 25,
            needs_work_at: -25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendScore {
    pub score: i32,
    pub facts_used: usize,
    pub trend: PerformanceTrend,
}

pub struct TrendScorer {
    thresholds: TrendThresholds,
    window: usize,
}

impl TrendScorer {
    pub fn new(window: usize, thresholds: TrendThresholds) -> Self {
        Self { thresholds, window }
    }

    /// Score the player's most recent `window` played facts. Facts whose
    /// event is unknown are skipped since they cannot be placed in time.
    pub fn score(&self, player_id: &str, facts: &[FactRow], ctx: &AggregationContext) -> TrendScore {
        let mut played: Vec<&FactRow> = facts
            .iter()
            .filter(|f| f.player_id == player_id && f.counts_toward_totals())
            .filter(|f| ctx.events.contains_key(&f.event_id))
            .collect();

        played.sort_by(|a, b| {
            let da = ctx.events.get(&a.event_id).map(|e| e.date);
            let db = ctx.events.get(&b.event_id).map(|e| e.date);
            db.cmp(&da)
                .then_with(|| a.event_id.cmp(&b.event_id))
                .then_with(|| a.team_number.cmp(&b.team_number))
                .then_with(|| b.period_number.cmp(&a.period_number))
        });
        played.truncate(self.window);

        if played.len() < self.thresholds.min_facts {
            return TrendScore {
                score: 0,
                facts_used: played.len(),
                trend: PerformanceTrend::Maintaining,
            };
        }

        let half = played.len() / 2;
        let recent = &played[..half];
        let older = &played[half..half * 2];

        let t = &self.thresholds;
        let mut score = 0;

        let recent_avg = average_minutes(recent);
        let older_avg = average_minutes(older);
        if recent_avg > older_avg * t.minutes_rise_ratio {
            score += t.minutes_points;
        } else if recent_avg < older_avg * t.minutes_drop_ratio {
            score -= t.minutes_points;
        }

        let recent_captain = captain_events(recent);
        let older_captain = captain_events(older);
        if recent_captain > older_captain {
            score += t.captain_gain;
        } else if recent_captain < older_captain {
            score += t.captain_loss;
        }

        let recent_potm = player_of_match_events(player_id, recent, ctx);
        let older_potm = player_of_match_events(player_id, older, ctx);
        if recent_potm > older_potm {
            score += t.player_of_match_gain;
        } else if recent_potm < older_potm {
            score += t.player_of_match_loss;
        }

        let trend = if score >= t.improving_at {
            PerformanceTrend::Improving
        } else if score <= t.needs_work_at {
            PerformanceTrend::NeedsWork
        } else {
            PerformanceTrend::Maintaining
        };

        TrendScore {
            score,
            facts_used: half * 2,
            trend,
        }
    }

    pub fn trend(&self, player_id: &str, facts: &[FactRow], ctx: &AggregationContext) -> PerformanceTrend {
        self.score(player_id, facts, ctx).trend
    }
}

impl Default for TrendScorer {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_WINDOW, TrendThresholds::default())
    }
}

fn average_minutes(facts: &[&FactRow]) -> f64 {
    if facts.is_empty() {
        return 0.0;
    }
    let total: u64 = facts.iter().map(|f| u64::from(f.minutes_played)).sum();
    total as f64 / facts.len() as f64
}

fn captain_events(facts: &[&FactRow]) -> usize {
    facts
        .iter()
        .filter(|f| f.is_captain)
        .map(|f| f.event_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

fn player_of_match_events(player_id: &str, facts: &[&FactRow], ctx: &AggregationContext) -> usize {
    facts
        .iter()
        .filter(|f| {
            ctx.events
                .get(&f.event_id)
                .is_some_and(|e| e.is_player_of_match(player_id))
        })
        .map(|f| f.event_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventInfo;
    use chrono::NaiveDate;

    fn fact(event: &str, minutes: u32, captain: bool) -> FactRow {
        FactRow {
            player_id: "p1".to_string(),
            event_id: event.to_string(),
            team_number: 1,
            period_number: 1,
            position: "CM".to_string(),
            minutes_played: minutes,
            is_captain: captain,
            is_substitute: false,
            performance_category_id: None,
        }
    }

    /// e1 oldest … e4 newest
    fn ctx() -> AggregationContext {
        let events = (1..=4)
            .map(|d| EventInfo::new(&format!("e{}", d), NaiveDate::from_ymd_opt(2024, 1, d).unwrap()))
            .collect();
        AggregationContext::new(events, Vec::new())
    }

    #[test]
    fn test_too_few_facts_is_maintaining() {
        let facts = vec![fact("e1", 90, false), fact("e2", 10, false)];
        let score = TrendScorer::default().score("p1", &facts, &ctx());

        assert_eq!(score.trend, PerformanceTrend::Maintaining);
        assert_eq!(score.score, 0);
    }

    #[test]
    fn test_improving() {
        let facts = vec![
            fact("e1", 45, false),
            fact("e2", 45, false),
            fact("e3", 90, true),
            fact("e4", 90, false),
        ];
        let score = TrendScorer::default().score("p1", &facts, &ctx());

        assert_eq!(score.score, 30 + 35);
        assert_eq!(score.trend, PerformanceTrend::Improving);
    }

    #[test]
    fn test_needs_work() {
        let mut ctx = ctx();
        ctx.events.get_mut("e1").unwrap().player_of_match_id = Some("p1".to_string());
        let facts = vec![
            fact("e1", 90, false),
            fact("e2", 90, false),
            fact("e3", 30, false),
            fact("e4", 30, false),
        ];
        let score = TrendScorer::default().score("p1", &facts, &ctx);

        assert_eq!(score.score, -30 - 20);
        assert_eq!(score.trend, PerformanceTrend::NeedsWork);
    }

    #[test]
    fn test_captain_loss_alone_is_maintaining() {
        let facts = vec![
            fact("e1", 90, true),
            fact("e2", 90, false),
            fact("e3", 90, false),
            fact("e4", 90, false),
        ];
        let score = TrendScorer::default().score("p1", &facts, &ctx());

        assert_eq!(score.score, -15);
        assert_eq!(score.trend, PerformanceTrend::Maintaining);
    }

    #[test]
    fn test_odd_count_drops_oldest_extra() {
        let facts = vec![fact("e1", 5, false), fact("e2", 90, false), fact("e3", 90, false)];
        let score = TrendScorer::default().score("p1", &facts, &ctx());

        assert_eq!(score.facts_used, 2);
        assert_eq!(score.trend, PerformanceTrend::Maintaining);
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&PerformanceTrend::NeedsWork).unwrap();
        assert_eq!(json, "\"needs-work\"");
        assert_eq!(PerformanceTrend::Improving.as_str(), "improving");
    }
}
