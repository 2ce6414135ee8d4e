//! Completion filter: only chronologically finished events feed the aggregator
//!
//! Facts for unfinished events stay materialized; they are simply excluded
//! from aggregation until the event becomes eligible.

use crate::model::{EventInfo, FactRow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Source of "now" in local wall-clock time
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Eligibility rule evaluated against an explicit `now`
///
/// - event day before today: eligible
/// - event day today with an end time: eligible once `now` is past it
/// - event day today without an end time: not eligible
/// - event day in the future: not eligible
pub fn is_eligible_at(now: NaiveDateTime, event_date: NaiveDate, end_time: Option<NaiveTime>) -> bool {
    let today = now.date();
    if event_date < today {
        return true;
    }
    if event_date > today {
        return false;
    }
    match end_time {
        Some(end) => now > event_date.and_time(end),
        None => false,
    }
}

#[derive(Clone)]
pub struct CompletionFilter {
    now_fn: Clock,
}

impl CompletionFilter {
    /// Filter backed by the local system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(|| chrono::Local::now().naive_local()))
    }

    /// Filter with a custom clock (used for deterministic tests)
    pub fn with_clock(now_fn: Clock) -> Self {
        Self { now_fn }
    }

    pub fn fixed(now: NaiveDateTime) -> Self {
        Self::with_clock(Arc::new(move || now))
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.now_fn)()
    }

    pub fn is_eligible(&self, event_date: NaiveDate, end_time: Option<NaiveTime>) -> bool {
        is_eligible_at(self.now(), event_date, end_time)
    }

    pub fn is_event_eligible(&self, event: &EventInfo) -> bool {
        self.is_eligible(event.date, event.end_time)
    }

    /// Split facts into those allowed into aggregation and the events holding
    /// the rest back. The clock is read once so one call sees one `now`.
    pub fn partition(&self, facts: &[FactRow], events: &HashMap<String, EventInfo>) -> EligibleFacts {
        let now = self.now();
        let mut verdicts: HashMap<&str, bool> = HashMap::new();
        let mut result = EligibleFacts::default();

        for fact in facts {
            let eligible = *verdicts.entry(fact.event_id.as_str()).or_insert_with(|| {
                match events.get(&fact.event_id) {
                    Some(event) => is_eligible_at(now, event.date, event.end_time),
                    None => false,
                }
            });

            if eligible {
                result.eligible.push(fact.clone());
            } else if events.contains_key(&fact.event_id) {
                result.unfinished_events.insert(fact.event_id.clone());
            } else {
                result.unknown_events.insert(fact.event_id.clone());
            }
        }

        result
    }
}

impl Default for CompletionFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EligibleFacts {
    pub eligible: Vec<FactRow>,
    /// Events that exist but have not finished yet
    pub unfinished_events: BTreeSet<String>,
    /// Events referenced by facts but missing from the events collaborator
    pub unknown_events: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_past_day_is_eligible() {
        let now = at(2024, 5, 10, 9, 0);
        assert!(is_eligible_at(now, day(2024, 5, 9), None));
        assert!(is_eligible_at(now, day(2024, 5, 9), NaiveTime::from_hms_opt(23, 59, 0)));
    }

    #[test]
    fn test_future_day_is_not_eligible() {
        let now = at(2024, 5, 10, 23, 0);
        assert!(!is_eligible_at(now, day(2024, 5, 11), NaiveTime::from_hms_opt(0, 1, 0)));
        assert!(!is_eligible_at(now, day(2024, 5, 11), None));
    }

    #[test]
    fn test_today_without_end_time_is_not_eligible() {
        let now = at(2024, 5, 10, 23, 59);
        assert!(!is_eligible_at(now, day(2024, 5, 10), None));
    }

    #[test]
    fn test_today_with_end_time() {
        let end = NaiveTime::from_hms_opt(18, 30, 0);
        assert!(!is_eligible_at(at(2024, 5, 10, 18, 0), day(2024, 5, 10), end));
        assert!(!is_eligible_at(at(2024, 5, 10, 18, 30), day(2024, 5, 10), end));
        assert!(is_eligible_at(at(2024, 5, 10, 18, 31), day(2024, 5, 10), end));
    }

    #[test]
    fn test_partition_reports_held_back_events() {
        let filter = CompletionFilter::fixed(at(2024, 5, 10, 12, 0));
        let mut events = HashMap::new();
        events.insert("past".to_string(), EventInfo::new("past", day(2024, 5, 1)));
        events.insert("today".to_string(), EventInfo::new("today", day(2024, 5, 10)));

        let fact = |event: &str| FactRow {
            player_id: "p1".to_string(),
            event_id: event.to_string(),
            team_number: 1,
            period_number: 1,
            position: "CM".to_string(),
            minutes_played: 90,
            is_captain: false,
            is_substitute: false,
            performance_category_id: None,
        };
        let facts = vec![fact("past"), fact("today"), fact("ghost")];

        let split = filter.partition(&facts, &events);

        assert_eq!(split.eligible.len(), 1);
        assert_eq!(split.eligible[0].event_id, "past");
        assert!(split.unfinished_events.contains("today"));
        assert!(split.unknown_events.contains("ghost"));
    }
}
