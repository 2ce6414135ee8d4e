//! Fact derivation: selection records → one fact row per (player, event, team, period)
//!
//! Derivation is pure. Problems in the input never abort the pass; they are
//! returned as [`DerivationWarning`]s next to the facts and logged at `warn`.

use crate::model::{Assignment, FactKey, FactRow, SelectionRecord};
use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_DURATION_MINUTES: u32 = 90;
pub const SUBSTITUTE_SENTINEL: &str = "SUB";
pub const UNKNOWN_POSITION: &str = "UNKNOWN";

#[derive(Debug, Clone)]
pub struct DeriverOptions {
    /// Minutes used when neither the assignment nor the selection carries one
    pub default_duration_minutes: u32,
    /// Position value that marks a substitute regardless of list membership
    pub substitute_sentinel: String,
}

impl Default for DeriverOptions {
    fn default() -> Self {
        Self {
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            substitute_sentinel: SUBSTITUTE_SENTINEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSlot {
    Starting,
    Substitute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    MissingPlayerId,
    MissingEventId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationWarning {
    /// Assignment skipped because it cannot be keyed
    MalformedSelection {
        event_id: String,
        team_number: u32,
        period_number: u32,
        slot: AssignmentSlot,
        index: usize,
        reason: MalformedReason,
    },
    /// Second occurrence of a key within one derivation pass, dropped
    DuplicateAssignment { key: FactKey, slot: AssignmentSlot },
}

impl std::fmt::Display for DerivationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DerivationWarning::MalformedSelection {
                event_id,
                team_number,
                period_number,
                slot,
                index,
                reason,
            } => write!(
                f,
                "malformed selection event={} team={} period={} ({:?} #{}): {:?}",
                event_id, team_number, period_number, slot, index, reason
            ),
            DerivationWarning::DuplicateAssignment { key, slot } => {
                write!(f, "duplicate assignment {} ({:?}) dropped", key, slot)
            }
        }
    }
}

/// Output of one derivation pass
#[derive(Debug, Clone, Default)]
pub struct Derivation {
    pub facts: Vec<FactRow>,
    pub warnings: Vec<DerivationWarning>,
}

impl Derivation {
    pub fn malformed_count(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, DerivationWarning::MalformedSelection { .. }))
            .count()
    }

    pub fn duplicate_count(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, DerivationWarning::DuplicateAssignment { .. }))
            .count()
    }

    /// Distinct player ids touched by the derived facts
    pub fn players(&self) -> BTreeSet<String> {
        self.facts.iter().map(|f| f.player_id.clone()).collect()
    }
}

pub struct FactDeriver {
    options: DeriverOptions,
}

impl FactDeriver {
    pub fn new(options: DeriverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DeriverOptions {
        &self.options
    }

    /// Expand every selection independently; duplicates are detected across
    /// the whole pass.
    pub fn derive(&self, selections: &[SelectionRecord]) -> Derivation {
        let mut derivation = Derivation::default();
        let mut seen: HashSet<FactKey> = HashSet::new();

        for selection in selections {
            self.expand(selection, &mut seen, &mut derivation);
        }

        log::debug!(
            "Derived {} fact rows from {} selections ({} warnings)",
            derivation.facts.len(),
            selections.len(),
            derivation.warnings.len()
        );

        derivation
    }

    fn expand(
        &self,
        selection: &SelectionRecord,
        seen: &mut HashSet<FactKey>,
        out: &mut Derivation,
    ) {
        let slots = selection
            .assignments
            .iter()
            .enumerate()
            .map(|(i, a)| (AssignmentSlot::Starting, i, a))
            .chain(
                selection
                    .substitutes
                    .iter()
                    .enumerate()
                    .map(|(i, a)| (AssignmentSlot::Substitute, i, a)),
            );

        let event_missing = selection.event_id.trim().is_empty();

        for (slot, index, assignment) in slots {
            let player_id = match (event_missing, assignment.player()) {
                (false, Some(id)) => id,
                (missing_event, _) => {
                    let reason = if missing_event {
                        MalformedReason::MissingEventId
                    } else {
                        MalformedReason::MissingPlayerId
                    };
                    let warning = DerivationWarning::MalformedSelection {
                        event_id: selection.event_id.clone(),
                        team_number: selection.team_number,
                        period_number: selection.period_number,
                        slot,
                        index,
                        reason,
                    };
                    log::warn!("⚠️  Skipping assignment: {}", warning);
                    out.warnings.push(warning);
                    continue;
                }
            };

            let fact = self.fact_for(selection, player_id, assignment, slot);
            let key = fact.key();
            if !seen.insert(key.clone()) {
                let warning = DerivationWarning::DuplicateAssignment { key, slot };
                log::warn!("⚠️  Data quality: {}", warning);
                out.warnings.push(warning);
                continue;
            }

            out.facts.push(fact);
        }
    }

    fn fact_for(
        &self,
        selection: &SelectionRecord,
        player_id: &str,
        assignment: &Assignment,
        slot: AssignmentSlot,
    ) -> FactRow {
        let position = normalize_position(&assignment.position);
        let is_substitute = slot == AssignmentSlot::Substitute
            || position.eq_ignore_ascii_case(self.options.substitute_sentinel.trim());

        let minutes_played = assignment
            .minutes
            .or(selection.duration_minutes)
            .unwrap_or(self.options.default_duration_minutes);

        let is_captain = selection
            .captain_id
            .as_deref()
            .map(str::trim)
            .is_some_and(|captain| captain == player_id);

        FactRow {
            player_id: player_id.to_string(),
            event_id: selection.event_id.clone(),
            team_number: selection.team_number,
            period_number: selection.period_number,
            position,
            minutes_played,
            is_captain,
            is_substitute,
            performance_category_id: selection.performance_category_id.clone(),
        }
    }
}

impl Default for FactDeriver {
    fn default() -> Self {
        Self::new(DeriverOptions::default())
    }
}

/// Derive facts with default options
pub fn derive_facts(selections: &[SelectionRecord]) -> Derivation {
    FactDeriver::default().derive(selections)
}

pub fn normalize_position(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_POSITION.to_string()
    } else {
        trimmed.to_ascii_uppercase()
    }
}
