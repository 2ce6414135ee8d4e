//! Rebuild orchestrator - drives derive → replace → filter → aggregate → write
//!
//! ## Full rebuild
//!
//! ```text
//! list_selections()
//!     ↓
//! FactDeriver::derive()            (warnings counted, never fatal)
//!     ↓
//! replace_all_facts()              (atomic; failure aborts the run)
//!     ↓
//! load events + categories         (failure aborts the run)
//!     ↓
//! per player, ≤ N concurrent:
//!     CompletionFilter → Aggregator → write_summary
//! ```
//!
//! Per-player failures are counted and logged; the batch carries on.
//! Cancellation is checked before each player is scheduled, so a player is
//! either fully written or untouched.

use super::cancel::RebuildCancel;
use super::error::RebuildError;
use super::report::{PlayerFailure, PlayerTrace, RebuildReport};
use crate::config::StatsConfig;
use crate::model::{FactRow, PlayerSummary};
use crate::stats_core::{
    AggregationContext, Aggregator, CompletionFilter, FactDeriver, TrendScore, TrendScorer,
    TrendThresholds,
};
use crate::store::{
    CategorySource, EventSource, FactStore, PlayerStore, SelectionSource, StatsStore, StoreError,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

pub struct RebuildOrchestrator {
    store: Arc<dyn StatsStore>,
    deriver: FactDeriver,
    filter: CompletionFilter,
    aggregator: Arc<Aggregator>,
    trend: TrendScorer,
    concurrency: usize,
}

impl RebuildOrchestrator {
    /// Orchestrator using the local system clock for event completion
    pub fn new(store: Arc<dyn StatsStore>, config: &StatsConfig) -> Self {
        Self::with_completion_filter(store, config, CompletionFilter::new())
    }

    /// Orchestrator with a custom completion filter (deterministic tests)
    pub fn with_completion_filter(
        store: Arc<dyn StatsStore>,
        config: &StatsConfig,
        filter: CompletionFilter,
    ) -> Self {
        Self {
            store,
            deriver: FactDeriver::new(config.deriver_options()),
            filter,
            aggregator: Arc::new(Aggregator::new(config.recent_games)),
            trend: TrendScorer::new(config.trend_window, TrendThresholds::default()),
            concurrency: config.rebuild_concurrency.max(1),
        }
    }

    /// Re-derive every fact row and recompute every player found in the old
    /// or the new fact set
    pub async fn rebuild_all(&self, cancel: &RebuildCancel) -> Result<RebuildReport, RebuildError> {
        let started = Instant::now();
        if cancel.is_cancelled() {
            return Err(RebuildError::Cancelled);
        }

        log::info!("🔄 Full statistics rebuild starting");

        // Players whose facts disappear still need a fresh (empty) summary
        let previous = self.store.list_facts().await.map_err(RebuildError::Storage)?;
        let mut players: BTreeSet<String> =
            previous.iter().map(|f| f.player_id.clone()).collect();

        let mut report = RebuildReport::default();
        let facts = self.rederive_facts(&mut report).await?;
        players.extend(facts.iter().map(|f| f.player_id.clone()));

        self.aggregate_players(players.into_iter().collect(), &facts, cancel, &mut report)
            .await?;

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        log_report("Full rebuild", &report);
        Ok(report)
    }

    /// Recompute one player from the facts already materialized for them
    pub async fn rebuild_player(&self, player_id: &str) -> Result<PlayerTrace, RebuildError> {
        log::info!("🔍 Diagnostic rebuild for player {}", player_id);

        let facts = self
            .store
            .facts_for_player(player_id)
            .await
            .map_err(|source| RebuildError::PlayerAggregation {
                player_id: player_id.to_string(),
                source,
            })?;
        let ctx = self.load_context(&facts).await?;

        let partition = self.filter.partition(&facts, &ctx.events);
        let summary = self.aggregator.aggregate(player_id, &partition.eligible, &ctx);

        self.store
            .write_summary(player_id, &summary)
            .await
            .map_err(|source| RebuildError::PlayerAggregation {
                player_id: player_id.to_string(),
                source,
            })?;

        let trend = self.trend.score(player_id, &partition.eligible, &ctx);

        log::info!(
            "   └─ ✅ {}: {} facts ({} eligible), {} games, {} minutes, trend {}",
            player_id,
            facts.len(),
            partition.eligible.len(),
            summary.total_games,
            summary.total_minutes,
            trend.trend.as_str()
        );

        Ok(PlayerTrace {
            player_id: player_id.to_string(),
            facts_considered: facts.len(),
            facts_eligible: partition.eligible.len(),
            substitute_facts_ignored: facts.iter().filter(|f| f.is_substitute).count(),
            unfinished_events: partition.unfinished_events.into_iter().collect(),
            unknown_events: partition.unknown_events.into_iter().collect(),
            summary,
            trend,
        })
    }

    /// A selection of `event_id` changed: re-derive all facts, then recompute
    /// only the players that appear in that event before or after the change.
    pub async fn rebuild_for_event(
        &self,
        event_id: &str,
        cancel: &RebuildCancel,
    ) -> Result<RebuildReport, RebuildError> {
        let started = Instant::now();
        if cancel.is_cancelled() {
            return Err(RebuildError::Cancelled);
        }

        log::info!("🔄 Rebuild triggered by event {}", event_id);

        let previous = self.store.list_facts().await.map_err(RebuildError::Storage)?;
        let mut players: BTreeSet<String> = players_in_event(&previous, event_id);

        let mut report = RebuildReport::default();
        let facts = self.rederive_facts(&mut report).await?;
        players.extend(players_in_event(&facts, event_id));

        self.aggregate_players(players.into_iter().collect(), &facts, cancel, &mut report)
            .await?;

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        log_report("Event rebuild", &report);
        Ok(report)
    }

    /// A performance category changed: recompute the players tagged with it.
    /// Facts are not re-derived.
    pub async fn rebuild_for_category(
        &self,
        category_id: &str,
        cancel: &RebuildCancel,
    ) -> Result<RebuildReport, RebuildError> {
        let started = Instant::now();
        if cancel.is_cancelled() {
            return Err(RebuildError::Cancelled);
        }

        log::info!("🔄 Rebuild triggered by performance category {}", category_id);

        let facts = self.store.list_facts().await.map_err(RebuildError::Storage)?;
        let players: Vec<String> = facts
            .iter()
            .filter(|f| f.performance_category_id.as_deref() == Some(category_id))
            .map(|f| f.player_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut report = RebuildReport::default();
        self.aggregate_players(players, &facts, cancel, &mut report)
            .await?;

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        log_report("Category rebuild", &report);
        Ok(report)
    }

    /// Read-time trend from materialized facts. Nothing is written.
    pub async fn player_trend(&self, player_id: &str) -> Result<TrendScore, RebuildError> {
        let facts = self
            .store
            .facts_for_player(player_id)
            .await
            .map_err(|source| RebuildError::PlayerAggregation {
                player_id: player_id.to_string(),
                source,
            })?;
        let ctx = self.load_context(&facts).await?;
        let partition = self.filter.partition(&facts, &ctx.events);
        Ok(self.trend.score(player_id, &partition.eligible, &ctx))
    }

    /// Fetch selections, derive, and atomically replace the fact table
    async fn rederive_facts(&self, report: &mut RebuildReport) -> Result<Vec<FactRow>, RebuildError> {
        let batch = self
            .store
            .list_selections()
            .await
            .map_err(RebuildError::Storage)?;
        report.selections_quarantined = batch.quarantined.len();

        let derivation = self.deriver.derive(&batch.records);
        report.malformed_assignments = derivation.malformed_count();
        report.duplicate_assignments = derivation.duplicate_count();

        report.fact_rows_created = self
            .store
            .replace_all_facts(&derivation.facts)
            .await
            .map_err(|e| {
                log::error!("❌ Fact replace failed, previous facts kept: {}", e);
                RebuildError::Storage(e)
            })?;

        log::info!(
            "   ├─ {} selections → {} fact rows ({} quarantined, {} malformed, {} duplicates)",
            batch.records.len(),
            report.fact_rows_created,
            report.selections_quarantined,
            report.malformed_assignments,
            report.duplicate_assignments
        );

        Ok(derivation.facts)
    }

    async fn load_context(&self, facts: &[FactRow]) -> Result<AggregationContext, RebuildError> {
        let event_ids: Vec<String> = facts
            .iter()
            .map(|f| f.event_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let events = self
            .store
            .get_events(&event_ids)
            .await
            .map_err(RebuildError::Context)?;
        let categories = self
            .store
            .list_performance_categories()
            .await
            .map_err(RebuildError::Context)?;

        Ok(AggregationContext::new(events, categories))
    }

    /// Fan out per-player aggregation over at most `concurrency` tasks
    async fn aggregate_players(
        &self,
        players: Vec<String>,
        facts: &[FactRow],
        cancel: &RebuildCancel,
        report: &mut RebuildReport,
    ) -> Result<(), RebuildError> {
        if players.is_empty() {
            return Ok(());
        }

        let wanted: BTreeSet<&str> = players.iter().map(String::as_str).collect();
        let player_facts: Vec<FactRow> = facts
            .iter()
            .filter(|f| wanted.contains(f.player_id.as_str()))
            .cloned()
            .collect();
        let ctx = Arc::new(self.load_context(&player_facts).await?);

        let mut by_player: HashMap<String, Vec<FactRow>> = HashMap::new();
        for fact in player_facts {
            by_player.entry(fact.player_id.clone()).or_default().push(fact);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles: Vec<(String, JoinHandle<Result<PlayerSummary, StoreError>>)> =
            Vec::with_capacity(players.len());
        let total = players.len();

        for (scheduled, player_id) in players.into_iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                report.players_skipped = total - scheduled;
                log::warn!(
                    "⚠️  Rebuild cancelled, {} players left untouched",
                    report.players_skipped
                );
                break;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    log::error!("❌ Aggregation semaphore closed: {}", e);
                    report.players_skipped = total - scheduled;
                    break;
                }
            };

            let store = Arc::clone(&self.store);
            let filter = self.filter.clone();
            let aggregator = Arc::clone(&self.aggregator);
            let ctx = Arc::clone(&ctx);
            let facts = by_player.remove(&player_id).unwrap_or_default();
            let id = player_id.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let partition = filter.partition(&facts, &ctx.events);
                let summary = aggregator.aggregate(&id, &partition.eligible, &ctx);
                store.write_summary(&id, &summary).await?;
                Ok::<PlayerSummary, StoreError>(summary)
            });
            handles.push((player_id, handle));
        }

        for (player_id, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(format!("aggregation task failed: {}", e)),
            };

            match outcome {
                Ok(summary) => {
                    report.players_succeeded += 1;
                    log::debug!(
                        "   ├─ ✅ {}: {} games, {} minutes",
                        player_id,
                        summary.total_games,
                        summary.total_minutes
                    );
                }
                Err(message) => {
                    report.players_failed += 1;
                    log::error!("   ├─ ❌ {}: {}", player_id, message);
                    report.failures.push(PlayerFailure { player_id, message });
                }
            }
        }

        Ok(())
    }
}

fn players_in_event(facts: &[FactRow], event_id: &str) -> BTreeSet<String> {
    facts
        .iter()
        .filter(|f| f.event_id == event_id)
        .map(|f| f.player_id.clone())
        .collect()
}

fn log_report(label: &str, report: &RebuildReport) {
    if report.cancelled {
        log::warn!(
            "⚠️  {} cancelled: {} succeeded, {} failed, {} skipped ({} ms)",
            label,
            report.players_succeeded,
            report.players_failed,
            report.players_skipped,
            report.elapsed_ms
        );
    } else {
        log::info!(
            "✅ {} complete: {} succeeded, {} failed, {} fact rows ({} ms)",
            label,
            report.players_succeeded,
            report.players_failed,
            report.fact_rows_created,
            report.elapsed_ms
        );
    }
}
