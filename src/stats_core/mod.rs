//! Statistics Core - selection reconciliation engine
//!
//! Pure, storage-free stages of the pipeline.
//!
//! # Architecture
//!
//! ```text
//! SelectionRecord[] → FactDeriver → FactRow[]
//!     ↓
//! CompletionFilter (finished events only)
//!     ↓
//! Aggregator (+ recent-games window) → PlayerSummary
//!     ↓
//! TrendScorer (read-time, never persisted)
//! ```

pub mod aggregator;
pub mod completion;
pub mod deriver;
pub mod recent;
pub mod trend;

pub use aggregator::{AggregationContext, Aggregator};
pub use completion::{is_eligible_at, Clock, CompletionFilter, EligibleFacts};
pub use deriver::{
    derive_facts, AssignmentSlot, Derivation, DerivationWarning, DeriverOptions, FactDeriver,
    MalformedReason,
};
pub use recent::{game_summary, recent_games};
pub use trend::{PerformanceTrend, TrendScore, TrendScorer, TrendThresholds};
