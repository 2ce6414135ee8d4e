//! Player statistics reconciliation engine
//!
//! Turns team selections into per-period playing-time facts and folds them
//! into per-player summaries. See [`rebuild::RebuildOrchestrator`] for the
//! entry points.

pub mod config;
pub mod model;
pub mod rebuild;
pub mod sqlite_pragma;
pub mod stats_core;
pub mod store;

pub use config::{ConfigError, StatsConfig};
pub use rebuild::{PlayerTrace, RebuildCancel, RebuildError, RebuildOrchestrator, RebuildReport};
