//! Rebuild orchestration: the only writer of fact rows and player summaries

pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod report;

pub use cancel::RebuildCancel;
pub use error::RebuildError;
pub use orchestrator::RebuildOrchestrator;
pub use report::{PlayerFailure, PlayerTrace, RebuildReport};
