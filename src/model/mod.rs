//! Data model shared by the engine, the stores and the orchestrator

pub mod event;
pub mod fact;
pub mod selection;
pub mod summary;

pub use event::{parse_end_time, EventInfo, PerformanceCategory};
pub use fact::{FactKey, FactRow};
pub use selection::{Assignment, SelectionPayload, SelectionRecord};
pub use summary::{GameSummary, PlayerRecord, PlayerSummary, PositionMinutes};
