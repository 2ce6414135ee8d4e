//! Storage seams and their implementations

pub mod backend;
pub mod memory_store;
pub mod migrations;
pub mod sqlite_store;

pub use backend::{
    CategorySource, EventSource, FactStore, PlayerStore, QuarantinedSelection, SelectionBatch,
    SelectionSource, StatsStore, StoreError,
};
pub use memory_store::MemoryStatsStore;
pub use migrations::run_schema_migrations;
pub use sqlite_store::SqliteStatsStore;
