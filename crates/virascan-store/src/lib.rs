//! Persisted hand-off of pipeline state between stages.

pub mod backing;
pub mod workflow;

pub use backing::{MemoryBacking, SlotBacking, SqliteBacking};
pub use workflow::{SharedStore, Slot, WorkflowStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
