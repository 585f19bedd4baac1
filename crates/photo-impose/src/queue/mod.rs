//! Persisted export queue
//!
//! - Storage of records and documents on disk
//! - Queue operations (add, remove, reorder, clear)
//! - Merging every queued document into one export

mod db;
mod merge;
mod store;

pub use db::QueueDb;
pub use merge::merge_documents;
pub use store::ExportQueue;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of one queued document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// UUID v4, also the storage key
    pub id: String,
    pub name: String,
    pub page_count: usize,
    pub created_at: DateTime<Utc>,
    /// Position in the queue, 0-based
    pub order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}
