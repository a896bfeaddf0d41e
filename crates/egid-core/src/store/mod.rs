//! Persistence of extraction results.

mod migrations;
mod sqlite;

pub use sqlite::SqliteResultStore;

use crate::error::StoreError;
use crate::models::record::{ExtractedRecord, HistoryEntry};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Trait for result store implementations.
pub trait ResultStore: Send + Sync {
    /// Persist one record; absent fields are written as empty strings.
    ///
    /// Returns the new row id.
    fn save(&self, source_reference: &str, record: &ExtractedRecord) -> Result<i64>;

    /// Get the most recent `limit` rows, newest first.
    fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>>;

    /// Get all rows whose national ID equals `national_id`, newest first.
    fn search_by_national_id(&self, national_id: &str) -> Result<Vec<HistoryEntry>>;
}
