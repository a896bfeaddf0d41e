//! Data models and configuration.

pub mod config;
pub mod record;

pub use config::{EgidConfig, OcrServiceConfig, SecurityConfig, StoreConfig};
pub use record::{ExtractedRecord, HistoryEntry, FIELD_NAMES};
