//! Core library for Egyptian ID card extraction.
//!
//! This crate provides:
//! - Shell-safe invocation of the external OCR program
//! - Parsing of the JSON record out of its mixed log output
//! - SQLite persistence with history and national ID lookup
//! - The `IdExtractor` facade combining the above

pub mod error;
pub mod extractor;
pub mod models;
pub mod ocr;
pub mod store;

pub use error::{EgidError, ErrorKind, InputError, ParseError, ProcessError, Result, StoreError};
pub use extractor::IdExtractor;
pub use models::config::EgidConfig;
pub use models::record::{ExtractedRecord, HistoryEntry};
pub use store::{ResultStore, SqliteResultStore};
