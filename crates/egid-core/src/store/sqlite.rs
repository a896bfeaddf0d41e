//! SQLite-backed result store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, error, info};

use super::migrations::run_migrations;
use super::{Result, ResultStore};
use crate::error::StoreError;
use crate::models::record::{ExtractedRecord, HistoryEntry};

const SELECT_COLUMNS: &str = "SELECT id, image_url, first_name, second_name, full_name, national_id,
        address, birth_date, governorate, gender, created_at
 FROM extracted_id_data";

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StoreError::InvalidRow(format!("invalid created_at '{value}': {err}")))
}

fn row_to_entry(row: &Row) -> Result<HistoryEntry> {
    let created_at: String = row.get("created_at")?;

    Ok(HistoryEntry {
        id: row.get("id")?,
        image_url: row.get("image_url")?,
        first_name: row.get("first_name")?,
        second_name: row.get("second_name")?,
        full_name: row.get("full_name")?,
        national_id: row.get("national_id")?,
        address: row.get("address")?,
        birth_date: row.get("birth_date")?,
        governorate: row.get("governorate")?,
        gender: row.get("gender")?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Result store writing to the `extracted_id_data` table.
pub struct SqliteResultStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteResultStore {
    /// Open (and migrate) the database at `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            error!("Failed to enable WAL mode: {err}");
        }
        run_migrations(&mut conn)?;

        info!("Result store opened at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn query_entries(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(row_to_entry(row)?);
        }
        Ok(entries)
    }
}

impl ResultStore for SqliteResultStore {
    fn save(&self, source_reference: &str, record: &ExtractedRecord) -> Result<i64> {
        let [first_name, second_name, full_name, national_id, address, birth_date, governorate, gender] =
            record.column_values();

        let conn = self.lock();
        conn.execute(
            "INSERT INTO extracted_id_data
                (image_url, first_name, second_name, full_name, national_id,
                 address, birth_date, governorate, gender)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                source_reference,
                first_name,
                second_name,
                full_name,
                national_id,
                address,
                birth_date,
                governorate,
                gender,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Saved extraction {} for {}", id, source_reference);
        Ok(id)
    }

    fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        self.query_entries(
            &format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?1"),
            params![limit],
        )
    }

    fn search_by_national_id(&self, national_id: &str) -> Result<Vec<HistoryEntry>> {
        self.query_entries(
            &format!("{SELECT_COLUMNS} WHERE national_id = ?1 ORDER BY created_at DESC, id DESC"),
            params![national_id],
        )
    }
}
