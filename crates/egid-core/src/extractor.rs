//! Public extraction API tying the OCR program, parser, and store together.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{EgidError, InputError, Result, StoreError};
use crate::models::config::EgidConfig;
use crate::models::record::{ExtractedRecord, HistoryEntry};
use crate::ocr::{build_command, parse_output, run_command, run_program};
use crate::store::{ResultStore, SqliteResultStore};

/// Extracts ID card fields by running the external OCR program.
///
/// The plain methods log failures and return `None`/`false`; the `try_*`
/// methods return the typed error instead.
pub struct IdExtractor {
    config: EgidConfig,
    store: Option<Arc<dyn ResultStore>>,
}

impl IdExtractor {
    /// Create an extractor without a result store.
    pub fn new(config: EgidConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: None,
        })
    }

    /// Create an extractor, opening the SQLite store if it is enabled.
    pub fn from_config(config: EgidConfig) -> Result<Self> {
        let extractor = Self::new(config)?;
        if !extractor.config.store.enabled {
            return Ok(extractor);
        }

        let store = SqliteResultStore::open(&extractor.config.store.database_path)?;
        Ok(extractor.with_store(store))
    }

    /// Attach a result store.
    pub fn with_store(mut self, store: impl ResultStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &EgidConfig {
        &self.config
    }

    /// Whether a result store is attached.
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.ocr.timeout_secs)
    }

    /// Extract fields from an image URL, optionally persisting them.
    pub async fn extract_from_url(&self, url: &str, persist: bool) -> Option<ExtractedRecord> {
        match self.try_extract_from_url(url, persist).await {
            Ok(record) => Some(record),
            Err(e) => {
                error!("ID extraction failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Extract fields from a local image file, optionally persisting them.
    pub async fn extract_from_file(&self, path: impl AsRef<Path>, persist: bool) -> Option<ExtractedRecord> {
        let path = path.as_ref();
        match self.try_extract_from_file(path, persist).await {
            Ok(record) => Some(record),
            Err(e) => {
                error!("ID extraction failed for {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Like [`extract_from_url`](Self::extract_from_url), returning the failure.
    ///
    /// `file` URLs go through the same checks as
    /// [`try_extract_from_file`](Self::try_extract_from_file).
    pub async fn try_extract_from_url(&self, url: &str, persist: bool) -> Result<ExtractedRecord> {
        let parsed = self.validate_url(url)?;

        if parsed.scheme() == "file" {
            let path = parsed
                .to_file_path()
                .map_err(|_| InputError::InvalidUrl(format!("{url}: not a local file path")))?;
            return self.try_extract_from_file(&path, persist).await;
        }

        self.run_pipeline(url, persist).await
    }

    /// Like [`extract_from_file`](Self::extract_from_file), returning the failure.
    pub async fn try_extract_from_file(&self, path: &Path, persist: bool) -> Result<ExtractedRecord> {
        let absolute = self.check_local_file(path)?;

        // The OCR script strips the prefix itself, so the path is not percent-encoded.
        let reference = format!("file://{}", absolute.display());

        self.run_pipeline(&reference, persist).await
    }

    /// Check existence and size of a local image, returning its canonical path.
    fn check_local_file(&self, path: &Path) -> Result<PathBuf> {
        let metadata = std::fs::metadata(path).map_err(|e| unreadable(path, e))?;
        if !metadata.is_file() {
            return Err(InputError::FileNotFound(path.to_path_buf()).into());
        }

        let limit = self.config.security.max_image_size;
        if limit > 0 && metadata.len() > limit {
            return Err(InputError::FileTooLarge {
                size: metadata.len(),
                limit,
            }
            .into());
        }

        std::fs::canonicalize(path).map_err(|e| unreadable(path, e))
    }

    fn validate_url(&self, url: &str) -> Result<Url> {
        let parsed = Url::parse(url).map_err(|e| InputError::InvalidUrl(format!("{url}: {e}")))?;

        if parsed.scheme() == "file" {
            return Ok(parsed);
        }

        // Every other scheme needs a host, and the host must pass the allow-list.
        let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) else {
            return Err(InputError::InvalidUrl(format!("{url}: missing host")).into());
        };
        if !self.config.security.is_domain_allowed(host) {
            return Err(InputError::DomainNotAllowed(host.to_string()).into());
        }

        Ok(parsed)
    }

    async fn run_pipeline(&self, reference: &str, persist: bool) -> Result<ExtractedRecord> {
        let start = Instant::now();
        info!("Extracting ID data from {}", reference);

        let ocr = &self.config.ocr;
        let command = build_command(&ocr.executable, &ocr.service_dir, &ocr.script, reference);
        let output = run_command(&command, self.timeout()).await?;
        let record = parse_output(&output)?;

        debug!("Extraction took {}ms", start.elapsed().as_millis());

        if persist {
            match &self.store {
                Some(store) => save_record(Arc::clone(store), reference, record.clone()).await,
                None => debug!("No result store configured, skipping save"),
            }
        }

        Ok(record)
    }

    /// Get the most recent `limit` stored extractions, newest first.
    pub fn get_history(&self, limit: u32) -> Option<Vec<HistoryEntry>> {
        self.try_get_history(limit)
            .map_err(|e| error!("Database query error: {}", e))
            .ok()
    }

    /// Get stored extractions with exactly this national ID, newest first.
    pub fn search_by_national_id(&self, national_id: &str) -> Option<Vec<HistoryEntry>> {
        self.try_search_by_national_id(national_id)
            .map_err(|e| error!("Database search error: {}", e))
            .ok()
    }

    pub fn try_get_history(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        Ok(self.store()?.history(limit)?)
    }

    pub fn try_search_by_national_id(&self, national_id: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self.store()?.search_by_national_id(national_id)?)
    }

    fn store(&self) -> Result<&dyn ResultStore> {
        self.store
            .as_deref()
            .ok_or(EgidError::Store(StoreError::NotConfigured))
    }

    /// Check that the configured executable runs.
    pub async fn test_connection(&self) -> bool {
        let ocr = &self.config.ocr;
        match run_program(&ocr.executable, [&ocr.version_flag], self.timeout()).await {
            Ok(output) => {
                debug!("{} reports: {}", ocr.executable, output);
                true
            }
            Err(e) => {
                warn!("OCR executable check failed: {}", e);
                false
            }
        }
    }
}

/// Save on the blocking pool. A failed save is logged and never discards the record.
async fn save_record(store: Arc<dyn ResultStore>, reference: &str, record: ExtractedRecord) {
    let source = reference.to_string();
    let saved = tokio::task::spawn_blocking(move || store.save(&source, &record)).await;

    match saved {
        Ok(Ok(id)) => debug!("Saved extraction {} as row {}", reference, id),
        Ok(Err(e)) => error!("Database save error for {}: {}", reference, e),
        Err(e) => error!("Database save task failed for {}: {}", reference, e),
    }
}

fn unreadable(path: &Path, source: io::Error) -> EgidError {
    let err = if source.kind() == io::ErrorKind::NotFound {
        InputError::FileNotFound(path.to_path_buf())
    } else {
        InputError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    };
    err.into()
}
