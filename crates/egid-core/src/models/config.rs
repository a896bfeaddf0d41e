//! Configuration structures for the extraction client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{EgidError, Result};

/// Main configuration for the egid client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EgidConfig {
    /// External OCR program configuration.
    pub ocr: OcrServiceConfig,

    /// Result store configuration.
    pub store: StoreConfig,

    /// Input restrictions.
    pub security: SecurityConfig,
}

/// External OCR program configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrServiceConfig {
    /// Interpreter or program used to run the extraction script.
    pub executable: String,

    /// Working directory the extraction script is run from.
    pub service_dir: PathBuf,

    /// Extraction script name, relative to `service_dir`.
    pub script: String,

    /// Timeout in seconds for one extraction (0 = no timeout).
    pub timeout_secs: u64,

    /// Flag passed to the executable by the liveness probe.
    pub version_flag: String,
}

impl Default for OcrServiceConfig {
    fn default() -> Self {
        Self {
            executable: "python3".to_string(),
            service_dir: PathBuf::from("."),
            script: "extract_single.py".to_string(),
            timeout_secs: 60,
            version_flag: "--version".to_string(),
        }
    }
}

/// Result store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persist extraction results.
    pub enabled: bool,

    /// SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: PathBuf::from("egid.db"),
        }
    }
}

/// Restrictions applied to image references before the OCR program runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Hosts allowed for http(s) image URLs, subdomains included (empty = any).
    pub allowed_domains: Vec<String>,

    /// Maximum local image size in bytes (0 = unlimited).
    pub max_image_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            max_image_size: 10 * 1024 * 1024,
        }
    }
}

impl SecurityConfig {
    /// Check a URL host against the allow-list.
    pub fn is_domain_allowed(&self, host: &str) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }

        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.allowed_domains.iter().any(|domain| {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        })
    }
}

impl EgidConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check the configuration once before use.
    pub fn validate(&self) -> Result<()> {
        if self.ocr.executable.trim().is_empty() {
            return Err(EgidError::Config("ocr.executable must not be empty".to_string()));
        }
        if self.ocr.script.trim().is_empty() {
            return Err(EgidError::Config("ocr.script must not be empty".to_string()));
        }
        if !self.ocr.service_dir.is_dir() {
            return Err(EgidError::Config(format!(
                "ocr.service_dir is not a directory: {}",
                self.ocr.service_dir.display()
            )));
        }
        if self.store.enabled && self.store.database_path.as_os_str().is_empty() {
            return Err(EgidError::Config(
                "store.database_path must be set when the store is enabled".to_string(),
            ));
        }
        Ok(())
    }
}
