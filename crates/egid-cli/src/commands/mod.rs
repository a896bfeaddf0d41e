//! Subcommand implementations.

pub mod batch;
pub mod check;
pub mod config;
pub mod extract;
pub mod history;

use std::path::{Path, PathBuf};

use egid_core::{EgidConfig, IdExtractor};
use tracing::debug;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("egid")
        .join("config.json")
}

/// Default location of the result database.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("egid")
        .join("egid.db")
}

/// Configuration used when no file exists.
pub fn default_config() -> EgidConfig {
    let mut config = EgidConfig::default();
    config.store.database_path = default_database_path();
    config
}

/// Load the configuration from `--config`, the default path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<EgidConfig> {
    if let Some(path) = config_path {
        return Ok(EgidConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        Ok(EgidConfig::from_file(&path)?)
    } else {
        Ok(default_config())
    }
}

/// Build the extractor, opening the result store if enabled.
pub fn load_extractor(config_path: Option<&str>) -> anyhow::Result<IdExtractor> {
    let config = load_config(config_path)?;
    Ok(IdExtractor::from_config(config)?)
}
