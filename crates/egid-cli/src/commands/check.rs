//! Check command - verify the OCR executable is available.

use console::style;
use egid_core::IdExtractor;

use super::load_config;

pub async fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    // The probe never touches the database.
    config.store.enabled = false;

    let extractor = IdExtractor::new(config)?;
    let executable = &extractor.config().ocr.executable;

    if extractor.test_connection().await {
        println!("{} OCR executable '{}' is working.", style("✓").green(), executable);
        Ok(())
    } else {
        anyhow::bail!("OCR executable '{}' is not working", executable)
    }
}
