//! Extract command - extract data from a single ID card image.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use egid_core::models::record::{ExtractedRecord, FIELD_NAMES};

use super::load_extractor;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Image URL (http, https, file) or local image path
    #[arg(required = true)]
    input: String,

    /// Do not save the result to the database
    #[arg(long)]
    no_save: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let extractor = load_extractor(config_path)?;
    let persist = !args.no_save;

    info!("Processing {}", args.input);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message("Running OCR...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let record = if is_url(&args.input) {
        extractor.extract_from_url(&args.input, persist).await
    } else {
        extractor.extract_from_file(Path::new(&args.input), persist).await
    };

    pb.finish_and_clear();

    let Some(record) = record else {
        anyhow::bail!("Extraction failed for {} (run with -v for details)", args.input);
    };

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Treat inputs with a scheme separator as URLs, anything else as a path.
pub fn is_url(input: &str) -> bool {
    input.contains("://")
}

pub fn format_record(record: &ExtractedRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_csv(record: &ExtractedRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(FIELD_NAMES)?;
    wtr.write_record(record.column_values())?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &ExtractedRecord) -> String {
    let mut output = String::new();

    for name in FIELD_NAMES {
        let value = record.field(name).unwrap_or("-");
        output.push_str(&format!("{:<12} {}\n", label(name), value));
    }

    output
}

fn label(field: &str) -> &'static str {
    match field {
        "first_name" => "First name:",
        "second_name" => "Second name:",
        "full_name" => "Full name:",
        "national_id" => "National ID:",
        "address" => "Address:",
        "birth_date" => "Birth date:",
        "governorate" => "Governorate:",
        "gender" => "Gender:",
        _ => "",
    }
}
