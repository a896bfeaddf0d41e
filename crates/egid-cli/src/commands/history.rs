//! History and search commands - query stored extractions.

use clap::Args;
use console::style;

use egid_core::HistoryEntry;

use super::extract::OutputFormat;
use super::load_extractor;

/// Arguments for the history command.
#[derive(Args)]
pub struct HistoryArgs {
    /// Maximum number of entries to show
    #[arg(short, long, default_value = "50")]
    limit: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// National ID to look up (exact match)
    #[arg(required = true)]
    national_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub fn run_history(args: HistoryArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let extractor = load_extractor(config_path)?;

    let Some(entries) = extractor.get_history(args.limit) else {
        anyhow::bail!("Failed to read extraction history");
    };

    print_entries(&entries, args.format, "No history found.")
}

pub fn run_search(args: SearchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let extractor = load_extractor(config_path)?;

    let Some(entries) = extractor.search_by_national_id(&args.national_id) else {
        anyhow::bail!("Failed to search extractions");
    };

    print_entries(&entries, args.format, "No records found.")
}

fn print_entries(entries: &[HistoryEntry], format: OutputFormat, empty: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(entries)?),
        OutputFormat::Csv => print!("{}", format_csv(entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("{} {}", style("ℹ").blue(), empty);
            }
            for entry in entries {
                println!("{}", format_line(entry));
            }
        }
    }
    Ok(())
}

fn format_line(entry: &HistoryEntry) -> String {
    let name = if entry.full_name.is_empty() { "(no name)" } else { &entry.full_name };
    let id = if entry.national_id.is_empty() { "-" } else { &entry.national_id };

    format!(
        "{} {} (ID: {}) - {}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        name,
        id,
        entry.image_url
    )
}

fn format_csv(entries: &[HistoryEntry]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "image_url",
        "first_name",
        "second_name",
        "full_name",
        "national_id",
        "address",
        "birth_date",
        "governorate",
        "gender",
        "created_at",
    ])?;

    for entry in entries {
        wtr.write_record([
            &entry.id.to_string(),
            &entry.image_url,
            &entry.first_name,
            &entry.second_name,
            &entry.full_name,
            &entry.national_id,
            &entry.address,
            &entry.birth_date,
            &entry.governorate,
            &entry.gender,
            &entry.created_at.to_rfc3339(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
