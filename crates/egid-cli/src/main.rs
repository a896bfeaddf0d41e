//! CLI application for Egyptian ID card extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, check, config, extract, history};

/// Egyptian ID OCR - Extract structured data from Egyptian ID card images
#[derive(Parser)]
#[command(name = "egid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract data from a single image URL or file
    Extract(extract::ExtractArgs),

    /// Extract data from multiple image files
    Batch(batch::BatchArgs),

    /// Show recent extractions
    History(history::HistoryArgs),

    /// Find extractions by national ID
    Search(history::SearchArgs),

    /// Check that the OCR executable runs
    Check,

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::History(args) => history::run_history(args, config_path),
        Commands::Search(args) => history::run_search(args, config_path),
        Commands::Check => check::run(config_path).await,
        Commands::Config(args) => config::run(args, config_path),
    }
}
