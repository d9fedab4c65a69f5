//! CLI entry point for the outing carbon tool.
//!
//! Computes the distance and CO2 emissions of every outing listed in a CSV
//! export, and converts the resulting JSON back to CSV.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use outing_carbon::{
    config::Config,
    fetch::BasicClient,
    output::{JsonArrayWriter, read_outings, write_csv},
    processor::{RowProcessor, run},
};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "outing_carbon")]
#[command(about = "Carbon footprint of club outings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute distances and emissions for every outing of a CSV file
    Process {
        /// CSV export of the outings
        #[arg(value_name = "INPUT_CSV")]
        input: PathBuf,

        /// JSON file to write, stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a JSON file produced by `process` to CSV
    ExportCsv {
        /// JSON file produced by `process`
        #[arg(value_name = "INPUT_JSON")]
        input: PathBuf,

        /// CSV file to write, stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/outing_carbon.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("outing_carbon.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process { input, output } => process(&input, output.as_deref()).await?,
        Commands::ExportCsv { input, output } => export_csv(&input, output.as_deref())?,
    }

    Ok(())
}

fn create_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout().lock()),
    })
}

/// Runs the pipeline over `input` and streams the outings as JSON.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
async fn process(input: &Path, output: Option<&Path>) -> Result<()> {
    let config = Config::from_env()?;
    if config.use_distance_provider {
        info!(departure_time = config.departure_time, "Distance provider enabled");
    } else {
        warn!("Distance provider disabled, every distance is computed as the crow flies");
    }

    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(input)
        .with_context(|| format!("cannot open {}", input.display()))?;

    let processor = RowProcessor::new(BasicClient::new()?, &config);
    let mut writer = JsonArrayWriter::new(create_output(output)?);

    let summary = run(&processor, reader, &mut writer).await?;
    writer.finish()?;

    info!(
        outings = summary.outings,
        ok = summary.ok,
        errors = summary.errors,
        segments = summary.segments,
        "Run summary"
    );
    Ok(())
}

#[tracing::instrument(skip_all, fields(input = %input.display()))]
fn export_csv(input: &Path, output: Option<&Path>) -> Result<()> {
    let file = File::open(input).with_context(|| format!("cannot open {}", input.display()))?;
    let outings = read_outings(BufReader::new(file))?;

    write_csv(&outings, create_output(output)?)?;

    info!(outings = outings.len(), "CSV export written");
    Ok(())
}
