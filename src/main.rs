use chrono::NaiveDateTime;
use clap::Parser;
use quire::invoice::records_from_json;
use quire::{EngineConfig, Generator, PipelineError, batch_file_name, single_file_name};
use std::fs;
use std::path::PathBuf;

/// Render utility invoice records to PDF.
#[derive(Parser, Debug)]
#[command(name = "quire", version, about)]
struct Cli {
    /// JSON array of invoice records.
    #[arg(short, long)]
    input: PathBuf,

    /// Output file. Defaults to Invoice_Batch_Report_<today>.pdf.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Engine configuration (JSON).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render only the first record as a standalone invoice.
    #[arg(long, conflicts_with = "split")]
    single: bool,

    /// Write one PDF per record into this directory.
    #[arg(long)]
    split: Option<PathBuf>,

    /// Timestamp shown in date fields, as "YYYY-MM-DD HH:MM:SS".
    #[arg(long, value_parser = parse_timestamp)]
    generated_at: Option<NaiveDateTime>,
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map_err(|e| e.to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run(Cli::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let mut generator = Generator::new(config)?;
    if let Some(at) = cli.generated_at {
        generator = generator.with_generated_at(at);
    }

    log::info!("Loading records from {}", cli.input.display());
    let records = records_from_json(&fs::read_to_string(&cli.input)?)?;

    if let Some(dir) = &cli.split {
        generator.write_each(&records, dir)?;
        return Ok(());
    }

    let (bytes, default_name) = if cli.single {
        let record = records.first().ok_or_else(|| {
            PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "the input holds no records",
            ))
        })?;
        (generator.generate_single(record)?, single_file_name(record, 0))
    } else {
        let today = cli
            .generated_at
            .map(|at| at.date())
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        (generator.generate_batch(&records)?, batch_file_name(today))
    };

    let output = cli.output.unwrap_or_else(|| PathBuf::from(default_name));
    fs::write(&output, bytes)?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
