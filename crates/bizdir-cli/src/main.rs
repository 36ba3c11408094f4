//! `bizdir` command line interface: crawl a business directory for the
//! keyword and location lists in an input file, then export the merged
//! records as JSON or CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use bizdir_core::{load_app_config, load_crawl_input, OutputFormat};
use bizdir_scraper::{
    expand_queries, run_crawl, Aggregator, CrawlOptions, DirectoryClient, FetchSettings,
    TaskOutcome, TaskReport,
};

mod export;

#[derive(Debug, Parser)]
#[command(name = "bizdir")]
#[command(about = "Business directory crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the directory for every keyword/location combination in the
    /// input file and export the merged records.
    Crawl {
        /// Path to the crawl input JSON file.
        #[arg(long)]
        input: PathBuf,

        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (json or csv). Overrides the input file's
        /// outputFormat when given.
        #[arg(long)]
        format: Option<OutputFormat>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_app_config().context("loading configuration from environment")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            input,
            output,
            format,
        } => crawl(&config, &input, output.as_deref(), format).await,
    }
}

async fn crawl(
    config: &bizdir_core::AppConfig,
    input_path: &std::path::Path,
    output_path: Option<&std::path::Path>,
    format_flag: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let input = load_crawl_input(input_path)
        .with_context(|| format!("loading crawl input from {}", input_path.display()))?;
    let format = resolve_format(format_flag, input.output_format.as_deref());

    let tasks = expand_queries(&input.keywords, &input.locations, input.sort_mode)?;
    tracing::info!(
        keywords = input.keywords.len(),
        locations = input.locations.len(),
        tasks = tasks.len(),
        sort = %input.sort_mode,
        "crawl starting"
    );

    let client = Arc::new(DirectoryClient::new(&FetchSettings::from_app_config(
        config,
    ))?);
    let options = CrawlOptions {
        max_pages_per_task: input.max_pages_per_task,
        max_concurrent_tasks: input.concurrency,
        max_records_per_task: input.max_results_per_task,
    };

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight work and exporting partials");
            signal_cancel.cancel();
        }
    });

    let aggregator = Aggregator::new();
    let reports = run_crawl(client, tasks, options, &aggregator, &cancel).await;
    log_summary(&reports);

    let records = aggregator.into_records();
    tracing::info!(records = records.len(), format = ?format, "exporting records");
    match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output file {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_records(&mut out, format, &records)?;
            out.flush()?;
            tracing::info!(path = %path.display(), "export written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_records(&mut out, format, &records)?;
        }
    }
    Ok(())
}

fn write_records<W: Write>(
    out: &mut W,
    format: OutputFormat,
    records: &[bizdir_core::BusinessRecord],
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => export::write_json(out, records),
        OutputFormat::Csv => export::write_csv(out, records),
    }
}

/// The command line flag wins over the input file. An unrecognized format in
/// the input file degrades to JSON with a warning instead of failing a crawl
/// that may have been running for a while by the time anyone notices.
fn resolve_format(flag: Option<OutputFormat>, from_input: Option<&str>) -> OutputFormat {
    if let Some(format) = flag {
        return format;
    }
    match from_input {
        None => OutputFormat::Json,
        Some(raw) => raw.parse().unwrap_or_else(|err: String| {
            tracing::warn!(%err, "falling back to JSON output");
            OutputFormat::Json
        }),
    }
}

fn log_summary(reports: &[TaskReport]) {
    let completed = reports.iter().filter(|r| r.succeeded()).count();
    let blocked = reports
        .iter()
        .filter(|r| matches!(r.outcome, TaskOutcome::Blocked { .. }))
        .count();
    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, TaskOutcome::Failed { .. }))
        .count();
    let pages: u32 = reports.iter().map(|r| r.pages_fetched).sum();
    let extracted: usize = reports.iter().map(|r| r.records_extracted).sum();

    for report in reports {
        match &report.outcome {
            TaskOutcome::Completed => {}
            TaskOutcome::Blocked { reason } => {
                tracing::warn!(task = %report.task.label(), %reason, "task was blocked");
            }
            TaskOutcome::Failed { error } => {
                tracing::error!(task = %report.task.label(), %error, "task failed");
            }
        }
    }
    tracing::info!(
        tasks = reports.len(),
        completed,
        blocked,
        failed,
        pages,
        extracted,
        "crawl finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_input_file_format() {
        assert_eq!(
            resolve_format(Some(OutputFormat::Csv), Some("json")),
            OutputFormat::Csv
        );
    }

    #[test]
    fn input_file_format_used_when_no_flag() {
        assert_eq!(resolve_format(None, Some("csv")), OutputFormat::Csv);
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        assert_eq!(resolve_format(None, Some("xml")), OutputFormat::Json);
        assert_eq!(resolve_format(None, None), OutputFormat::Json);
    }
}
