//! # Synopsis CLI Application
//!
//! Command-line interface for the synopsis pipeline.
//!
//! ## Subcommands
//!
//! - `report`: fetch URLs (or search hits), summarize, print and store the report
//! - `extract`: acquire a single URL and print its text or classified failure
//! - `chunk`: split a text file and print the chunk set as JSON
//! - `list`: show stored reports
//!
//! The Gemini API key is read once here, from `--api-key` or
//! `GEMINI_API_KEY`, and injected into the pipeline.

mod telemetry;

use anyhow::{anyhow, bail};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
use synopsis::acquisition::{acquire, read_hits, urls_from_hits};
use synopsis::fetcher::{FetchConfig, HttpFetcher};
use synopsis::markdown::{print_markdown, report_markdown, status_markdown};
use synopsis::model::{Client, DEFAULT_MODEL};
use synopsis::pipeline::ReportPipeline;
use synopsis::processor::{ChunkOptions, PipelineConfig, split_text};
use synopsis::storage::{ReportRecord, ReportStore, StorageConfig};
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Fetch web documents and condense them into a structured report", long_about = None)]
struct Cli {
    /// Export traces and metrics over OTLP
    #[arg(long, global = true)]
    otel: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a report from a set of URLs
    Report(ReportArgs),

    /// Fetch and extract a single URL
    Extract(ExtractArgs),

    /// Split a text file into chunks
    Chunk(ChunkArgs),

    /// List stored reports
    List(ListArgs),
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// URLs to read
    urls: Vec<String>,

    /// The question the report should answer
    #[arg(short, long)]
    query: String,

    /// JSON file with search hits (`title`, `link`, `snippet`)
    #[arg(long)]
    hits: Option<PathBuf>,

    /// Write the stored record to this file as well
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// LLM model to use
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Gemini API key (defaults to GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Completion requests allowed per minute
    #[arg(long, default_value = "15")]
    requests_per_minute: u32,

    /// Directory for stored reports
    #[arg(long, default_value = ".synopsis/reports")]
    store_dir: PathBuf,

    /// Do not store the report
    #[arg(long)]
    no_store: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL to extract
    url: String,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct ChunkArgs {
    /// Text file to split
    file: PathBuf,

    /// Chunk size in characters
    #[arg(short, long, default_value = "6000")]
    chunk_size: usize,

    /// Characters repeated between neighbouring chunks
    #[arg(long, default_value = "300")]
    chunk_overlap: usize,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Directory for stored reports
    #[arg(long, default_value = ".synopsis/reports")]
    store_dir: PathBuf,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Chunk size in characters
    #[arg(long, default_value = "6000")]
    chunk_size: usize,

    /// Characters repeated between neighbouring chunks
    #[arg(long, default_value = "300")]
    chunk_overlap: usize,

    /// Combined summary size at which condensation stops
    #[arg(long, default_value = "6000")]
    condensation_budget: usize,

    /// Maximum condensation rounds
    #[arg(long, default_value = "3")]
    max_condensation_rounds: usize,

    /// Timeout per completion call in seconds
    #[arg(long, default_value = "60")]
    request_timeout: u64,

    /// Timeout per fetch in seconds
    #[arg(long, default_value = "15")]
    fetch_timeout: u64,

    /// Extra attempts per URL after a failure
    #[arg(long, default_value = "1")]
    retry_count: u32,

    /// Delay before each retry in milliseconds
    #[arg(long, default_value = "1000")]
    retry_delay_ms: u64,

    /// Maximum extracted characters per URL
    #[arg(long, default_value = "20000")]
    max_text_length: usize,

    /// Maximum concurrent fetches or completion calls
    #[arg(long, default_value = "5")]
    concurrency: usize,

    /// Sampling temperature
    #[arg(long, default_value = "0.2")]
    temperature: f64,
}

impl PipelineArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .condensation_budget(self.condensation_budget)
            .max_condensation_rounds(self.max_condensation_rounds)
            .per_request_timeout(Duration::from_secs(self.request_timeout))
            .retry_count(self.retry_count)
            .retry_delay(Duration::from_millis(self.retry_delay_ms))
            .max_extracted_text_length(self.max_text_length)
            .concurrency(self.concurrency)
            .temperature(self.temperature)
            .build()
    }

    fn fetcher(&self) -> anyhow::Result<HttpFetcher> {
        let config = FetchConfig::builder()
            .timeout(Duration::from_secs(self.fetch_timeout))
            .build();
        Ok(HttpFetcher::new(config)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();
    let _otel = telemetry::init_tracing_subscriber(cli.otel, cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Report(args)) => report_command(args).await?,
        Some(Commands::Extract(args)) => extract_command(args).await?,
        Some(Commands::Chunk(args)) => chunk_command(args).await?,
        Some(Commands::List(args)) => list_command(args).await?,
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["synopsis", "--help"]);
        }
    }

    Ok(())
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

async fn collect_urls(args: &ReportArgs) -> anyhow::Result<Vec<String>> {
    let mut urls = args.urls.clone();
    if let Some(path) = &args.hits {
        let hits = read_hits(path).await?;
        urls.extend(urls_from_hits(&hits));
    }
    if urls.is_empty() {
        bail!("no URLs given; pass URLs or --hits FILE");
    }
    Ok(urls)
}

#[instrument(skip(args), fields(query = %args.query))]
async fn report_command(args: ReportArgs) -> anyhow::Result<()> {
    let urls = collect_urls(&args).await?;

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .ok_or_else(|| anyhow!("GEMINI_API_KEY environment variable or --api-key must be set"))?;
    let requests_per_minute = NonZeroU32::new(args.requests_per_minute)
        .ok_or_else(|| anyhow!("--requests-per-minute must be positive"))?;

    let client = Client::new_gemini(&api_key, &args.model, requests_per_minute);
    let pipeline = ReportPipeline::new(args.pipeline.fetcher()?, client, args.pipeline.config())?;

    let progress = spinner(&format!("Reading {} URLs and writing the report...", urls.len()))?;
    let result = tokio::select! {
        result = pipeline.run(&args.query, &urls) => result,
        _ = tokio::signal::ctrl_c() => {
            progress.finish_and_clear();
            bail!("interrupted; no report produced");
        }
    };
    progress.finish_and_clear();

    let run = match result {
        Ok(run) => run,
        Err(failure) => {
            match args.format.as_str() {
                "json" => {
                    let json = serde_json::json!({
                        "error": failure.error.to_string(),
                        "kind": failure.error.kind(),
                        "statuses": failure.statuses,
                        "trace": failure.trace,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                _ => print_markdown(&status_markdown(&failure.statuses))?,
            }
            return Err(failure.into());
        }
    };

    match args.format.as_str() {
        "json" => {
            let json = serde_json::json!({
                "report": run.report,
                "statuses": run.statuses,
                "trace": run.trace,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => print_markdown(&report_markdown(&run.report, &run.statuses))?,
    }

    let record = ReportRecord::new(&args.query, run.report, run.statuses);
    save_record(&args, &record).await?;
    Ok(())
}

async fn save_record(args: &ReportArgs, record: &ReportRecord) -> synopsis::Result<()> {
    if !args.no_store {
        let store = ReportStore::with_config(StorageConfig {
            base_path: args.store_dir.clone(),
        });
        let path = store.save(record).await?;
        eprintln!("Saved report to {}", path.display());
    }
    if let Some(output) = &args.output {
        tokio::fs::write(output, serde_json::to_string_pretty(record)?).await?;
        eprintln!("Wrote report to {}", output.display());
    }
    Ok(())
}

#[instrument(skip(args), fields(url = %args.url))]
async fn extract_command(args: ExtractArgs) -> anyhow::Result<()> {
    let fetcher = args.pipeline.fetcher()?;
    let config = args.pipeline.config();
    config.validate()?;

    let progress = spinner(&format!("Fetching {}...", args.url))?;
    let result = acquire(&fetcher, &args.url, &config).await;
    progress.finish_and_clear();

    let (kind, attempts) = (result.kind, result.attempts);
    let text = result.into_text()?;
    eprintln!(
        "Extracted {} characters ({:?}, {} attempts)",
        text.chars().count(),
        kind,
        attempts
    );
    println!("{}", text);
    Ok(())
}

#[instrument(skip(args))]
async fn chunk_command(args: ChunkArgs) -> synopsis::Result<()> {
    let text = tokio::fs::read_to_string(&args.file).await?;
    let options = ChunkOptions {
        chunk_size: args.chunk_size,
        overlap: args.chunk_overlap,
    };
    let chunks = split_text(&text, &options)?;
    println!("{}", serde_json::to_string_pretty(&chunks)?);
    Ok(())
}

#[instrument(skip(args))]
async fn list_command(args: ListArgs) -> synopsis::Result<()> {
    let store = ReportStore::with_config(StorageConfig {
        base_path: args.store_dir,
    });
    let records = store.list().await?;
    println!("Stored reports: {}", records.len());

    for record in records {
        println!(
            "{} - {} ({} sources, {})",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.report.title,
            record.statuses.len(),
            record.id
        );
    }

    Ok(())
}
