use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use vllm_ocr_client::{
    app_state::AppState,
    config::ClientConfig,
    models::{
        document::Document,
        job::JobState,
        ocr::{OcrResponse, ProcessOptions},
        schema::{DocumentKind, ExtractionSchema},
    },
};

#[derive(Parser)]
#[command(name = "ocr-client", version, about = "Command-line client for the VLLM-OCR services")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available extraction models
    Models,
    /// Set the active extraction model
    Activate { name: String },
    /// Extract text from an image synchronously
    Scan {
        file: PathBuf,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
        /// Output template, inline
        #[arg(long, conflicts_with = "template_file")]
        template: Option<String>,
        /// Output template, read from a file
        #[arg(long)]
        template_file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = View::Text)]
        view: View,
    },
    /// Show the service's model benchmark table
    Benchmark,
    /// Submit an image to the job pipeline and wait for the result
    Pipeline {
        file: PathBuf,
        /// Schema as inline JSON ({"field": "description"})
        #[arg(long, conflicts_with_all = ["schema_file", "preset"])]
        schema: Option<String>,
        #[arg(long, conflicts_with = "preset")]
        schema_file: Option<PathBuf>,
        /// Built-in schema: nid-front or nid-back
        #[arg(long)]
        preset: Option<DocumentKind>,
    },
    /// Extract an identity document through the pipeline's direct endpoint
    Direct {
        file: PathBuf,
        /// nid-front or nid-back
        #[arg(long)]
        kind: DocumentKind,
    },
    /// Check that the pipeline service is up
    Health,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    Text,
    Html,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    describe_metrics();

    let config = ClientConfig::from_env().context("Failed to load configuration from environment")?;
    let state = AppState::from_config(config).context("Failed to initialise service clients")?;

    match cli.command {
        Command::Models => list_models(&state).await,
        Command::Activate { name } => {
            let mut registry = state.model_registry();
            registry.activate(&name).await.context("Failed to set active model")?;
            println!("Active model set to {name}");
            Ok(())
        }
        Command::Scan {
            file,
            model,
            prompt,
            template,
            template_file,
            view,
        } => {
            let template = match template_file {
                Some(path) => Some(read_text(&path).await?),
                None => template,
            };
            let options = ProcessOptions {
                model_name: model,
                prompt,
                template,
            };
            scan(&state, &file, &options, view).await
        }
        Command::Benchmark => benchmark(&state).await,
        Command::Pipeline {
            file,
            schema,
            schema_file,
            preset,
        } => {
            let schema = match (schema, schema_file, preset) {
                (Some(raw), _, _) => Some(ExtractionSchema::from_json_str(&raw)?),
                (_, Some(path), _) => Some(ExtractionSchema::from_json_str(&read_text(&path).await?)?),
                (_, _, Some(kind)) => Some(kind.schema()),
                _ => None,
            };
            run_pipeline(&state, &file, schema.as_ref()).await
        }
        Command::Direct { file, kind } => {
            let document = Document::open(&file).await?;
            let result = state
                .pipeline
                .process_direct(&document, kind)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Direct extraction failed")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Health => {
            let health = state.pipeline.health_check().await.context("Pipeline service unreachable")?;
            println!("Pipeline service at {}: {}", state.pipeline.base_url(), health.status);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn describe_metrics() {
    metrics::describe_histogram!("ocr_process_seconds", "Duration of synchronous OCR calls");
    metrics::describe_counter!("pipeline_jobs_submitted_total", "Pipeline jobs accepted by the service");
    metrics::describe_counter!("pipeline_jobs_completed_total", "Pipeline jobs that reached completed");
    metrics::describe_counter!("pipeline_jobs_failed_total", "Pipeline jobs that reached failed");
    metrics::describe_counter!("pipeline_poll_errors_total", "Status polls that errored and were retried");
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn list_models(state: &AppState) -> Result<()> {
    let mut registry = state.model_registry();
    registry.refresh().await.context("Failed to load models")?;

    if registry.models().is_empty() {
        println!("No models available");
        return Ok(());
    }
    for model in registry.models() {
        let marker = if registry.selected() == Some(model.name.as_str()) { "*" } else { " " };
        println!("{marker} {:<32} {}", model.name, model.provider);
    }
    Ok(())
}

async fn scan(state: &AppState, file: &Path, options: &ProcessOptions, view: View) -> Result<()> {
    let document = Document::open(file).await?;
    let start = Instant::now();
    let result = state
        .ocr
        .process(&document, options)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Failed to process image")?;

    eprintln!("Processed in {}", format_elapsed(start.elapsed()));
    print_result(&result, view)
}

fn print_result(result: &OcrResponse, view: View) -> Result<()> {
    match view {
        View::Text => println!("{}", result.text),
        View::Html => {
            if !result.is_html() {
                tracing::warn!(format = %result.format, "Result does not look like HTML");
            }
            println!("{}", result.cleaned_text());
        }
        View::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }
    Ok(())
}

async fn benchmark(state: &AppState) -> Result<()> {
    let rows = state.ocr.benchmarks().await.context("Failed to load benchmarks")?;
    println!(
        "{:<24} {:>10} {:>12} {:>14} {:>10}",
        "MODEL", "ACCURACY", "AVG LATENCY", "THROUGHPUT", "MEMORY"
    );
    for row in rows {
        println!(
            "{:<24} {:>10} {:>12} {:>14} {:>10}",
            row.model, row.accuracy, row.avg_latency, row.throughput, row.memory_usage
        );
    }
    Ok(())
}

async fn run_pipeline(state: &AppState, file: &Path, schema: Option<&ExtractionSchema>) -> Result<()> {
    let document = Document::open(file).await?;
    let tracker = state.job_tracker();
    let start = Instant::now();

    let job_id = tracker.submit(&document, schema).await?;
    println!("Job ID: {job_id}");

    let mut updates = tracker.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let settled = loop {
        let snapshot = updates.borrow_and_update().clone();
        if !snapshot.state.is_active() {
            break snapshot;
        }
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break tracker.snapshot();
                }
            }
            _ = ticker.tick() => eprintln!("{}", format_progress(snapshot.state, start.elapsed())),
            _ = &mut ctrl_c => {
                tracker.reset();
                eprintln!("Abandoned job {job_id}");
                return Ok(());
            }
        }
    };

    eprintln!("Finished in {}", format_elapsed(start.elapsed()));
    match settled.state {
        JobState::Completed => {
            let result = settled.result().cloned().unwrap_or(serde_json::Value::Null);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        JobState::Failed => bail!(settled.error.unwrap_or_else(|| "Job failed".to_string())),
        other => bail!("Job ended in unexpected state '{other}'"),
    }
}

fn format_progress(state: JobState, elapsed: Duration) -> String {
    format!("{state}... {}", format_elapsed(elapsed))
}

/// `0s` under a second, `12.3s` under a minute, `2m 5s` beyond.
fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        return "0s".to_string();
    }
    let seconds = elapsed.as_secs();
    if seconds < 60 {
        return format!("{:.1}s", elapsed.as_secs_f64());
    }
    format!("{}m {}s", seconds / 60, seconds % 60)
}
