//! Scholar Harvest Ingestion
//!
//! Replays crawled staff directory records:
//! 1. Reads crawl dumps (JSON arrays or JSON lines)
//! 2. Cleans and validates every record
//! 3. Reconciles them into the database, or appends them to JSON files
//!    when no database is configured
//! 4. Reports processed/skipped/dropped counts

mod errors;
mod json_sink;
mod pipeline;
mod processor;
mod sink;
mod source;

use clap::{Parser, ValueEnum};
use errors::IngestionError;
use harvest_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    metrics, VERSION,
};
use json_sink::JsonFileSink;
use pipeline::Pipeline;
use processor::Reconciler;
use sink::RecordSink;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// Database when one is configured, JSON files otherwise
    Auto,
    Database,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "harvest", version, about = "Replay crawled staff directory records")]
struct Args {
    /// Crawl dumps, each a JSON array or one record per line
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Configuration file instead of config/{default,APP_ENV,local}
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long, value_enum, default_value_t = SinkKind::Auto)]
    sink: SinkKind,

    /// Keep input order instead of ingesting organizations first
    #[arg(long)]
    preserve_order: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .map_err(|e| IngestionError::ConfigError(e.to_string()))?;

    init_tracing(&config.observability);
    metrics::register_metrics();

    info!(
        service = %config.observability.service_name,
        "Starting Scholar Harvest v{}", VERSION
    );

    let mut items = Vec::new();
    for path in &args.inputs {
        match source::read_records(path).await {
            Ok(mut read) => items.append(&mut read),
            Err(err) => error!(error = %err, "Skipping input"),
        }
    }

    let sink = open_sink(args.sink, &config).await?;
    let order = config.pipeline.order_by_dependency && !args.preserve_order;

    let mut pipeline = Pipeline::new(sink).order_by_dependency(order);
    let summary = pipeline.run(items).await?;

    info!(total = summary.total(), "Harvest finished");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_sink(kind: SinkKind, config: &AppConfig) -> anyhow::Result<Box<dyn RecordSink>> {
    match (kind, &config.database) {
        (SinkKind::Json, _) | (SinkKind::Auto, None) => {
            info!(dir = %config.output.dir.display(), "Writing records to JSON files");
            Ok(Box::new(JsonFileSink::new(config.output.clone())))
        }
        (SinkKind::Database, None) => Err(IngestionError::ConfigError(
            "database sink requested but neither APP__DATABASE__URL nor PGHOST is set".to_string(),
        )
        .into()),
        (SinkKind::Database | SinkKind::Auto, Some(database)) => {
            let pool = DbPool::new(database).await.map_err(|e| {
                error!(error = %e, "Failed to connect to database");
                e
            })?;
            Ok(Box::new(Reconciler::new(pool)))
        }
    }
}
