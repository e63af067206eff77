mod error;
mod loader;
mod lookup;
mod report;
mod source;
mod storage;
mod transform;
mod utils;

#[cfg(test)]
mod tests;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use storage::{Container, DataMigration, DocumentStore, DynamoDBStore, MemoryStore};
use utils::config::LogFormat;

/// Migrate the flat-file catalog export into DynamoDB.
#[derive(Debug, Parser)]
#[command(name = "catalog-migrate", version)]
struct Args {
    /// TOML config file; missing is fine.
    #[arg(long, default_value = "migrate.toml")]
    config: PathBuf,

    /// Directory holding one `<Table>.csv` per source table.
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Load into an in-memory store instead of DynamoDB.
    #[arg(long)]
    dry_run: bool,

    /// Write Prometheus text exposition here after the run.
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = utils::Config::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    if let Some(dir) = args.source_dir {
        config.source_dir = dir;
    }
    if args.json_logs {
        config.log_format = LogFormat::Json;
    }

    // Initialize logging
    let _guard = utils::init_logging(config.log_format);

    tracing::info!(
        source_dir = %config.source_dir.display(),
        products_table = %config.products_table,
        customers_table = %config.customers_table,
        dry_run = args.dry_run,
        "Starting catalog migration"
    );

    let memory = args.dry_run.then(|| Arc::new(MemoryStore::new()));
    let store: Arc<dyn DocumentStore> = match &memory {
        Some(memory) => memory.clone(),
        None => Arc::new(DynamoDBStore::new(&config).await),
    };

    let metrics = Arc::new(utils::MigrationMetrics::new().context("registering metrics")?);

    let report = DataMigration::new(config, store, metrics.clone())
        .dry_run(args.dry_run)
        .run()
        .await
        .context("migration aborted")?;

    if let Some(memory) = memory {
        tracing::info!(
            products = memory.count(Container::Products).await,
            customers = memory.count(Container::Customers).await,
            total = memory.len().await,
            "Dry run kept documents in memory"
        );
    }

    println!("{}", report.render());
    if !report.is_clean() {
        tracing::warn!(
            failed = report.write_failures(),
            rejected = report.rows_rejected(),
            "Migration finished with record-level errors; see the summary above"
        );
    }

    if let Some(path) = args.metrics_file {
        let text = metrics.render().context("encoding metrics")?;
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("writing metrics to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}
