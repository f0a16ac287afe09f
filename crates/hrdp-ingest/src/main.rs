//! HRDP Ingest - CSV ingestion tool

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hrdp_common::logging::{init_logging, LogConfig, LogLevel};
use tracing::{error, info};

use hrdp_ingest::db::{create_pool, DbConfig};
use hrdp_ingest::reader::DEFAULT_BATCH_SIZE;
use hrdp_ingest::IngestPipeline;

#[derive(Parser, Debug)]
#[command(name = "hrdp-ingest")]
#[command(author, version, about = "HRDP CSV ingestion tool")]
struct Cli {
    /// Target table (employees, departments, jobs)
    #[arg(short, long)]
    table: String,

    /// Headerless CSV file whose columns follow the table's declared order
    #[arg(short, long)]
    file: PathBuf,

    /// Rows per transactional batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("hrdp-ingest".to_string())
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    // Store credentials are a fatal startup condition, not a per-run error
    let db_config = DbConfig::from_env()?;
    let pool = create_pool(&db_config).await?;
    info!("Database connection pool established");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let input = File::open(&cli.file)
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;

    let pipeline = IngestPipeline::new(pool).batch_size(cli.batch_size);

    match pipeline.run(&cli.table, input).await {
        Ok(report) => {
            info!(
                table = %report.table,
                rows_written = report.rows_written,
                batches_committed = report.batches_committed,
                "Ingestion committed"
            );
            Ok(())
        },
        Err(failure) => {
            error!(
                table = %failure.table,
                batches_committed = failure.batches_committed,
                rows_committed = failure.rows_committed,
                error = %failure.source,
                "Ingestion failed"
            );
            Err(failure.into())
        },
    }
}
