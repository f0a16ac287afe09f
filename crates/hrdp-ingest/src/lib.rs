//! HRDP Ingest Library
//!
//! Chunked CSV ingestion pipeline for the fixed HR schema (employees,
//! departments, jobs): streaming parse, per-table validation and
//! coercion, batch transactional writes against PostgreSQL, and
//! partial-failure reporting.
//!
//! # Pipeline
//!
//! ```text
//! table name ─▶ schema registry ─▶ descriptor
//! byte stream ─▶ chunked reader ─▶ raw batches (<= 1000 rows)
//!                    │
//!                normalizer ─▶ typed rows
//!                    │
//!                batch writer ─▶ one transaction per batch
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hrdp_ingest::IngestPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = hrdp_ingest::db::DbConfig::from_env()?;
//!     let pool = hrdp_ingest::db::create_pool(&config).await?;
//!
//!     let csv = std::fs::File::open("employees.csv")?;
//!     let report = IngestPipeline::new(pool).run("employees", csv).await?;
//!     tracing::info!(rows = report.rows_written, "done");
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod reader;
pub mod schema;
pub mod writer;

// Re-export the operation surface
pub use pipeline::{IngestError, IngestFailure, IngestPipeline, IngestReport};
pub use schema::{resolve, TableName, UnknownTable};
