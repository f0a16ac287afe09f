//! Ingestion orchestrator
//!
//! Drives the reader -> normalizer -> writer pipeline for one upload:
//! resolve the table, then read, normalize, write and commit one batch at
//! a time until the input is exhausted or a fatal error halts the run.
//!
//! Batches already committed when an error occurs stay committed;
//! partial ingestion is a permitted outcome, and the failure reports how
//! much was persisted so the caller can re-submit the remainder. A run is
//! strictly sequential: batch N's write completes (success or failure)
//! before batch N+1's begins; partial-failure semantics depend on that
//! ordering. The orchestrator owns the run end to end; no state survives
//! across runs.

use std::io::Read;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::normalize::{normalize_batch, NormalizeError};
use crate::reader::{BatchReader, ReadError, DEFAULT_BATCH_SIZE};
use crate::schema::{self, TableName, UnknownTable};
use crate::writer::{BatchWriter, WriteError};

/// First fatal error of a run
///
/// Row/column-level errors escalate to batch-fatal; batch-level errors
/// escalate to run-fatal without unwinding already-committed batches.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    UnknownTable(#[from] UnknownTable),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Ingestion cancelled before batch {batch}")]
    Cancelled { batch: u64 },
}

/// Outcome of a fully committed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub table: TableName,
    pub rows_written: u64,
    pub batches_committed: u64,
}

/// Outcome of a failed run, with how much of the file was persisted
#[derive(Debug, Error)]
#[error(
    "Ingestion into '{table}' failed after {batches_committed} committed batch(es), \
     {rows_committed} row(s): {source}"
)]
pub struct IngestFailure {
    pub table: String,
    pub batches_committed: u64,
    pub rows_committed: u64,
    #[source]
    pub source: IngestError,
}

/// Orchestrates one ingestion run per call
///
/// Holds only the injected pool handle and run policy; concurrent runs
/// share nothing else and rely on the store's transaction isolation.
pub struct IngestPipeline {
    pool: PgPool,
    batch_size: usize,
    cancel: CancellationToken,
}

impl IngestPipeline {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
            cancel: CancellationToken::new(),
        }
    }

    /// Rows per transactional batch (default 1000)
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Token checked before each batch's write; cancellation takes effect
    /// at batch boundaries only
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Ingest one headerless CSV byte stream into `table_name`
    #[tracing::instrument(skip(self, input), fields(table = table_name))]
    pub async fn run<R: Read>(
        &self,
        table_name: &str,
        input: R,
    ) -> Result<IngestReport, IngestFailure> {
        let mut rows_written: u64 = 0;
        let mut batches_committed: u64 = 0;

        macro_rules! fail {
            ($source:expr) => {
                return Err(IngestFailure {
                    table: table_name.to_string(),
                    batches_committed,
                    rows_committed: rows_written,
                    source: $source.into(),
                })
            };
        }

        // Resolve first: an unknown table fails with zero store interaction.
        let table = match schema::resolve(table_name) {
            Ok(table) => table,
            Err(e) => fail!(e),
        };
        let descriptor = table.descriptor();

        let mut reader = BatchReader::with_batch_size(input, self.batch_size);
        let writer = BatchWriter::new(self.pool.clone());

        loop {
            let raw = match reader.next_batch(descriptor) {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(e) => fail!(e),
            };

            if self.cancel.is_cancelled() {
                fail!(IngestError::Cancelled { batch: batches_committed + 1 });
            }

            let normalized = match normalize_batch(table, &raw) {
                Ok(batch) => batch,
                Err(e) => fail!(e),
            };

            let written = match writer.write(&normalized).await {
                Ok(written) => written,
                Err(e) => fail!(e),
            };

            rows_written += written;
            batches_committed += 1;
            debug!(batch = batches_committed, rows = written, "Batch ingested");
        }

        info!(
            table = %table,
            rows_written,
            batches_committed,
            "Ingestion committed"
        );

        Ok(IngestReport {
            table,
            rows_written,
            batches_committed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pool handle that performs no I/O until a query runs; these tests
    /// must fail before any store interaction.
    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgresql://localhost/hrdp_test")
            .expect("lazy pool construction does not connect")
    }

    #[tokio::test]
    async fn test_unknown_table_fails_without_store_interaction() {
        let pipeline = IngestPipeline::new(lazy_pool());
        let failure = pipeline
            .run("staff", "1,Engineering\n".as_bytes())
            .await
            .unwrap_err();

        assert_eq!(failure.table, "staff");
        assert_eq!(failure.batches_committed, 0);
        assert_eq!(failure.rows_committed, 0);
        assert!(matches!(failure.source, IngestError::UnknownTable(_)));
    }

    #[tokio::test]
    async fn test_malformed_first_batch_fails_before_any_write() {
        let pipeline = IngestPipeline::new(lazy_pool());
        let failure = pipeline
            .run("departments", "1,Engineering,extra\n".as_bytes())
            .await
            .unwrap_err();

        assert_eq!(failure.batches_committed, 0);
        assert!(matches!(failure.source, IngestError::Read(_)));
    }

    #[tokio::test]
    async fn test_invalid_timestamp_in_first_batch_fails_before_any_write() {
        let pipeline = IngestPipeline::new(lazy_pool());
        let failure = pipeline
            .run("employees", "1,Ana,not-a-date,1,2\n".as_bytes())
            .await
            .unwrap_err();

        assert_eq!(failure.batches_committed, 0);
        assert!(matches!(
            failure.source,
            IngestError::Normalize(NormalizeError::InvalidTimestamp { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_token_halts_before_first_write() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let pipeline = IngestPipeline::new(lazy_pool()).cancellation(cancel);
        let failure = pipeline
            .run("departments", "1,Engineering\n".as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(failure.source, IngestError::Cancelled { batch: 1 }));
        assert_eq!(failure.rows_committed, 0);
    }

    #[tokio::test]
    async fn test_empty_input_commits_zero_rows() {
        // No batches are produced, so the run commits without touching
        // the store at all.
        let pipeline = IngestPipeline::new(lazy_pool());
        let report = pipeline.run("jobs", "".as_bytes()).await.unwrap();

        assert_eq!(report.table, TableName::Jobs);
        assert_eq!(report.rows_written, 0);
        assert_eq!(report.batches_committed, 0);
    }

    #[test]
    fn test_failure_display_names_table_and_progress() {
        let failure = IngestFailure {
            table: "employees".to_string(),
            batches_committed: 1,
            rows_committed: 1000,
            source: IngestError::Cancelled { batch: 2 },
        };
        let rendered = failure.to_string();
        assert!(rendered.contains("employees"));
        assert!(rendered.contains("1 committed batch(es)"));
        assert!(rendered.contains("1000 row(s)"));
    }
}
