//! Chunked CSV reader
//!
//! Streams an uploaded byte stream as a lazy, finite, single-pass
//! sequence of row batches, decoupling memory use from file size. The
//! underlying stream is consumed once; the sequence is not restartable.
//!
//! Input is headerless UTF-8 CSV. A record whose field count does not
//! match the table descriptor, or any CSV-level parse failure, fails the
//! whole read; there is no per-row skip policy.

use std::io::Read;

use csv::ReaderBuilder;
use thiserror::Error;

use crate::schema::TableDescriptor;

/// Maximum rows per batch. The final batch of a file may be shorter.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Structural failure of the source data; fatal for the run.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Malformed input at row {row}: {detail}")]
    MalformedInput { row: u64, detail: String },
}

/// One positional record as decoded from the input file
///
/// Fields are untyped text; an empty (after trim) field reads as missing.
/// Ephemeral: lives only within one batch's processing.
#[derive(Debug, Clone)]
pub struct RawRow {
    row: u64,
    record: csv::StringRecord,
}

impl RawRow {
    /// 1-based row number in the source file
    pub fn row(&self) -> u64 {
        self.row
    }

    /// Field at `index`, or `None` when absent or empty after trimming
    pub fn field(&self, index: usize) -> Option<&str> {
        self.record
            .get(index)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn for_tests(row: u64, fields: &[&str]) -> Self {
        Self {
            row,
            record: csv::StringRecord::from(fields.to_vec()),
        }
    }
}

/// Reads fixed-size batches of raw rows from a CSV byte stream
pub struct BatchReader<R: Read> {
    reader: csv::Reader<R>,
    batch_size: usize,
    rows_read: u64,
}

impl<R: Read> BatchReader<R> {
    /// Open a reader with the default batch size
    pub fn new(input: R) -> Self {
        Self::with_batch_size(input, DEFAULT_BATCH_SIZE)
    }

    /// Open a reader with an explicit batch size (clamped to >= 1)
    pub fn with_batch_size(input: R, batch_size: usize) -> Self {
        // flexible: arity is checked against the descriptor, with a row
        // number in the error, instead of csv's first-record heuristic.
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        Self {
            reader,
            batch_size: batch_size.max(1),
            rows_read: 0,
        }
    }

    /// Next batch of up to `batch_size` rows, `None` once exhausted
    pub fn next_batch(
        &mut self,
        descriptor: &TableDescriptor,
    ) -> Result<Option<Vec<RawRow>>, ReadError> {
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut record = csv::StringRecord::new();

        while batch.len() < self.batch_size {
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    self.rows_read += 1;
                    if record.len() != descriptor.arity() {
                        return Err(ReadError::MalformedInput {
                            row: self.rows_read,
                            detail: format!(
                                "expected {} fields for table '{}', found {}",
                                descriptor.arity(),
                                descriptor.name,
                                record.len()
                            ),
                        });
                    }
                    batch.push(RawRow {
                        row: self.rows_read,
                        record: record.clone(),
                    });
                },
                Ok(false) => break,
                Err(e) => {
                    let row = e
                        .position()
                        .map(|p| p.record() + 1)
                        .unwrap_or(self.rows_read + 1);
                    return Err(ReadError::MalformedInput {
                        row,
                        detail: e.to_string(),
                    });
                },
            }
        }

        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableName;

    fn departments_csv(rows: usize) -> String {
        (1..=rows)
            .map(|i| format!("{},Department {}\n", i, i))
            .collect()
    }

    #[test]
    fn test_single_short_batch() {
        let input = departments_csv(50);
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new(input.as_bytes());

        let batch = reader.next_batch(desc).unwrap().unwrap();
        assert_eq!(batch.len(), 50);
        assert_eq!(batch[0].field(0), Some("1"));
        assert_eq!(batch[0].field(1), Some("Department 1"));

        assert!(reader.next_batch(desc).unwrap().is_none());
    }

    #[test]
    fn test_splits_input_into_full_batches_plus_remainder() {
        let input = departments_csv(2500);
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new(input.as_bytes());

        let sizes: Vec<usize> = std::iter::from_fn(|| {
            reader.next_batch(desc).unwrap().map(|b| b.len())
        })
        .collect();
        assert_eq!(sizes, [1000, 1000, 500]);
    }

    #[test]
    fn test_exact_multiple_of_batch_size() {
        let input = departments_csv(2000);
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new(input.as_bytes());

        assert_eq!(reader.next_batch(desc).unwrap().unwrap().len(), 1000);
        assert_eq!(reader.next_batch(desc).unwrap().unwrap().len(), 1000);
        assert!(reader.next_batch(desc).unwrap().is_none());
    }

    #[test]
    fn test_custom_batch_size() {
        let input = departments_csv(7);
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::with_batch_size(input.as_bytes(), 3);

        let sizes: Vec<usize> = std::iter::from_fn(|| {
            reader.next_batch(desc).unwrap().map(|b| b.len())
        })
        .collect();
        assert_eq!(sizes, [3, 3, 1]);
    }

    #[test]
    fn test_rows_are_numbered_in_file_order_across_batches() {
        let input = departments_csv(5);
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::with_batch_size(input.as_bytes(), 2);

        let mut rows = Vec::new();
        while let Some(batch) = reader.next_batch(desc).unwrap() {
            rows.extend(batch.iter().map(RawRow::row));
        }
        assert_eq!(rows, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_wrong_field_count_is_malformed_input() {
        let input = "1,Engineering\n2\n3,Sales\n";
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new(input.as_bytes());

        let err = reader.next_batch(desc).unwrap_err();
        let ReadError::MalformedInput { row, detail } = err;
        assert_eq!(row, 2);
        assert!(detail.contains("expected 2 fields"));
        assert!(detail.contains("found 1"));
    }

    #[test]
    fn test_too_many_fields_is_malformed_input() {
        let input = "1,Engineering,extra\n";
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new(input.as_bytes());

        let err = reader.next_batch(desc).unwrap_err();
        let ReadError::MalformedInput { row, detail } = err;
        assert_eq!(row, 1);
        assert!(detail.contains("found 3"));
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new("".as_bytes());
        assert!(reader.next_batch(desc).unwrap().is_none());
    }

    #[test]
    fn test_empty_field_reads_as_missing() {
        let input = "1,\n";
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new(input.as_bytes());

        let batch = reader.next_batch(desc).unwrap().unwrap();
        assert_eq!(batch[0].field(0), Some("1"));
        assert_eq!(batch[0].field(1), None);
    }

    #[test]
    fn test_whitespace_only_field_reads_as_missing() {
        let input = "1,   \n";
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new(input.as_bytes());

        let batch = reader.next_batch(desc).unwrap().unwrap();
        assert_eq!(batch[0].field(1), None);
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let input = "1,\"Sales, EMEA\"\n";
        let desc = TableName::Departments.descriptor();
        let mut reader = BatchReader::new(input.as_bytes());

        let batch = reader.next_batch(desc).unwrap().unwrap();
        assert_eq!(batch[0].field(1), Some("Sales, EMEA"));
    }
}
