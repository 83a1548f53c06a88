//! Chunked parse orchestration
//!
//! [`ChunkedExecutor`] runs tokenize → validate → transform one chunk at a
//! time so the worker can report progress (and be aborted) between chunks.
//! It has no async or threading concerns of its own; [`ChunkedExecutor::parse`]
//! is the synchronous path for callers that cannot host a worker.

use serde::{Deserialize, Serialize};
use tally_common::types::{Headers, IngestionError, IngestionResult, RawRow, TransactionRecord};
use tracing::{debug, info};

use crate::tokenizer;
use crate::transformer;
use crate::validator::ValidatedRow;

/// Rows processed between progress reports when the caller does not say.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Message reported when the input has a header row but no data rows.
pub const NO_DATA_MESSAGE: &str = "No data found";

/// Highest percentage the chunk loop reports; 100 is reserved for completion.
const MAX_LOOP_PROGRESS: u8 = 99;

/// Offset from a data-row index to its 1-based source row number: one for
/// 1-based numbering and one for the header row.
const ROW_NUMBER_OFFSET: usize = 2;

/// Options for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Rows per chunk; zero is treated as one
    pub chunk_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ParseOptions {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

/// Step-wise executor over the data rows of one payload.
#[derive(Debug)]
pub struct ChunkedExecutor {
    headers: Headers,
    rows: Vec<RawRow>,
    chunk_size: usize,
    cursor: usize,
    transactions: Vec<TransactionRecord>,
    errors: Vec<IngestionError>,
}

impl ChunkedExecutor {
    /// Tokenize `text` and split off the header row.
    ///
    /// Fails with [`NO_DATA_MESSAGE`] when there are no data rows.
    pub fn new(text: &str, options: ParseOptions) -> std::result::Result<Self, String> {
        let mut rows = tokenizer::tokenize(text).into_iter();

        let headers = rows.next().unwrap_or_default();
        let rows: Vec<RawRow> = rows.collect();

        if rows.is_empty() {
            return Err(NO_DATA_MESSAGE.to_string());
        }

        info!(
            columns = headers.len(),
            rows = rows.len(),
            chunk_size = options.chunk_size,
            "Starting parse"
        );

        Ok(Self {
            headers,
            chunk_size: options.chunk_size.max(1),
            transactions: Vec::with_capacity(rows.len()),
            errors: Vec::new(),
            rows,
            cursor: 0,
        })
    }

    pub fn processed_rows(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.rows.len()
    }

    /// Process the next chunk and return the progress to report for it, or
    /// `None` once every row has been processed.
    pub fn next_chunk(&mut self) -> Option<u8> {
        if self.is_finished() {
            return None;
        }

        let end = (self.cursor + self.chunk_size).min(self.rows.len());

        for index in self.cursor..end {
            let row_number = index + ROW_NUMBER_OFFSET;
            let row = &self.rows[index];

            match ValidatedRow::check(row, &self.headers) {
                Ok(valid) => self
                    .transactions
                    .push(transformer::transform(valid, &self.headers, row_number)),
                Err(outcome) => {
                    debug!(row = row_number, errors = ?outcome.errors, "Row rejected");
                    self.errors.push(IngestionError {
                        row: row_number,
                        errors: outcome.errors,
                    });
                },
            }
        }

        self.cursor = end;
        let progress = self.progress();
        debug!(processed = self.cursor, total = self.rows.len(), progress, "Chunk processed");

        Some(progress)
    }

    /// `round(processed / total * 100)`, held below 100 until completion.
    fn progress(&self) -> u8 {
        let percent = (self.cursor as f64 / self.rows.len() as f64 * 100.0).round() as u8;
        percent.min(MAX_LOOP_PROGRESS)
    }

    /// Consume the executor, processing any remaining rows.
    pub fn finish(mut self) -> IngestionResult {
        while self.next_chunk().is_some() {}

        let result = IngestionResult::new(self.headers, self.transactions, self.errors);
        info!(
            total = result.stats.total_rows,
            valid = result.stats.valid_rows,
            invalid = result.stats.invalid_rows,
            "Parse complete"
        );
        result
    }

    /// Parse synchronously on the current thread, reporting each chunk's
    /// progress to `on_progress`.
    pub fn parse(
        text: &str,
        options: ParseOptions,
        mut on_progress: impl FnMut(u8),
    ) -> std::result::Result<IngestionResult, String> {
        let mut executor = Self::new(text, options)?;
        while let Some(progress) = executor.next_chunk() {
            on_progress(progress);
        }
        Ok(executor.finish())
    }
}
