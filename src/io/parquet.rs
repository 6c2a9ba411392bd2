//! In-process Parquet decoding into schema-less rows.
//!
//! This module provides:
//! - [`ParquetRowCursor`], a sequential cursor that yields one [`Row`] at a time
//! - [`read_parquet_rows`] to drain a whole file into a [`RowSet`]
//!
//! Record batches are pulled lazily from `ParquetRecordBatchReader` and rendered
//! to JSON objects with the Arrow JSON writer (explicit nulls, so every column
//! appears in every row). Row order is file order.
//!
//! The cursor owns the file handle; it is released when the cursor is dropped,
//! on success and on every error path.

use crate::error::ReadError;
use crate::row::{Row, RowSet};
use arrow::datatypes::SchemaRef;
use arrow::json::WriterBuilder;
use arrow::json::writer::JsonArray;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};

const BATCH_SIZE: usize = 8 * 1024;

/// Sequential row cursor over one Parquet file.
///
/// ```no_run
/// use artifact_json::io::parquet::ParquetRowCursor;
///
/// # fn main() -> anyhow::Result<()> {
/// let mut cursor = ParquetRowCursor::open("output/entities.parquet")?;
/// while let Some(row) = cursor.next_row()? {
///     println!("{}", serde_json::Value::Object(row));
/// }
/// # Ok(())
/// # }
/// ```
pub struct ParquetRowCursor {
    path: PathBuf,
    reader: ParquetRecordBatchReader,
    pending: VecDeque<Row>,
}

impl ParquetRowCursor {
    /// Open `path` and read its footer.
    ///
    /// # Errors
    /// [`ReadError::Open`] if the file cannot be opened, [`ReadError::Format`] if
    /// the footer or schema cannot be decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| ReadError::Open {
            path: path.clone(),
            source,
        })?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .and_then(|b| b.with_batch_size(BATCH_SIZE).build())
            .map_err(|source| ReadError::Format {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            reader,
            pending: VecDeque::new(),
        })
    }

    /// Arrow schema derived from the file's embedded Parquet schema.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.reader.schema()
    }

    /// Pull the next row, decoding the next record batch when the buffer runs dry.
    ///
    /// Returns `Ok(None)` once the file is exhausted.
    ///
    /// # Errors
    /// [`ReadError::Batch`] if a page cannot be decoded (unsupported encoding,
    /// corrupt data) or rendered, [`ReadError::Json`] if the rendered batch is
    /// not an array of objects.
    pub fn next_row(&mut self) -> Result<Option<Row>, ReadError> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Ok(Some(row));
            }
            match self.reader.next() {
                None => return Ok(None),
                Some(Err(source)) => {
                    return Err(ReadError::Batch {
                        path: self.path.clone(),
                        source,
                    });
                }
                Some(Ok(batch)) => {
                    let rows = batch_to_rows(&self.path, &batch)?;
                    self.pending.extend(rows);
                }
            }
        }
    }
}

impl Iterator for ParquetRowCursor {
    type Item = Result<Row, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Read every row of a Parquet file, in file order.
///
/// # Errors
/// Any [`ReadError`] raised while opening or draining the cursor.
pub fn read_parquet_rows(path: impl AsRef<Path>) -> Result<RowSet, ReadError> {
    let mut cursor = ParquetRowCursor::open(path)?;
    let mut rows = RowSet::new();
    while let Some(row) = cursor.next_row()? {
        rows.push(row);
    }
    Ok(rows)
}

fn batch_to_rows(path: &Path, batch: &RecordBatch) -> Result<Vec<Row>, ReadError> {
    if batch.num_rows() == 0 {
        return Ok(Vec::new());
    }
    let mut writer = WriterBuilder::new()
        .with_explicit_nulls(true)
        .build::<_, JsonArray>(Vec::new());
    writer
        .write(batch)
        .and_then(|()| writer.finish())
        .map_err(|source| ReadError::Batch {
            path: path.to_path_buf(),
            source,
        })?;
    let buf = writer.into_inner();
    serde_json::from_slice(&buf).map_err(|source| ReadError::Json {
        path: path.to_path_buf(),
        source,
    })
}
