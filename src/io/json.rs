//! Pretty-printed JSON array I/O for row sets.
//!
//! Output files hold one JSON array of row objects, UTF-8 encoded, indented with
//! two spaces, in the order the rows were given. An empty row set is written as
//! `[]`.

use crate::row::{Row, RowSet};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

/// Write `rows` to `path` as a pretty JSON array, replacing any existing file.
///
/// The parent directory must already exist.
///
/// # Returns
/// The number of rows written (`rows.len()`).
///
/// # Errors
/// Returns an error if the file cannot be created, serialized into, or flushed.
pub fn write_json_rows(path: impl AsRef<Path>, rows: &[Row]) -> io::Result<usize> {
    let f = File::create(path.as_ref())?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, rows)?;
    w.flush()?;
    Ok(rows.len())
}

/// Read a JSON array of row objects back into a [`RowSet`].
///
/// # Errors
/// Returns an error if the file cannot be opened or is not an array of objects.
pub fn read_json_rows(path: impl AsRef<Path>) -> Result<RowSet> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse JSON rows in {}", path.display()))
}
