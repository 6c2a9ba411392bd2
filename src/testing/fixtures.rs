//! Parquet fixtures and scripted fallback decoders.

use crate::fallback::FallbackReader;
use crate::row::RowSet;
use anyhow::{Context, Result, bail, ensure};
use arrow::datatypes::{FieldRef, Schema};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use serde_arrow::to_record_batch;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Shell used by [`shell_fallback`].
pub const SHELL: &str = "/bin/sh";

/// Entity row shaped like the indexing job's `entities` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleEntity {
    pub id: String,
    pub title: String,
    pub degree: i64,
    pub description: Option<String>,
    pub text_unit_ids: Vec<String>,
}

/// `n` entities with distinct ids; every third one has no description.
#[must_use]
pub fn sample_entities(n: usize) -> Vec<SampleEntity> {
    (0..n)
        .map(|i| SampleEntity {
            id: format!("e-{i:04}"),
            title: format!("ENTITY {i}"),
            degree: i64::try_from(i).unwrap_or(i64::MAX) * 3,
            description: (i % 3 != 2).then(|| format!("description of entity {i}")),
            text_unit_ids: (0..=i % 2).map(|u| format!("tu-{i}-{u}")).collect(),
        })
        .collect()
}

/// Write a typed slice to a Parquet file in one row group.
///
/// Returns the number of rows written. An empty slice gives a zero-row file.
///
/// # Errors
/// See [`write_parquet_row_groups`].
pub fn write_parquet_rows<T: Serialize + Deserialize<'static>>(
    path: impl AsRef<Path>,
    data: &[T],
) -> Result<usize> {
    write_parquet_row_groups(path, data, data.len().max(1))?;
    Ok(data.len())
}

/// Write a typed slice with at most `rows_per_group` rows in each row group.
///
/// The Arrow schema is inferred from `T` once; every chunk then becomes its
/// own record batch and is flushed as its own row group, so readers have to
/// cross group boundaries. Returns the number of row groups written.
///
/// # Errors
/// A zero `rows_per_group`, schema inference, conversion or file failures.
pub fn write_parquet_row_groups<T: Serialize + Deserialize<'static>>(
    path: impl AsRef<Path>,
    data: &[T],
    rows_per_group: usize,
) -> Result<usize> {
    let path = path.as_ref();
    ensure!(rows_per_group > 0, "rows_per_group must be positive");

    let fields = Vec::<FieldRef>::from_type::<T>(TracingOptions::default())
        .context("infer Arrow schema from row type")?;
    let schema = Arc::new(Schema::new(fields.clone()));
    let props = WriterProperties::builder()
        .set_max_row_group_size(rows_per_group)
        .build();

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .with_context(|| format!("open parquet writer for {}", path.display()))?;

    let mut groups = 0;
    for (i, chunk) in data.chunks(rows_per_group).enumerate() {
        let batch = to_record_batch(&fields, &chunk)
            .with_context(|| format!("convert row group #{i} to a record batch"))?;
        writer.write(&batch).context("write record batch")?;
        writer.flush().context("flush row group")?;
        groups += 1;
    }
    writer.close().context("finish parquet file")?;

    Ok(groups)
}

/// Write a file with Parquet magic bytes but no decodable footer.
///
/// # Errors
/// If the file cannot be written.
pub fn write_corrupt_parquet(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut bytes = b"PAR1".to_vec();
    bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02, 0x03]);
    bytes.extend_from_slice(&64u32.to_le_bytes());
    bytes.extend_from_slice(b"PAR1");
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

/// The JSON rows that `data` should decode to.
///
/// # Errors
/// If an element does not serialize to a JSON object.
pub fn rows_of<T: Serialize>(data: &[T]) -> Result<RowSet> {
    data.iter()
        .enumerate()
        .map(|(i, item)| match serde_json::to_value(item)? {
            Value::Object(row) => Ok(row),
            other => bail!("item #{i} serialized to {other}, not an object"),
        })
        .collect()
}

/// A fallback reader that runs `script` with `/bin/sh -c` instead of Python.
///
/// The input path arrives as `$0`.
#[must_use]
pub fn shell_fallback(script: &str) -> FallbackReader {
    FallbackReader::new(SHELL).with_script(script)
}
