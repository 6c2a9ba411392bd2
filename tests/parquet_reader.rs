use anyhow::Result;
use artifact_json::io::parquet::{ParquetRowCursor, read_parquet_rows};
use artifact_json::testing::*;
use artifact_json::ReadError;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Relationship {
    source: String,
    target: String,
    weight: f64,
    rank: u32,
}

#[test]
fn reads_rows_in_file_order_with_exact_values() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("entities.parquet");
    let data = sample_entities(3);
    write_parquet_rows(&path, &data)?;

    let rows = read_parquet_rows(&path)?;
    assert_eq!(rows, rows_of(&data)?);

    let first = serde_json::Value::Object(rows[0].clone());
    assert_eq!(
        first,
        json!({
            "id": "e-0000",
            "title": "ENTITY 0",
            "degree": 0,
            "description": "description of entity 0",
            "text_unit_ids": ["tu-0-0"],
        })
    );
    Ok(())
}

#[test]
fn null_columns_are_kept_as_null() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("entities.parquet");
    write_parquet_rows(&path, &sample_entities(3))?;

    let rows = read_parquet_rows(&path)?;
    assert_eq!(rows[2].get("description"), Some(&serde_json::Value::Null));
    Ok(())
}

#[test]
fn columns_keep_schema_order() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("relationships.parquet");
    let data = vec![Relationship {
        source: "A".into(),
        target: "B".into(),
        weight: 1.5,
        rank: 7,
    }];
    write_parquet_rows(&path, &data)?;

    let rows = read_parquet_rows(&path)?;
    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, ["source", "target", "weight", "rank"]);
    assert_eq!(rows[0]["weight"], json!(1.5));
    assert_eq!(rows[0]["rank"], json!(7));
    Ok(())
}

#[test]
fn cursor_yields_rows_one_at_a_time_across_batches() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("entities.parquet");
    // More rows than one record batch holds.
    let data = sample_entities(20_000);
    write_parquet_rows(&path, &data)?;

    let mut cursor = ParquetRowCursor::open(&path)?;
    assert_eq!(cursor.schema().fields().len(), 5);

    let mut seen = 0usize;
    while let Some(row) = cursor.next_row()? {
        assert_eq!(row["id"], json!(format!("e-{seen:04}")));
        seen += 1;
    }
    assert_eq!(seen, data.len());
    assert!(cursor.next_row()?.is_none());
    Ok(())
}

#[test]
fn cursor_is_an_iterator() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("entities.parquet");
    write_parquet_rows(&path, &sample_entities(4))?;

    let ids: Vec<String> = ParquetRowCursor::open(&path)?
        .map(|row| row.map(|r| r["id"].as_str().unwrap_or_default().to_string()))
        .collect::<Result<_, ReadError>>()?;
    assert_eq!(ids, ["e-0000", "e-0001", "e-0002", "e-0003"]);
    Ok(())
}

#[test]
fn empty_file_yields_no_rows() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("empty.parquet");
    let data: Vec<SampleEntity> = vec![];
    write_parquet_rows(&path, &data)?;

    assert!(read_parquet_rows(&path)?.is_empty());
    Ok(())
}

#[test]
fn corrupt_file_is_a_format_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("communities.parquet");
    write_corrupt_parquet(&path)?;

    let err = read_parquet_rows(&path).unwrap_err();
    assert!(matches!(err, ReadError::Format { .. }), "got {err:?}");
    assert!(err.to_string().contains("communities.parquet"));
    Ok(())
}

#[test]
fn non_parquet_file_is_rejected() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("entities.parquet");
    std::fs::write(&path, "id,title\n1,a\n")?;

    assert!(read_parquet_rows(&path).is_err());
    Ok(())
}

#[test]
fn missing_file_is_an_open_error() {
    let err = read_parquet_rows("nonexistent_file.parquet").unwrap_err();
    assert!(matches!(err, ReadError::Open { .. }), "got {err:?}");
}

#[test]
fn rows_span_row_group_boundaries_in_order() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("entities.parquet");
    let data = sample_entities(10);
    assert_eq!(write_parquet_row_groups(&path, &data, 3)?, 4);

    let builder = ParquetRecordBatchReaderBuilder::try_new(std::fs::File::open(&path)?)?;
    assert_eq!(builder.metadata().num_row_groups(), 4);

    assert_eq!(read_parquet_rows(&path)?, rows_of(&data)?);
    Ok(())
}
