//! Testing utilities for conversions.
//!
//! This module provides fixtures for exercising both decoding tiers without a
//! real indexing run:
//!
//! - **Typed Parquet fixtures**: [`write_parquet_rows`] writes any serde type
//!   through `serde_arrow`, [`write_parquet_row_groups`] splits it across row
//!   groups, and [`rows_of`] gives the JSON rows it should decode to.
//! - **Unreadable inputs**: [`write_corrupt_parquet`] produces a file the
//!   in-process reader rejects, forcing the fallback tier.
//! - **Scripted fallbacks**: [`shell_fallback`] runs `/bin/sh -c <script>` in place of
//!   Python, so fallback behaviour can be tested on machines without `pyarrow`.
//!
//! # Example
//!
//! ```no_run
//! use artifact_json::testing::*;
//! use artifact_json::Converter;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let dir = tempfile::tempdir()?;
//! write_parquet_rows(dir.path().join("entities.parquet"), &sample_entities(3))?;
//! write_corrupt_parquet(dir.path().join("communities.parquet"))?;
//!
//! let converter = Converter::new(shell_fallback(r#"printf '[{"id": 1}]'"#));
//! let report = converter.convert_dir(dir.path()).await?;
//! assert_eq!(report.converted, 2);
//! # Ok(())
//! # }
//! ```

pub mod fixtures;

pub use fixtures::*;
