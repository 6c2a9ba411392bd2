//! # artifact-json
//!
//! Converts the columnar artifacts written by a graph-indexing job into
//! pretty-printed JSON for downstream consumers.
//!
//! ## Key Features
//!
//! - **Fixed artifact set** - `entities`, `relationships`, `communities` and
//!   `community_reports`, nothing discovered beyond that
//! - **Two-tier decoding** - an in-process Parquet reader, with an external
//!   interpreter (Python + `pyarrow`) as fallback for files it cannot read
//! - **Order preserving** - rows are written in exactly the order the decoder produced them
//! - **Explicit failure policy** - degrade an undecodable artifact to `[]`, or abort the batch
//! - **Bounded subprocesses** - deadlines and cancellation for the fallback interpreter,
//!   covering its exit and both output streams
//! - **Async** - built on tokio; the binary cancels a running batch on Ctrl-C or `SIGTERM`
//!
//! ## Quick Start
//!
//! ```no_run
//! use artifact_json::*;
//! # use anyhow::Result;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let config = ConvertConfig::from_env()?;
//! config.validate()?;
//!
//! let report = convert_graph_parquet_to_json("output", &config).await?;
//! for outcome in &report.outcomes {
//!     println!("{}: {} rows via {:?}", outcome.target, outcome.rows, outcome.decoder);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Rows
//!
//! A [`Row`] is a JSON object keyed by column name, in column order. Values are
//! passed through as decoded and never validated. A [`RowSet`] is the ordered
//! output of one decode pass over one file.
//!
//! ### Decoders
//!
//! - [`io::parquet::read_parquet_rows`] pulls rows from a sequential
//!   [`ParquetRowCursor`]. Any failure is a [`ReadError`].
//! - [`FallbackReader`] runs `<interpreter> -c <script> <path>` through
//!   [`ProcessRunner`] and parses the JSON array printed on standard output.
//!
//! ### Conversion
//!
//! [`Converter::convert_dir`] is async and walks [`ConversionTarget::ALL`] sequentially:
//! absent files are skipped, present files are decoded (native first, fallback
//! second) and written as `<base>.json`, and the [`ConversionReport`] counts
//! every artifact written, including empty ones. A
//! [`CancellationToken`](tokio_util::sync::CancellationToken) passed to
//! [`Converter::with_cancel_token`] stops the batch and kills a running interpreter.
//!
//! ## Error Handling
//!
//! | Failure | Type | Effect |
//! |---|---|---|
//! | interpreter missing | [`ProcessError::Spawn`] | fallback policy |
//! | interpreter exits non-zero | [`ProcessError::Execution`] | fallback policy |
//! | interpreter exceeds deadline | [`ProcessError::TimedOut`] | fallback policy |
//! | batch cancelled | [`ProcessError::Cancelled`], [`ConvertError::Cancelled`] | batch aborted |
//! | interpreter prints non-JSON | [`FallbackError::Parse`] | fallback policy |
//! | native reader rejects file | [`ReadError`] | fallback attempted |
//! | output cannot be written | [`ConvertError`] | batch aborted |
//!
//! ## Feature Flags
//!
//! - `cli` (default) - the `artifact-json` binary, [`CliArgs`] and [`init_tracing`]
//!
//! ## Module Overview
//!
//! - [`process`] - subprocess execution with streamed output capture
//! - [`io`] - Parquet decoding and JSON row I/O
//! - [`fallback`] - the external-interpreter decoder and its failure policy
//! - [`convert`] - the batch orchestrator
//! - [`config`] - configuration from defaults, environment and flags
//! - [`signal`] - shutdown signals wired to a cancellation token
//! - [`testing`] - fixtures for tests

pub mod config;
pub mod convert;
pub mod error;
pub mod fallback;
pub mod io;
pub mod process;
pub mod row;
pub mod signal;
pub mod target;
pub mod testing;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
mod tracing_init;

// General re-exports
pub use config::ConvertConfig;
pub use convert::{
    ConversionReport, Converter, Decoder, TargetOutcome, convert_graph_parquet_to_json,
};
pub use error::{ConfigError, ConvertError, FallbackError, ProcessError, ReadError};
pub use fallback::{FallbackPolicy, FallbackReader};
pub use io::json::{read_json_rows, write_json_rows};
pub use io::parquet::{ParquetRowCursor, read_parquet_rows};
pub use process::{CommandSpec, ProcessOutput, ProcessRunner};
pub use row::{Row, RowSet};
pub use target::ConversionTarget;

// Gated re-exports
#[cfg(feature = "cli")]
pub use cli::CliArgs;
#[cfg(feature = "cli")]
pub use tracing_init::init_tracing;
