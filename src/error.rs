//! Error types for process execution, Parquet decoding, fallback decoding,
//! configuration and batch conversion.
//!
//! Each layer owns one enum. Lower layers are wrapped, never flattened, so a
//! caller can still tell a spawn failure from a non-zero exit after it has
//! travelled through the fallback reader.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

// ============ Process Errors ============

/// Errors raised by [`ProcessRunner`](crate::process::ProcessRunner).
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process could not be started (missing executable, permission denied, ...).
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("`{program}` exited with {status}\nStderr: {stderr}\nStdout: {stdout}")]
    Execution {
        program: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    /// The process outlived its deadline and was killed.
    #[error("`{program}` did not exit within {timeout:?} and was killed\nStderr: {stderr}")]
    TimedOut {
        program: String,
        timeout: Duration,
        stdout: String,
        stderr: String,
    },

    /// Cancellation was requested while the process was running; it was killed.
    #[error("`{program}` was cancelled")]
    Cancelled {
        program: String,
        stdout: String,
        stderr: String,
    },

    /// Waiting on the child or reading one of its streams failed.
    #[error("i/o error while supervising `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Standard error text captured before the failure, if any was captured.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ProcessError::Execution { stderr, .. }
            | ProcessError::TimedOut { stderr, .. }
            | ProcessError::Cancelled { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

// ============ Read Errors ============

/// Errors raised by the in-process Parquet reader.
///
/// A `ReadError` is final for that reader; recovery belongs to the caller.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file could not be opened.
    #[error("open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Footer, metadata or encoding not understood (unsupported revision or corrupt file).
    #[error("unsupported or corrupt parquet file {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    /// A record batch could not be read or rendered.
    #[error("decode record batch from {}: {source}", .path.display())]
    Batch {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    /// The rendered batch did not form an array of JSON objects.
    #[error("convert rows of {} to JSON objects: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ============ Fallback Errors ============

/// Errors raised by [`FallbackReader::try_read`](crate::fallback::FallbackReader::try_read).
#[derive(Debug, Error)]
pub enum FallbackError {
    /// The interpreter could not be run to completion.
    #[error("fallback decoder process failed: {0}")]
    Process(#[from] ProcessError),

    /// The interpreter's standard output was not a JSON array of objects.
    #[error("fallback decoder output for {} is not a JSON array of objects: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl FallbackError {
    /// True when the failure came from a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FallbackError::Process(ProcessError::Cancelled { .. }))
    }
}

// ============ Conversion Errors ============

/// Errors that abort a whole conversion batch.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The output directory could not be created.
    #[error("create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A JSON output file could not be written.
    #[error("write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The fallback decoder failed under the `Propagate` policy.
    #[error("fallback decode of {} failed: {source}", .path.display())]
    Fallback {
        path: PathBuf,
        #[source]
        source: FallbackError,
    },

    /// Cancellation was requested before the batch finished.
    #[error("conversion cancelled")]
    Cancelled,
}

// ============ Config Errors ============

/// Errors raised while building or validating [`ConvertConfig`](crate::config::ConvertConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured interpreter does not resolve to a file.
    #[error(
        "fallback interpreter `{}` not found (set {} or pass --python)",
        .path.display(),
        crate::config::ENV_PYTHON
    )]
    InterpreterNotFound { path: PathBuf },

    /// The fallback policy string is not recognised.
    #[error("invalid fallback policy `{value}` (expected `degrade` or `propagate`)")]
    InvalidPolicy { value: String },

    /// The timeout string is not a whole number of seconds.
    #[error("invalid timeout `{value}`: {source}")]
    InvalidTimeout {
        value: String,
        #[source]
        source: ParseIntError,
    },
}
