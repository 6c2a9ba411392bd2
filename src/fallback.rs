//! Out-of-process fallback decoder.
//!
//! When the in-process reader rejects a file, [`FallbackReader`] hands it to an
//! external interpreter (Python with `pyarrow` by default) through
//! [`ProcessRunner`]. The interpreter is invoked as
//!
//! ```text
//! <interpreter> -c <script> <path>
//! ```
//!
//! with each piece a separate argument, and must print exactly one JSON array
//! of row objects on standard output. Anything on standard error is logged as
//! a warning and otherwise ignored.
//!
//! # Failure policy
//!
//! [`FallbackReader::try_read`] always reports failures. [`FallbackReader::read`]
//! applies the configured [`FallbackPolicy`]:
//!
//! - [`FallbackPolicy::DegradeToEmpty`]: log the failure and return an empty row set,
//!   so a batch keeps going when one artifact cannot be decoded at all.
//! - [`FallbackPolicy::Propagate`]: return the error.
//!
//! Cancellation is returned under either policy.

use crate::config::ConvertConfig;
use crate::error::{ConfigError, FallbackError};
use crate::process::{CommandSpec, ProcessRunner};
use crate::row::RowSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Decode script run by the default Python interpreter. `sys.argv[1]` is the file path.
pub const DEFAULT_DECODE_SCRIPT: &str = "\
import sys, json
import pyarrow.parquet as pq
tbl = pq.read_table(sys.argv[1])
json.dump(tbl.to_pylist(), sys.stdout, default=str)
";

/// What [`FallbackReader::read`] does when the fallback decode fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Log the failure and yield an empty row set.
    #[default]
    #[cfg_attr(
        feature = "cli",
        value(name = "degrade", alias = "degrade-to-empty", alias = "empty")
    )]
    DegradeToEmpty,
    /// Return the failure to the caller.
    #[cfg_attr(feature = "cli", value(alias = "abort"))]
    Propagate,
}

impl FromStr for FallbackPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" | "degrade-to-empty" | "empty" => Ok(FallbackPolicy::DegradeToEmpty),
            "propagate" | "abort" => Ok(FallbackPolicy::Propagate),
            _ => Err(ConfigError::InvalidPolicy {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackPolicy::DegradeToEmpty => "degrade",
            FallbackPolicy::Propagate => "propagate",
        })
    }
}

/// Decodes a columnar file by running an external interpreter.
#[derive(Clone, Debug)]
pub struct FallbackReader {
    interpreter: PathBuf,
    script: String,
    timeout: Option<Duration>,
    policy: FallbackPolicy,
    cancel: Option<CancellationToken>,
    runner: ProcessRunner,
}

impl FallbackReader {
    /// Reader running [`DEFAULT_DECODE_SCRIPT`] with `interpreter`, no deadline,
    /// degrading failures to an empty row set.
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: DEFAULT_DECODE_SCRIPT.to_string(),
            timeout: None,
            policy: FallbackPolicy::default(),
            cancel: None,
            runner: ProcessRunner::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            script: config.script.clone(),
            timeout: config.timeout,
            policy: config.fallback_policy,
            cancel: None,
            runner: ProcessRunner::default(),
        }
    }

    /// Replace the decode script. It receives the file path as its first argument.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    #[must_use]
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// The command line used to decode `path`.
    #[must_use]
    pub fn command_for(&self, path: &Path) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.interpreter)
            .arg("-c")
            .arg(&self.script)
            .arg(path);
        if let Some(timeout) = self.timeout {
            spec = spec.timeout(timeout);
        }
        if let Some(token) = &self.cancel {
            spec = spec.cancel_token(token.clone());
        }
        spec
    }

    /// Decode `path` with the external interpreter, reporting every failure.
    ///
    /// # Errors
    /// [`FallbackError::Process`] if the interpreter cannot be spawned, exits
    /// non-zero, times out or is cancelled; [`FallbackError::Parse`] if its
    /// standard output is not a JSON array of objects.
    pub async fn try_read(&self, path: &Path) -> Result<RowSet, FallbackError> {
        debug!(path = %path.display(), interpreter = %self.interpreter.display(), "running fallback decoder");
        let output = self.runner.run(&self.command_for(path)).await?;
        if !output.stderr.trim().is_empty() {
            warn!(path = %path.display(), stderr = %output.stderr.trim_end(), "fallback decoder wrote to stderr");
        }
        serde_json::from_str(&output.stdout).map_err(|source| FallbackError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Decode `path`, applying the configured [`FallbackPolicy`] to failures.
    ///
    /// # Errors
    /// Only under [`FallbackPolicy::Propagate`], or on cancellation.
    pub async fn read(&self, path: &Path) -> Result<RowSet, FallbackError> {
        match self.try_read(path).await {
            Ok(rows) => Ok(rows),
            Err(e) => self.recover(path, e),
        }
    }

    /// Apply the policy to a failure from [`try_read`](Self::try_read).
    ///
    /// # Errors
    /// Returns `err` unchanged under [`FallbackPolicy::Propagate`] or when it is a cancellation.
    pub fn recover(&self, path: &Path, err: FallbackError) -> Result<RowSet, FallbackError> {
        if err.is_cancelled() {
            return Err(err);
        }
        match self.policy {
            FallbackPolicy::DegradeToEmpty => {
                error!(path = %path.display(), error = %err, "fallback decoder failed, using empty row set");
                Ok(RowSet::new())
            }
            FallbackPolicy::Propagate => Err(err),
        }
    }
}
