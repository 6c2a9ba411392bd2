//! Batch conversion of the graph artifacts in one output directory.
//!
//! For each [`ConversionTarget`], strictly in order:
//!
//! 1. skip it if its Parquet file is absent (not counted),
//! 2. decode it in-process with [`read_parquet_rows`],
//! 3. on a [`ReadError`](crate::error::ReadError), decode it with the
//!    [`FallbackReader`], whose policy decides between an empty row set and an error,
//! 4. write the rows as `<base>.json` next to the input, overwriting,
//! 5. count it.
//!
//! Filesystem failures and propagated fallback failures abort the batch.
//!
//! ```no_run
//! use artifact_json::{ConvertConfig, Converter};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = ConvertConfig::from_env()?;
//! config.validate()?;
//! let report = Converter::from_config(&config).convert_dir("output").await?;
//! println!("converted {} artifact(s)", report.converted);
//! # Ok(())
//! # }
//! ```

use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::fallback::FallbackReader;
use crate::io::json::write_json_rows;
use crate::io::parquet::read_parquet_rows;
use crate::row::RowSet;
use crate::target::ConversionTarget;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::create_dir_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Which decoder produced an artifact's rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoder {
    /// The in-process Parquet reader.
    Native,
    /// The external interpreter.
    Fallback,
    /// Both decoders failed and the fallback policy degraded to no rows.
    Empty,
}

/// Result of converting one artifact.
#[derive(Clone, Debug, Serialize)]
pub struct TargetOutcome {
    pub target: ConversionTarget,
    pub output: PathBuf,
    pub decoder: Decoder,
    pub rows: usize,
}

/// Summary of one batch.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Artifacts whose input existed and whose JSON was written, including empty ones.
    pub converted: usize,
    /// One entry per converted artifact, in processing order.
    pub outcomes: Vec<TargetOutcome>,
}

impl ConversionReport {
    #[must_use]
    pub fn outcome(&self, target: ConversionTarget) -> Option<&TargetOutcome> {
        self.outcomes.iter().find(|o| o.target == target)
    }
}

/// Converts the fixed artifact set of a directory, one artifact at a time.
#[derive(Clone, Debug)]
pub struct Converter {
    fallback: FallbackReader,
    cancel: Option<CancellationToken>,
}

impl Converter {
    #[must_use]
    pub fn new(fallback: FallbackReader) -> Self {
        Self {
            fallback,
            cancel: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self::new(FallbackReader::from_config(config))
    }

    /// Stop between artifacts, and kill a running fallback decoder, once `token` is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.fallback = self.fallback.with_cancel_token(token.clone());
        self.cancel = Some(token);
        self
    }

    /// Convert every present artifact in `dir`.
    ///
    /// # Errors
    /// [`ConvertError`] if the directory or an output file cannot be written,
    /// the fallback fails under the `Propagate` policy, or the batch is cancelled.
    pub async fn convert_dir(
        &self,
        dir: impl AsRef<Path>,
    ) -> Result<ConversionReport, ConvertError> {
        let dir = dir.as_ref();
        create_dir_all(dir).await.map_err(|source| ConvertError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut report = ConversionReport::default();
        for target in ConversionTarget::ALL {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(ConvertError::Cancelled);
            }
            if let Some(outcome) = self.convert_target(target, dir).await? {
                report.converted += 1;
                report.outcomes.push(outcome);
            }
        }
        info!(dir = %dir.display(), converted = report.converted, "conversion finished");
        Ok(report)
    }

    async fn convert_target(
        &self,
        target: ConversionTarget,
        dir: &Path,
    ) -> Result<Option<TargetOutcome>, ConvertError> {
        let input = target.input_path(dir);
        if !input.exists() {
            debug!(%target, path = %input.display(), "artifact not present, skipping");
            return Ok(None);
        }

        let (rows, decoder) = self.decode(&input).await?;

        let output = target.output_path(dir);
        write_json_rows(&output, &rows).map_err(|source| ConvertError::Write {
            path: output.clone(),
            source,
        })?;
        info!(%target, rows = rows.len(), ?decoder, output = %output.display(), "wrote artifact");

        Ok(Some(TargetOutcome {
            target,
            output,
            decoder,
            rows: rows.len(),
        }))
    }

    async fn decode(&self, input: &Path) -> Result<(RowSet, Decoder), ConvertError> {
        let native = {
            let input = input.to_path_buf();
            tokio::task::spawn_blocking(move || read_parquet_rows(input))
        };
        let native = match native.await {
            Ok(result) => result,
            Err(join) => std::panic::resume_unwind(join.into_panic()),
        };
        let err = match native {
            Ok(rows) => return Ok((rows, Decoder::Native)),
            Err(e) => e,
        };
        warn!(path = %input.display(), error = %err, "native parquet reader failed, trying fallback decoder");

        let fallback_err = match self.fallback.try_read(input).await {
            Ok(rows) => return Ok((rows, Decoder::Fallback)),
            Err(e) => e,
        };
        if fallback_err.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }
        self.fallback
            .recover(input, fallback_err)
            .map(|rows| (rows, Decoder::Empty))
            .map_err(|source| ConvertError::Fallback {
                path: input.to_path_buf(),
                source,
            })
    }
}

/// Convert the artifacts in `dir` with a converter built from `config`.
///
/// The config is not validated here; see [`ConvertConfig::validate`].
///
/// # Errors
/// See [`Converter::convert_dir`].
pub async fn convert_graph_parquet_to_json(
    dir: impl AsRef<Path>,
    config: &ConvertConfig,
) -> Result<ConversionReport, ConvertError> {
    Converter::from_config(config).convert_dir(dir).await
}
