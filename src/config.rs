//! Converter configuration.
//!
//! Values come from [`ConvertConfig::default`], then `ARTIFACT_JSON_*`
//! environment variables ([`ConvertConfig::from_env`]), then CLI flags. Call
//! [`ConvertConfig::validate`] before converting so a missing interpreter is
//! reported at startup rather than deep inside the fallback path.

use crate::error::ConfigError;
use crate::fallback::{DEFAULT_DECODE_SCRIPT, FallbackPolicy};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interpreter used by the fallback decoder.
pub const ENV_PYTHON: &str = "ARTIFACT_JSON_PYTHON";
/// Fallback decoder deadline in whole seconds; `0` disables it.
pub const ENV_TIMEOUT_SECS: &str = "ARTIFACT_JSON_TIMEOUT_SECS";
/// `degrade` or `propagate`.
pub const ENV_FALLBACK_POLICY: &str = "ARTIFACT_JSON_FALLBACK_POLICY";

pub const DEFAULT_INTERPRETER: &str = "python3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct ConvertConfig {
    /// Interpreter path or bare command name (looked up on `PATH`).
    pub interpreter: PathBuf,
    /// Script passed to the interpreter with `-c`.
    pub script: String,
    /// Deadline for one fallback decode. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub fallback_policy: FallbackPolicy,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            script: DEFAULT_DECODE_SCRIPT.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

impl ConvertConfig {
    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    /// If a timeout or policy variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `ARTIFACT_JSON_*` keys.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    /// If a timeout or policy value is set but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(python) = get(ENV_PYTHON) {
            config.interpreter = PathBuf::from(python);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            config.timeout = parse_timeout_secs(&secs)?;
        }
        if let Some(policy) = get(ENV_FALLBACK_POLICY) {
            config.fallback_policy = policy.parse()?;
        }
        Ok(config)
    }

    /// Check that the interpreter resolves to a file, returning its resolved path.
    ///
    /// # Errors
    /// [`ConfigError::InterpreterNotFound`].
    pub fn validate(&self) -> Result<PathBuf, ConfigError> {
        resolve_program(&self.interpreter, std::env::var_os("PATH")).ok_or_else(|| {
            ConfigError::InterpreterNotFound {
                path: self.interpreter.clone(),
            }
        })
    }
}

/// Parse a whole number of seconds; zero means no deadline.
///
/// # Errors
/// [`ConfigError::InvalidTimeout`].
pub fn parse_timeout_secs(value: &str) -> Result<Option<Duration>, ConfigError> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidTimeout {
            value: value.to_string(),
            source,
        })?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

/// Resolve `program` the way the OS would: paths with a separator are taken as
/// is, bare names are searched for in `search_path`.
fn resolve_program(program: &Path, search_path: Option<OsString>) -> Option<PathBuf> {
    if program.as_os_str().is_empty() {
        return None;
    }
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }
    let search_path = search_path?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
