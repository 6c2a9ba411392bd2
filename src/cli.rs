//! Command-line arguments for the `artifact-json` binary.

use crate::config::{
    ConvertConfig, DEFAULT_INTERPRETER, ENV_FALLBACK_POLICY, ENV_PYTHON, ENV_TIMEOUT_SECS,
};
use crate::fallback::FallbackPolicy;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Convert the graph Parquet artifacts in a directory to JSON.
#[derive(Parser, Debug)]
#[command(name = "artifact-json", version, about)]
pub struct CliArgs {
    /// Directory holding entities/relationships/communities/community_reports .parquet files
    pub output_dir: PathBuf,

    /// Interpreter used by the fallback decoder (needs pyarrow)
    #[arg(long = "python", env = ENV_PYTHON, default_value = DEFAULT_INTERPRETER)]
    pub python: PathBuf,

    /// Fallback decoder deadline in seconds (0 disables)
    #[arg(long = "timeout-secs", env = ENV_TIMEOUT_SECS, default_value_t = 300)]
    pub timeout_secs: u64,

    /// What to do when both decoders fail
    #[arg(
        long = "on-fallback-failure",
        env = ENV_FALLBACK_POLICY,
        value_enum,
        default_value = "degrade"
    )]
    pub on_fallback_failure: FallbackPolicy,

    /// Print the conversion report as JSON on stdout
    #[arg(long)]
    pub report: bool,

    /// Raise log verbosity (-v debug, -vv trace); ignored when RUST_LOG is set
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Build the converter configuration these arguments describe.
    #[must_use]
    pub fn to_config(&self) -> ConvertConfig {
        ConvertConfig {
            interpreter: self.python.clone(),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            fallback_policy: self.on_fallback_failure,
            ..ConvertConfig::default()
        }
    }
}
