//! artifact-json CLI: converts graph Parquet artifacts to JSON.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use artifact_json::signal::cancel_on_shutdown;
use artifact_json::{CliArgs, Converter, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let shutdown = CancellationToken::new();
    if let Err(e) = cancel_on_shutdown(shutdown.clone()) {
        warn!(error = %e, "failed to install signal handlers, Ctrl-C will not stop the fallback decoder");
    }

    match run(&args, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &CliArgs, shutdown: CancellationToken) -> Result<()> {
    let config = args.to_config();
    let interpreter = config.validate()?;
    info!(
        interpreter = %interpreter.display(),
        policy = %config.fallback_policy,
        timeout = ?config.timeout,
        "starting conversion of {}",
        args.output_dir.display()
    );

    let report = Converter::from_config(&config)
        .with_cancel_token(shutdown)
        .convert_dir(&args.output_dir)
        .await
        .with_context(|| format!("convert artifacts in {}", args.output_dir.display()))?;

    if args.report {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    }
    Ok(())
}
