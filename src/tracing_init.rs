//! Log subscriber for the CLI.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber writing to stderr, leaving stdout to `--report`.
///
/// `RUST_LOG` wins when set. Otherwise this crate logs at `info`, `debug` or
/// `trace` for a `verbosity` of 0, 1 or more, and dependencies at `warn`.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}={level}", env!("CARGO_CRATE_NAME"))));

    let stderr = std::io::stderr();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(stderr.is_terminal())
        .with_target(verbosity > 0)
        .with_writer(std::io::stderr)
        .init();
}
