//! Shutdown signals wired to a [`CancellationToken`].
//!
//! The binary hands the token to [`Converter`](crate::Converter), so Ctrl-C or
//! a `SIGTERM` kills a running fallback interpreter and stops the batch before
//! the next artifact.

use std::io;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handlers for `SIGINT`, `SIGTERM` and `SIGHUP`, registered on creation.
#[cfg(unix)]
pub struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Register the handlers. Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// If a handler cannot be registered.
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next signal and return its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.hangup.recv() => "SIGHUP",
        }
    }
}

/// Cancel `token` on the first shutdown signal.
///
/// Handlers are registered before this returns. The spawned listener ends
/// when a signal arrives or when `token` is cancelled by someone else.
///
/// # Errors
/// If a handler cannot be registered.
#[cfg(unix)]
pub fn cancel_on_shutdown(token: CancellationToken) -> io::Result<JoinHandle<()>> {
    let mut signals = ShutdownSignals::install()?;
    Ok(tokio::spawn(async move {
        tokio::select! {
            name = signals.recv() => {
                info!(signal = name, "signal received, cancelling conversion");
                token.cancel();
            }
            () = token.cancelled() => {}
        }
    }))
}

/// Cancel `token` on Ctrl-C.
///
/// # Errors
/// Never on this platform; the signature matches the unix variant.
#[cfg(not(unix))]
pub fn cancel_on_shutdown(token: CancellationToken) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => {
                    info!(signal = "ctrl-c", "signal received, cancelling conversion");
                    token.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "failed to listen for ctrl-c"),
            },
            () = token.cancelled() => {}
        }
    }))
}
