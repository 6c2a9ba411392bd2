//! External process execution with incremental output capture.
//!
//! [`ProcessRunner::run`] spawns a [`CommandSpec`] on the tokio runtime and
//! drains its standard output and standard error while it runs. The wait for
//! the exit status and both drains form a single future, so the deadline and
//! the cancel token bound all of it. A grandchild that inherits the pipes and
//! outlives the child cannot hold the caller past either.
//!
//! - exit status zero: [`ProcessOutput`] with both captured streams,
//! - non-zero exit: [`ProcessError::Execution`] carrying the full stdout and stderr text,
//! - spawn failure: [`ProcessError::Spawn`],
//! - deadline elapsed: the child is killed, [`ProcessError::TimedOut`],
//! - cancellation requested: the child is killed, [`ProcessError::Cancelled`].
//!
//! Timed out and cancelled runs still report whatever output was captured.
//!
//! Arguments are handed to the OS as a vector. Nothing is ever routed through
//! a shell, so paths and script bodies need no quoting.
//!
//! ```no_run
//! use artifact_json::process::{CommandSpec, ProcessRunner};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let spec = CommandSpec::new("python3")
//!     .arg("-c")
//!     .arg("print('hello')")
//!     .timeout(Duration::from_secs(10));
//! let out = ProcessRunner::default().run(&spec).await?;
//! assert_eq!(out.stdout.trim(), "hello");
//! # Ok(())
//! # }
//! ```

use crate::error::ProcessError;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A command line plus the knobs that control how it is supervised.
#[derive(Clone, Debug)]
pub struct CommandSpec {
    /// Executable to run. Resolved through `PATH` by the OS when it has no separator.
    pub program: OsString,
    /// Positional arguments, passed verbatim.
    pub args: Vec<OsString>,
    /// Working directory override.
    pub current_dir: Option<PathBuf>,
    /// Environment overrides layered on top of the inherited environment.
    pub envs: Vec<(OsString, OsString)>,
    /// Kill the child once this much wall time has elapsed.
    pub timeout: Option<Duration>,
    /// Kill the child once this token is cancelled.
    pub cancel: Option<CancellationToken>,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
            timeout: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Output of a process that exited successfully.
#[derive(Clone, Debug)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

/// Spawns processes and supervises them until they exit.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    /// Size of the buffer each stream is drained through.
    pub chunk_size: usize,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024,
        }
    }
}

enum Supervised {
    Exited(ExitStatus),
    Failed(io::Error),
    TimedOut(Duration),
    Cancelled,
}

type SharedBuf = Arc<Mutex<Vec<u8>>>;

impl ProcessRunner {
    /// Run `spec` to completion.
    ///
    /// Resolves once the child has exited and both of its streams are closed,
    /// or as soon as the deadline elapses or the cancel token fires. Without a
    /// deadline or token it waits indefinitely.
    ///
    /// # Errors
    /// See the module documentation for the mapping of outcomes to [`ProcessError`].
    pub async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        let program = spec.program_name();

        let mut child = spec
            .command()
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;
        debug!(program = %program, pid = child.id(), args = spec.args.len(), "spawned process");

        let stdout_buf = SharedBuf::default();
        let stderr_buf = SharedBuf::default();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let outcome = {
            let work = self.supervise(&mut child, stdout, stderr, &stdout_buf, &stderr_buf);
            let bounded = async {
                match spec.timeout {
                    Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| limit),
                    None => Ok(work.await),
                }
            };
            let cancelled = async {
                match &spec.cancel {
                    Some(token) => token.cancelled().await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                biased;
                () = cancelled => Supervised::Cancelled,
                res = bounded => match res {
                    Ok(Ok(status)) => Supervised::Exited(status),
                    Ok(Err(source)) => Supervised::Failed(source),
                    Err(limit) => Supervised::TimedOut(limit),
                },
            }
        };

        let stdout = snapshot(&stdout_buf);
        let stderr = snapshot(&stderr_buf);
        match outcome {
            Supervised::Exited(status) => {
                debug!(program = %program, %status, stdout_bytes = stdout.len(), stderr_bytes = stderr.len(), "process exited");
                if status.success() {
                    Ok(ProcessOutput {
                        stdout,
                        stderr,
                        status,
                    })
                } else {
                    Err(ProcessError::Execution {
                        program,
                        status,
                        stdout,
                        stderr,
                    })
                }
            }
            Supervised::Failed(source) => {
                terminate(&mut child, &program).await;
                Err(ProcessError::Io { program, source })
            }
            Supervised::TimedOut(timeout) => {
                warn!(program = %program, ?timeout, "process exceeded its deadline");
                terminate(&mut child, &program).await;
                Err(ProcessError::TimedOut {
                    program,
                    timeout,
                    stdout,
                    stderr,
                })
            }
            Supervised::Cancelled => {
                debug!(program = %program, "process cancelled");
                terminate(&mut child, &program).await;
                Err(ProcessError::Cancelled {
                    program,
                    stdout,
                    stderr,
                })
            }
        }
    }

    /// Wait for the exit status while draining both streams to EOF.
    async fn supervise(
        &self,
        child: &mut Child,
        stdout: Option<ChildStdout>,
        stderr: Option<ChildStderr>,
        stdout_buf: &SharedBuf,
        stderr_buf: &SharedBuf,
    ) -> io::Result<ExitStatus> {
        let (status, (), ()) = tokio::try_join!(
            child.wait(),
            drain(stdout, stdout_buf, self.chunk_size),
            drain(stderr, stderr_buf, self.chunk_size),
        )?;
        Ok(status)
    }
}

/// Kill the child unless it has already been reaped.
async fn terminate(child: &mut Child, program: &str) {
    if matches!(child.try_wait(), Ok(Some(_))) {
        return;
    }
    if let Err(e) = child.kill().await {
        warn!(program, error = %e, "failed to kill child process");
    }
}

async fn drain<R: AsyncRead + Unpin>(
    stream: Option<R>,
    buf: &SharedBuf,
    chunk_size: usize,
) -> io::Result<()> {
    let Some(mut stream) = stream else {
        return Ok(());
    };
    let mut chunk = vec![0u8; chunk_size.max(1)];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(&chunk[..n]);
    }
}

fn snapshot(buf: &SharedBuf) -> String {
    let bytes = buf.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&bytes).into_owned()
}
