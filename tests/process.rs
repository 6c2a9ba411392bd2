#![cfg(unix)]

use anyhow::Result;
use artifact_json::process::{CommandSpec, ProcessRunner};
use artifact_json::ProcessError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn sh(script: &str) -> CommandSpec {
    CommandSpec::new("/bin/sh").arg("-c").arg(script)
}

#[tokio::test]
async fn zero_exit_returns_both_streams() -> Result<()> {
    let out = ProcessRunner::default()
        .run(&sh("printf out; printf err >&2"))
        .await?;
    assert!(out.status.success());
    assert_eq!(out.stdout, "out");
    assert_eq!(out.stderr, "err");
    Ok(())
}

#[tokio::test]
async fn stdout_spread_over_many_chunks_is_complete() -> Result<()> {
    // Larger than a pipe buffer, and emitted in pauses.
    let script = "printf first; sleep 0.1; head -c 200000 /dev/zero | tr '\\0' a; sleep 0.1; printf last";
    let out = ProcessRunner::default().run(&sh(script)).await?;
    assert_eq!(out.stdout.len(), "first".len() + 200_000 + "last".len());
    assert!(out.stdout.starts_with("firstaaa"));
    assert!(out.stdout.ends_with("aaalast"));
    Ok(())
}

#[tokio::test]
async fn streams_are_captured_independently_in_order() -> Result<()> {
    let script = "for i in 1 2 3; do echo out$i; echo err$i >&2; done";
    let out = ProcessRunner::default().run(&sh(script)).await?;
    assert_eq!(out.stdout, "out1\nout2\nout3\n");
    assert_eq!(out.stderr, "err1\nerr2\nerr3\n");
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_carries_full_stderr() {
    let script = "echo partial; echo 'Traceback: line one' >&2; echo 'ModuleNotFoundError: pyarrow' >&2; exit 3";
    let err = ProcessRunner::default().run(&sh(script)).await.unwrap_err();

    match &err {
        ProcessError::Execution {
            status,
            stdout,
            stderr,
            ..
        } => {
            assert_eq!(status.code(), Some(3));
            assert_eq!(stdout, "partial\n");
            assert_eq!(stderr, "Traceback: line one\nModuleNotFoundError: pyarrow\n");
        }
        other => panic!("expected Execution, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("Traceback: line one\nModuleNotFoundError: pyarrow"));
    assert!(msg.contains("partial"));
    assert_eq!(
        err.stderr(),
        Some("Traceback: line one\nModuleNotFoundError: pyarrow\n")
    );
}

#[tokio::test]
async fn missing_executable_is_a_spawn_error() {
    let spec = CommandSpec::new("/nonexistent/bin/python-for-tests").arg("-c");
    let err = ProcessRunner::default().run(&spec).await.unwrap_err();
    assert!(matches!(err, ProcessError::Spawn { .. }), "got {err:?}");
    assert!(err.to_string().contains("python-for-tests"));
}

#[tokio::test]
async fn arguments_are_not_shell_interpreted() -> Result<()> {
    let tricky = "it's a \"path\" with $HOME; rm -rf / && `x`";
    let out = ProcessRunner::default().run(&sh("printf '%s' \"$0\"").arg(tricky)).await?;
    assert_eq!(out.stdout, tricky);
    Ok(())
}

#[tokio::test]
async fn env_and_working_dir_overrides_apply() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let spec = sh("printf '%s|' \"$ARTIFACT_JSON_TEST_VAR\"; pwd")
        .env("ARTIFACT_JSON_TEST_VAR", "hello")
        .current_dir(dir.path());
    let out = ProcessRunner::default().run(&spec).await?;

    let (var, cwd) = out.stdout.trim_end().split_once('|').unwrap();
    assert_eq!(var, "hello");
    assert_eq!(
        std::fs::canonicalize(cwd)?,
        std::fs::canonicalize(dir.path())?
    );
    Ok(())
}

#[tokio::test]
async fn deadline_kills_a_hung_process() {
    let spec = sh("printf started; exec sleep 30").timeout(Duration::from_millis(300));
    let started = Instant::now();
    let err = ProcessRunner::default().run(&spec).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    match err {
        ProcessError::TimedOut {
            timeout, stdout, ..
        } => {
            assert_eq!(timeout, Duration::from_millis(300));
            assert_eq!(stdout, "started");
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }
}

#[tokio::test]
async fn cancellation_kills_a_running_process() {
    let token = CancellationToken::new();
    let spec = sh("printf partial; exec sleep 30").cancel_token(token.clone());

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        })
    };
    let started = Instant::now();
    let err = ProcessRunner::default().run(&spec).await.unwrap_err();
    canceller.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    match err {
        ProcessError::Cancelled { stdout, .. } => assert_eq!(stdout, "partial"),
        other => panic!("expected Cancelled, got {other:?}"),
    }
}

#[tokio::test]
async fn token_cancelled_before_start_kills_immediately() {
    let token = CancellationToken::new();
    token.cancel();
    let started = Instant::now();
    let err = ProcessRunner::default()
        .run(&sh("exec sleep 30").cancel_token(token))
        .await
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(err, ProcessError::Cancelled { .. }), "got {err:?}");
}

#[tokio::test]
async fn deadline_covers_a_grandchild_holding_the_pipes() {
    // The shell exits at once, but the backgrounded sleep keeps stdout open.
    let spec = sh("sleep 8 & printf done").timeout(Duration::from_millis(300));
    let started = Instant::now();
    let err = ProcessRunner::default().run(&spec).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    match err {
        ProcessError::TimedOut { stdout, .. } => assert_eq!(stdout, "done"),
        other => panic!("expected TimedOut, got {other:?}"),
    }
}

#[tokio::test]
async fn cancellation_covers_a_grandchild_holding_the_pipes() {
    let token = CancellationToken::new();
    let spec = sh("sleep 8 & echo 'warming up' >&2").cancel_token(token.clone());
    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            token.cancel();
        })
    };

    let started = Instant::now();
    let err = ProcessRunner::default().run(&spec).await.unwrap_err();
    canceller.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    assert_eq!(err.stderr(), Some("warming up\n"));
    assert!(matches!(err, ProcessError::Cancelled { .. }), "got {err:?}");
}

#[tokio::test]
async fn fast_process_finishes_within_deadline() -> Result<()> {
    let spec = sh("echo done").timeout(Duration::from_secs(30));
    let out = ProcessRunner::default().run(&spec).await?;
    assert_eq!(out.stdout, "done\n");
    Ok(())
}
