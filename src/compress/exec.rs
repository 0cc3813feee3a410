//! Bounded subprocess execution.
//!
//! External backends and probe queries run through here so no child process
//! can hang the caller: the child is polled against a deadline and killed on
//! timeout or cancellation, never abandoned.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::defaults::EXIT_POLL_INTERVAL_MS;

/// Cooperative cancellation signal shared between a batch driver and its
/// in-flight workers. Cloning shares the underlying flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ExecOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn: {0}")]
    Spawn(std::io::Error),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("failed to wait on child: {0}")]
    Wait(std::io::Error),
}

/// Run a command to completion, killing it if it outlives `timeout` or the
/// cancel token fires. Stdout and stderr are drained on helper threads so a
/// chatty child cannot deadlock on a full pipe.
pub fn run_with_timeout(
    command: &mut Command,
    timeout: Duration,
    cancel: Option<&CancelToken>,
) -> Result<ExecOutput, ExecError> {
    let started = Instant::now();

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(ExecError::Spawn)?;

    let stdout_reader = spawn_drain(child.stdout.take());
    let stderr_reader = spawn_drain(child.stderr.take());
    let poll_interval = Duration::from_millis(EXIT_POLL_INTERVAL_MS);

    let status = loop {
        match child.try_wait().map_err(ExecError::Wait)? {
            Some(status) => break status,
            None => {
                if cancel.map(CancelToken::is_cancelled).unwrap_or(false) {
                    kill_and_reap(&mut child);
                    join_drain(stdout_reader);
                    join_drain(stderr_reader);
                    return Err(ExecError::Cancelled);
                }
                if started.elapsed() >= timeout {
                    kill_and_reap(&mut child);
                    join_drain(stdout_reader);
                    join_drain(stderr_reader);
                    return Err(ExecError::TimedOut(timeout));
                }
                std::thread::sleep(poll_interval);
            }
        }
    };

    Ok(ExecOutput {
        status,
        stdout: join_drain(stdout_reader),
        stderr: join_drain(stderr_reader),
        duration: started.elapsed(),
    })
}

fn spawn_drain<R: Read + Send + 'static>(
    source: Option<R>,
) -> Option<std::thread::JoinHandle<String>> {
    source.map(|mut reader| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = reader.read_to_end(&mut bytes);
            // Non-UTF8 diagnostics degrade to lossy text
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

fn join_drain(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("Failed to kill child process: {}", e);
    }
    // Reap so the killed child does not linger as a zombie
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_captures_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2"]);

        let out = run_with_timeout(&mut cmd, Duration::from_secs(5), None).unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");

        let started = Instant::now();
        let result = run_with_timeout(&mut cmd, Duration::from_millis(200), None);
        assert!(matches!(result, Err(ExecError::TimedOut(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_child() {
        let token = CancelToken::new();
        token.cancel();

        let mut cmd = Command::new("sleep");
        cmd.arg("30");

        let result = run_with_timeout(&mut cmd, Duration::from_secs(30), Some(&token));
        assert!(matches!(result, Err(ExecError::Cancelled)));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let mut cmd = Command::new("definitely-not-a-real-binary-pdfsq");
        let result = run_with_timeout(&mut cmd, Duration::from_secs(1), None);
        assert!(matches!(result, Err(ExecError::Spawn(_))));
    }
}
