//! Bounded subprocess execution.
//!
//! Both output pipes are drained on background threads while the calling
//! thread polls the child, so a chatty child can never block on a full pipe.
//! The deadline also covers the pipes: a descendant that keeps them open after
//! the child exits still ends the run with a timeout. On timeout or
//! cancellation the child is killed and reaped before returning.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start process: {0}")]
    Spawn(#[source] io::Error),
    #[error("process timed out after {0:?}")]
    Timeout(Duration),
    #[error("process was cancelled")]
    Cancelled,
    #[error("failed while waiting for process: {0}")]
    Io(#[source] io::Error),
}

#[derive(Debug, Clone)]
/// Captured output of a completed process.
pub struct ProcessOutput {
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone, Default)]
/// Cooperative cancellation flag shared between a caller and a running check.
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

/// Run `argv` in `cwd` (or the current directory) with a hard `timeout`.
pub fn run(argv: &[String], cwd: Option<&Path>, timeout: Duration) -> Result<ProcessOutput, RunError> {
    run_with_cancel(argv, cwd, timeout, None)
}

/// Same as [`run`], additionally polling `cancel` while waiting.
pub fn run_with_cancel(
    argv: &[String],
    cwd: Option<&Path>,
    timeout: Duration,
    cancel: Option<&CancelToken>,
) -> Result<ProcessOutput, RunError> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        RunError::Spawn(io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))
    })?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(?argv, ?cwd, ?timeout, "spawning process");
    let mut child = cmd.spawn().map_err(RunError::Spawn)?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    // `None` when the timeout is too large to represent: wait without a deadline.
    let deadline = Instant::now().checked_add(timeout);
    let mut exited: Option<ExitStatus> = None;
    let status = loop {
        if exited.is_none() {
            match child.try_wait() {
                Ok(s) => exited = s,
                Err(e) => {
                    terminate(&mut child);
                    return Err(RunError::Io(e));
                }
            }
        }
        // The run completes once the child has exited and both pipes are closed.
        if let Some(status) = exited {
            if finished(&stdout) && finished(&stderr) {
                break status;
            }
        }
        if cancel.is_some_and(CancelToken::is_cancelled) {
            warn!(pid = child.id(), "cancellation requested; killing process");
            terminate(&mut child);
            return Err(RunError::Cancelled);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            if exited.is_some() {
                warn!(?timeout, "process exited but its output pipes are still open; giving up");
            } else {
                warn!(pid = child.id(), ?timeout, "process timed out; killing");
            }
            terminate(&mut child);
            return Err(RunError::Timeout(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let exit_code = status.code().unwrap_or(-1);
    debug!(exit_code, "process exited");
    Ok(ProcessOutput {
        exit_code,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

/// Kill and reap. Reader threads are left to finish on their own: a surviving
/// grandchild may still hold the pipes open, and the partial output is unused.
/// Killing an already-exited child is a no-op.
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut r| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            buf
        })
    })
}

fn finished(handle: &Option<JoinHandle<Vec<u8>>>) -> bool {
    handle.as_ref().map_or(true, JoinHandle::is_finished)
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[test]
    fn test_run_captures_both_streams_and_exit_code() {
        let out = run(&sh("echo out; echo err 1>&2; exit 3"), None, Duration::from_secs(10)).unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
        assert!(!out.success());
    }

    #[test]
    fn test_run_replaces_invalid_utf8() {
        let out = run(&sh("printf 'a\\377b'"), None, Duration::from_secs(10)).unwrap();
        assert_eq!(out.stdout, "a\u{FFFD}b");
    }

    #[test]
    fn test_run_drains_large_output() {
        // Well past a typical 64 KiB pipe buffer.
        let out = run(
            &sh("i=0; while [ $i -lt 20000 ]; do echo 0123456789; i=$((i+1)); done"),
            None,
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout.lines().count(), 20000);
    }

    #[test]
    fn test_run_times_out_and_kills() {
        let started = Instant::now();
        let err = run(&sh("exec sleep 30"), None, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_run_accepts_unrepresentable_timeout() {
        let out = run(&sh("echo done"), None, Duration::from_secs(u64::MAX)).unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout.trim(), "done");
    }

    #[test]
    fn test_run_deadline_covers_inherited_pipes() {
        // The backgrounded sleep keeps stdout open after the shell exits.
        let started = Instant::now();
        let err = run(&sh("sleep 5 & echo hi"), None, Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_run_reports_spawn_failure() {
        let argv = vec!["/definitely/not/a/real/binary".to_string()];
        let err = run(&argv, None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RunError::Spawn(_)));
        let err = run(&[], None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RunError::Spawn(_)));
    }

    #[test]
    fn test_run_honors_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let err = run_with_cancel(&sh("exec sleep 30"), None, Duration::from_secs(30), Some(&token))
            .unwrap_err();
        assert!(matches!(err, RunError::Cancelled));
    }

    #[test]
    fn test_run_uses_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(&sh("pwd"), Some(dir.path()), Duration::from_secs(10)).unwrap();
        let got = std::path::PathBuf::from(out.stdout.trim()).canonicalize().unwrap();
        assert_eq!(got, dir.path().canonicalize().unwrap());
    }
}
