//! External process execution with a deadline.
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;

/// How often a running child is polled for exit, timeout, and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

/// How a bounded command run ended.
#[derive(Debug)]
pub enum Completion {
    /// The process exited on its own.
    Exited(ExecResult),
    /// The deadline passed and the process was killed.
    TimedOut,
    /// The cancellation token was tripped and the process was killed.
    Cancelled,
}

/// Run a command, killing it if it outlives `timeout` or `cancel` is tripped.
///
/// The deadline also covers draining the child's output: a descendant that
/// inherits the pipes and keeps them open past the deadline yields
/// [`Completion::TimedOut`] even though the child itself exited. A timeout
/// too large to represent means no deadline.
///
/// Non-zero exit is not an error; inspect [`ExecResult::success`].
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or waited on.
pub fn run_with_deadline<P: AsRef<OsStr>>(
    program: P,
    args: &[&str],
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<Completion> {
    let label = program.as_ref().to_string_lossy().to_string();
    let mut child = Command::new(program.as_ref())
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to execute: {label}"))?;

    // Drain both pipes on their own threads so a chatty child cannot block
    // on a full pipe while we poll.
    let (tx, rx) = mpsc::channel();
    if let Some(pipe) = child.stdout.take() {
        spawn_reader(pipe, Stream::Stdout, tx.clone());
    }
    if let Some(pipe) = child.stderr.take() {
        spawn_reader(pipe, Stream::Stderr, tx.clone());
    }
    drop(tx);

    let deadline = Instant::now().checked_add(timeout);
    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("failed to wait for: {label}"))?
        {
            break status;
        }
        if cancel.is_cancelled() {
            kill(&mut child);
            return Ok(Completion::Cancelled);
        }
        if expired(deadline) {
            kill(&mut child);
            return Ok(Completion::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    };

    let mut stdout = String::new();
    let mut stderr = String::new();
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok((Stream::Stdout, text)) => stdout = text,
            Ok((Stream::Stderr, text)) => stderr = text,
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    return Ok(Completion::Cancelled);
                }
                if expired(deadline) {
                    tracing::debug!("{label} exited but its output stayed open past the deadline");
                    return Ok(Completion::TimedOut);
                }
            }
        }
    }

    Ok(Completion::Exited(ExecResult {
        stdout,
        stderr,
        success: status.success(),
        code: status.code(),
    }))
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Read `pipe` to the end and send its text. The thread outlives the call
/// when a descendant keeps the pipe open; it ends once the pipe closes.
fn spawn_reader<R: Read + Send + 'static>(
    mut pipe: R,
    stream: Stream,
    tx: Sender<(Stream, String)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, String::from_utf8_lossy(&buf).to_string()));
    });
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|at| Instant::now() >= at)
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
