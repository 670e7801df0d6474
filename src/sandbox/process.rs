//! Process executor
//!
//! Runs one external command inside a working directory under a wall-clock
//! budget. Every outcome, including spawn failures and timeouts, is folded into an
//! [`ExecutionResult`]; this module never returns an error.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tracing::{debug, warn};

/// Output reported for a command that exceeded its budget
pub const TIMEOUT_MARKER: &str = "Command execution timed out";

const READ_CHUNK: usize = 8 * 1024;

/// Result of running one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code was zero
    pub success: bool,
    /// Merged stdout/stderr (trimmed), the spawn error, or [`TIMEOUT_MARKER`]
    pub output: String,
    /// Exit code, when the process exited on its own
    pub exit_code: Option<i32>,
    /// Killed because the budget ran out
    pub timed_out: bool,
    /// Wall-clock time spent
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl ExecutionResult {
    /// Result of a process that exited on its own
    pub fn exited(exit_code: Option<i32>, raw_output: &[u8], duration: Duration) -> Self {
        ExecutionResult {
            success: exit_code == Some(0),
            output: String::from_utf8_lossy(raw_output).trim().to_string(),
            exit_code,
            timed_out: false,
            duration,
        }
    }

    /// Result of a process that could not be started or waited on
    pub fn error(message: impl Into<String>, duration: Duration) -> Self {
        ExecutionResult {
            success: false,
            output: message.into(),
            exit_code: None,
            timed_out: false,
            duration,
        }
    }

    /// Result of a process killed at its deadline
    pub fn timeout(duration: Duration) -> Self {
        ExecutionResult {
            success: false,
            output: TIMEOUT_MARKER.to_string(),
            exit_code: None,
            timed_out: true,
            duration,
        }
    }
}

/// Run `program args...` in `working_dir`, killing it once `timeout` elapses.
pub async fn run_command(
    program: &str,
    args: &[String],
    working_dir: &Path,
    timeout: Duration,
) -> ExecutionResult {
    debug!(
        "Running `{} {}` (cwd: {}, timeout: {:?})",
        program,
        args.join(" "),
        working_dir.display(),
        timeout
    );

    let start = Instant::now();

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!("Failed to spawn {}: {}", program, e);
            return ExecutionResult::error(e.to_string(), start.elapsed());
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let run = async {
        let output = read_merged(stdout, stderr).await;
        let status = child.wait().await;
        (output, status)
    };
    let outcome = tokio::time::timeout(timeout, run).await;

    match outcome {
        Ok((output, Ok(status))) => {
            let result = ExecutionResult::exited(status.code(), &output, start.elapsed());
            if !result.success {
                debug!("{} exited with {:?}", program, status.code());
            }
            result
        }
        Ok((_, Err(e))) => ExecutionResult::error(format!("Process error: {}", e), start.elapsed()),
        Err(_) => {
            warn!("`{} {}` timed out after {:?}", program, args.join(" "), timeout);
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill timed out process: {}", e);
            }
            // Reap so the killed child does not linger as a zombie
            if let Err(e) = child.wait().await {
                warn!("Failed to reap timed out process: {}", e);
            }
            ExecutionResult::timeout(start.elapsed())
        }
    }
}

/// Drain both pipes into one buffer, in the order chunks arrive.
async fn read_merged(mut stdout: Option<ChildStdout>, mut stderr: Option<ChildStderr>) -> Vec<u8> {
    let mut merged = Vec::new();
    let mut out_buf = vec![0u8; READ_CHUNK];
    let mut err_buf = vec![0u8; READ_CHUNK];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match read {
                Some(n) => merged.extend_from_slice(&out_buf[..n]),
                None => stdout = None,
            },
            read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match read {
                Some(n) => merged.extend_from_slice(&err_buf[..n]),
                None => stderr = None,
            },
        }
    }

    merged
}

/// `None` on EOF or read error.
async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut Option<R>, buf: &mut [u8]) -> Option<usize> {
    let reader = reader.as_mut()?;
    match reader.read(buf).await {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}
