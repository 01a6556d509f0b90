//! Low-level command execution with a bounded wait

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::error::HostError;

/// Default timeout for a single probe command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for collecting output from child process pipes
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum captured size per output stream (10MB)
const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Captured result of one command run on a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    /// Whether the command was killed for exceeding its timeout
    pub timed_out: bool,
}

impl CommandOutput {
    /// Build an output for a command that ran to completion
    pub fn completed(
        command: impl Into<String>,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
            timed_out: false,
        }
    }

    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Non-empty, trimmed stdout lines
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(str::trim).filter(|l| !l.is_empty())
    }

    /// One-line description of how the command ended
    pub fn summary(&self) -> String {
        if self.timed_out {
            return format!("timed out after {}ms", self.duration.as_millis());
        }
        let code = self
            .exit_code
            .map_or_else(|| "none".to_string(), |c| c.to_string());
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("exit code {code}")
        } else {
            format!("exit code {code}: {stderr}")
        }
    }
}

/// Run a prepared command, killing it if it outlives `timeout`.
///
/// `label` is the human-readable command recorded in the output and logs;
/// the transport wrapping (ssh, docker exec) is not part of it. The command
/// runs in its own process group so a timeout also reaps anything it forked.
pub fn run_with_timeout(
    mut cmd: Command,
    label: &str,
    timeout: Duration,
) -> Result<CommandOutput, HostError> {
    debug!(command = %label, timeout_secs = timeout.as_secs(), "running probe");
    let start = Instant::now();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);

    let mut child = cmd.spawn().map_err(|source| HostError::Spawn {
        command: label.to_string(),
        source,
    })?;

    // Drain the pipes while waiting, otherwise a chatty child blocks on a
    // full pipe buffer and never exits.
    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());

    let wait_result = child.wait_timeout(timeout).map_err(|source| HostError::Wait {
        command: label.to_string(),
        source,
    })?;

    let status = match wait_result {
        Some(status) => Some(status),
        None => {
            warn!(command = %label, "probe timed out, killing its process group");
            kill_process_group(&mut child);
            None
        }
    };

    // Both streams share one deadline
    let deadline = Instant::now() + OUTPUT_COLLECTION_TIMEOUT;
    let stdout = collect(&stdout_rx, deadline);
    let stderr = collect(&stderr_rx, deadline);
    let duration = start.elapsed();

    let output = CommandOutput {
        command: label.to_string(),
        exit_code: status.and_then(|s| s.code()),
        stdout,
        stderr,
        duration,
        timed_out: status.is_none(),
    };
    debug!(
        command = %label,
        exit_code = ?output.exit_code,
        elapsed_ms = duration.as_millis() as u64,
        "probe finished"
    );
    Ok(output)
}

fn collect(rx: &mpsc::Receiver<String>, deadline: Instant) -> String {
    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
        .unwrap_or_else(|_| "[output collection timed out]".to_string())
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(stream) => {
            thread::spawn(move || {
                let _ = tx.send(read_stream_to_string(stream));
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

/// Read a stream to string, keeping at most MAX_OUTPUT_SIZE bytes.
///
/// The remainder is drained and discarded so the writer never sees a broken
/// pipe.
fn read_stream_to_string<R: Read>(mut stream: R) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let remaining = MAX_OUTPUT_SIZE.saturating_sub(buf.len());
                let to_copy = n.min(remaining);
                buf.extend_from_slice(&chunk[..to_copy]);
                if to_copy < n {
                    let mut discard = [0u8; 8192];
                    while stream.read(&mut discard).unwrap_or(0) > 0 {}
                    buf.extend_from_slice(b"\n[output truncated at 10MB]");
                    break;
                }
            }
            Err(_) => {
                if buf.is_empty() {
                    return "[error reading output]".to_string();
                }
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

/// Kill the child and everything it spawned.
///
/// The child leads its own group (`process_group(0)`), so its pid is the
/// group id. Falls back to killing the child alone if the group is gone.
fn kill_process_group(child: &mut Child) {
    let killed = i32::try_from(child.id())
        .ok()
        .is_some_and(|pgid| killpg(Pid::from_raw(pgid), Signal::SIGKILL).is_ok());
    if !killed {
        // The process may already be gone
        let _ = child.kill();
    }
    let _ = child.wait();
}
