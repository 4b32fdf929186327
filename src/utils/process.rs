use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::ToolError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run `cmd` to completion and return its standard output.
///
/// Stdout is always piped; stdin and stderr are whatever the caller set on
/// `cmd`. The whole call, including reading stdout to the end, is bounded by
/// `timeout`: the child is killed once it elapses, and a background process
/// still holding the pipe open is abandoned. A non-zero exit is an error.
pub fn run_with_timeout(
    mut cmd: Command,
    tool: &'static str,
    timeout: Duration,
) -> Result<Vec<u8>, ToolError> {
    cmd.stdout(Stdio::piped());
    debug!("Running {}: {:?}", tool, cmd);

    let deadline = Instant::now() + timeout;
    let mut child = cmd
        .spawn()
        .map_err(|source| ToolError::Launch { tool, source })?;

    // Drain stdout on a separate thread so a chatty child cannot block on a
    // full pipe while we wait for it.
    let mut stdout = child.stdout.take();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match stdout.as_mut() {
            Some(out) => out.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        // The receiver is gone if the deadline already passed.
        let _ = tx.send(result);
    });

    let status = wait_until(&mut child, tool, deadline, timeout)?;

    let remaining = deadline.saturating_duration_since(Instant::now());
    let output = match rx.recv_timeout(remaining) {
        Ok(result) => result.map_err(|source| ToolError::Io { tool, source })?,
        Err(RecvTimeoutError::Timeout) => {
            warn!("{} exited but its output stayed open past {:?}", tool, timeout);
            return Err(ToolError::Timeout { tool, timeout });
        }
        Err(RecvTimeoutError::Disconnected) => {
            return Err(ToolError::Io {
                tool,
                source: std::io::Error::other("stdout reader thread panicked"),
            });
        }
    };

    if !status.success() {
        return Err(ToolError::Failed { tool, status });
    }

    Ok(output)
}

fn wait_until(
    child: &mut Child,
    tool: &'static str,
    deadline: Instant,
    timeout: Duration,
) -> Result<ExitStatus, ToolError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                warn!("{} exceeded {:?}, killing it", tool, timeout);
                kill(child, tool);
                return Err(ToolError::Timeout { tool, timeout });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => return Err(ToolError::Io { tool, source }),
        }
    }
}

fn kill(child: &mut Child, tool: &'static str) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill {} (pid {}): {}", tool, child.id(), e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap {} (pid {}): {}", tool, child.id(), e);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_captures_stdout() {
        let out = run_with_timeout(sh("printf 'apple [x]\\n'"), "sh", Duration::from_secs(5)).unwrap();
        assert_eq!(out, b"apple [x]\n");
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let err = run_with_timeout(sh("exit 3"), "sh", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ToolError::Failed { tool: "sh", .. }));
    }

    #[test]
    fn test_timeout_kills_child() {
        let started = Instant::now();
        let err = run_with_timeout(sh("sleep 5"), "sh", Duration::from_millis(200)).unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_covers_output_held_open_by_background_process() {
        let started = Instant::now();
        let err = run_with_timeout(sh("sleep 4 & echo hi"), "sh", Duration::from_millis(300))
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let cmd = Command::new("definitely-not-an-installed-tool-4711");
        let err = run_with_timeout(cmd, "missing", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
        assert_eq!(err.tool(), "missing");
    }
}
