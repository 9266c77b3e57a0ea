// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Subprocess execution runner for example scripts

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{CadexError, IoContext, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for pipe readers after a timed-out script was killed
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// How a script run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    /// Non-zero exit; `None` when terminated by a signal
    Failed(Option<i32>),
    TimedOut,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

/// Captured output of a script run
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Runner for executing scripts with an interpreter
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: String,
    timeout: Option<Duration>,
}

impl ScriptRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(interpreter: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check if the interpreter can be started
    pub fn is_available(&self) -> bool {
        Command::new(&self.interpreter)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// Fail with `InterpreterUnavailable` unless the interpreter can be started
    pub fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(CadexError::InterpreterUnavailable(self.interpreter.clone()))
        }
    }

    /// Run `<interpreter> <script>` and capture its output
    pub fn run(&self, script: &Path) -> Result<ScriptOutput> {
        let start = Instant::now();

        let mut command = Command::new(&self.interpreter);
        command
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a timeout also reaches processes the script started
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    CadexError::InterpreterUnavailable(self.interpreter.clone())
                }
                _ => CadexError::io(script, e),
            })?;

        // Drain both pipes on their own threads so a chatty script cannot
        // block on a full pipe while we wait for it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait(&mut child, script)?;
        let duration = start.elapsed();

        // Descendants of the script may still hold the pipes open
        let grace = match status {
            RunStatus::TimedOut => Some(DRAIN_GRACE),
            _ => self
                .timeout
                .map(|t| t.saturating_sub(duration).max(DRAIN_GRACE)),
        };
        let output = ScriptOutput {
            status,
            stdout: collect(stdout, grace),
            stderr: collect(stderr, grace),
            duration,
        };

        debug!(
            script = %script.display(),
            status = ?output.status,
            elapsed_ms = duration.as_millis() as u64,
            "script finished"
        );

        Ok(output)
    }

    fn wait(&self, child: &mut Child, script: &Path) -> Result<RunStatus> {
        let Some(timeout) = self.timeout else {
            let status = child.wait().with_path(script)?;
            return Ok(exit_status(status));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().with_path(script)? {
                return Ok(exit_status(status));
            }

            if Instant::now() >= deadline {
                warn!(script = %script.display(), ?timeout, "script timed out, killing");
                kill_group(child);
                child.wait().with_path(script)?;
                return Ok(RunStatus::TimedOut);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn exit_status(status: ExitStatus) -> RunStatus {
    if status.success() {
        RunStatus::Success
    } else {
        RunStatus::Failed(status.code())
    }
}

/// Kill the script and its process group. Either may already be gone.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        // A negative id addresses the whole group led by the script
        let group = format!("-{}", child.id());
        let _ = Command::new("kill")
            .args(["-KILL", "--", group.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    let _ = child.kill();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<String>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
        rx
    })
}

/// Output of a pipe reader, waiting at most `grace` when set
fn collect(reader: Option<Receiver<String>>, grace: Option<Duration>) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    match grace {
        Some(grace) => reader.recv_timeout(grace).unwrap_or_default(),
        None => reader.recv().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_creation() {
        let runner = ScriptRunner::new("python3");
        assert_eq!(runner.interpreter(), "python3");
        assert!(runner.timeout().is_none());
    }

    #[test]
    fn test_missing_interpreter() {
        let runner = ScriptRunner::new("cadex-no-such-interpreter");
        assert!(!runner.is_available());
        assert!(matches!(
            runner.ensure_available(),
            Err(CadexError::InterpreterUnavailable(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("a.py");
        std::fs::write(&script, "print(1)").unwrap();
        assert!(matches!(
            runner.run(&script),
            Err(CadexError::InterpreterUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("ok.sh");
        std::fs::write(&ok, "echo 48000.0\necho oops >&2\n").unwrap();
        let failing = dir.path().join("fail.sh");
        std::fs::write(&failing, "exit 3\n").unwrap();

        let runner = ScriptRunner::new("sh");
        let output = runner.run(&ok).unwrap();
        assert_eq!(output.status, RunStatus::Success);
        assert_eq!(output.stdout.trim(), "48000.0");
        assert_eq!(output.stderr.trim(), "oops");

        let output = runner.run(&failing).unwrap();
        assert_eq!(output.status, RunStatus::Failed(Some(3)));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_script() {
        let dir = tempfile::tempdir().unwrap();
        let slow = dir.path().join("slow.sh");
        std::fs::write(&slow, "exec sleep 5\n").unwrap();

        let runner = ScriptRunner::with_timeout("sh", Some(Duration::from_millis(200)));
        let output = runner.run(&slow).unwrap();
        assert_eq!(output.status, RunStatus::TimedOut);
        assert!(output.duration < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_reaches_child_processes() {
        let dir = tempfile::tempdir().unwrap();
        let slow = dir.path().join("nested.sh");
        std::fs::write(&slow, "sleep 4\necho done\n").unwrap();

        let runner = ScriptRunner::with_timeout("sh", Some(Duration::from_millis(200)));
        let start = Instant::now();
        let output = runner.run(&slow).unwrap();

        assert_eq!(output.status, RunStatus::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!output.stdout.contains("done"));
    }

    #[cfg(unix)]
    #[test]
    fn test_background_process_does_not_block_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bg.sh");
        std::fs::write(&script, "sleep 4 &\necho 7.5\n").unwrap();

        let runner = ScriptRunner::with_timeout("sh", Some(Duration::from_millis(500)));
        let start = Instant::now();
        let output = runner.run(&script).unwrap();

        assert_eq!(output.status, RunStatus::Success);
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
