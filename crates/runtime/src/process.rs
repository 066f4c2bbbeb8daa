//! Subprocess helper with captured output and an optional wall-clock limit.

use crate::error::ProcessError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Kill the child once this much wall time has elapsed. `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,
}

impl ProcessOptions {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub fn run_captured<S: AsRef<str>>(
    program: &str,
    args: &[S],
    options: &ProcessOptions,
) -> Result<ProcessOutput, ProcessError> {
    let argv: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    debug!(program, args = ?argv, "spawning process");

    let mut command = Command::new(program);
    command.args(&argv);

    let Some(timeout) = options.timeout else {
        let output = command.output().map_err(|source| ProcessError::Launch {
            program: program.to_string(),
            source,
        })?;
        return Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    };

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Launch {
            program: program.to_string(),
            source,
        })?;

    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let (status, timed_out) =
        wait_with_timeout(&mut child, timeout).map_err(|source| ProcessError::Wait {
            program: program.to_string(),
            source,
        })?;

    let stdout = join_reader(stdout);
    let stderr = join_reader(stderr);

    if timed_out {
        return Err(ProcessError::TimedOut {
            program: program.to_string(),
            timeout_ms: timeout.as_millis(),
        });
    }
    Ok(ProcessOutput {
        code: status.code(),
        stdout,
        stderr,
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<(ExitStatus, bool)> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let status = child.wait()?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
