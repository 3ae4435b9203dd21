//! External program execution with captured output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ProcessError;

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name or path.
    pub program: String,

    /// Arguments, in order.
    pub args: Vec<String>,

    /// Working directory for the child (inherits ours when `None`).
    pub cwd: Option<PathBuf>,

    /// Kill the child and fail if it runs longer than this.
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument (lossy on non-UTF-8 paths).
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (0 = success, -1 when terminated by a signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ProcessOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external programs.
///
/// Implementations must return `Ok` for any process that ran to completion,
/// whatever its exit code. Only failures to start, wait on, or bound the
/// process are errors.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError> {
        if invocation.program.is_empty() {
            return Err(ProcessError::EmptyCommand);
        }

        debug!(command = %invocation, cwd = ?invocation.cwd, "Spawning process");
        let start = Instant::now();

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let waited = match invocation.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| ProcessError::TimedOut {
                    program: invocation.program.clone(),
                    timeout_secs: timeout.as_secs(),
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|source| ProcessError::Wait {
            program: invocation.program.clone(),
            source,
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(command = %invocation, exit_code, duration_ms, "Process exited");

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        })
    }
}
