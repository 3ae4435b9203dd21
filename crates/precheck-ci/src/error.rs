//! Error taxonomy for precheck runs.

use std::path::PathBuf;

use crate::stage::Step;

/// Failures raised while spawning or waiting on an external program.
///
/// A non-zero exit status is never a `ProcessError`; it is reported through
/// [`ProcessOutput::exit_code`](crate::runner::ProcessOutput::exit_code).
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("invocation has an empty program name")]
    EmptyCommand,

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {timeout_secs} seconds")]
    TimedOut { program: String, timeout_secs: u64 },
}

/// Terminal failures of a check run. Each aborts the remaining steps.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Could not find `{marker}` in {} or any parent directories.", .start.display())]
    ProjectRootNotFound { start: PathBuf, marker: String },

    #[error("Format check failed. stdout: `{stdout}` stderr: `{stderr}`")]
    FormatCheck { stdout: String, stderr: String },

    #[error("linting failed with an unexpected error. stdout: `{stdout}` stderr: `{stderr}`")]
    Lint { stdout: String, stderr: String },

    #[error("Linting failed, aborting commit. Output:\n{output}")]
    LintFailure { output: String },

    #[error("Type check failed. stdout: `{stdout}` stderr: `{stderr}`")]
    TypeCheck { stdout: String, stderr: String },

    #[error("Tests or coverage failed. stdout: `{stdout}` stderr: `{stderr}`")]
    CoverageOrTests { stdout: String, stderr: String },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckError {
    /// The step this failure was raised by, if it came from one.
    pub fn step(&self) -> Option<Step> {
        match self {
            CheckError::FormatCheck { .. } => Some(Step::Format),
            CheckError::Lint { .. } | CheckError::LintFailure { .. } => Some(Step::Lint),
            CheckError::TypeCheck { .. } => Some(Step::TypeCheck),
            CheckError::CoverageOrTests { .. } => Some(Step::Tests),
            CheckError::ProjectRootNotFound { .. }
            | CheckError::Process(_)
            | CheckError::Io(_) => None,
        }
    }
}

/// Result type for check operations.
pub type Result<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_names_start_and_marker() {
        let err = CheckError::ProjectRootNotFound {
            start: PathBuf::from("/tmp/somewhere"),
            marker: "pyproject.toml".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Could not find `pyproject.toml`"));
        assert!(msg.contains("/tmp/somewhere"));
    }

    #[test]
    fn test_step_errors_embed_streams() {
        let err = CheckError::TypeCheck {
            stdout: "1 error".to_string(),
            stderr: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Type check failed."));
        assert!(msg.contains("stdout: `1 error`"));
        assert!(msg.contains("stderr: `boom`"));
    }

    #[test]
    fn test_lint_failure_message() {
        let err = CheckError::LintFailure {
            output: "stdout: F821 undefined_var\nstderr: ".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Linting failed, aborting commit. Output:\n"));
        assert!(msg.contains("undefined_var"));
    }

    #[test]
    fn test_step_mapping() {
        let lint = CheckError::Lint {
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(lint.step(), Some(Step::Lint));

        let process = CheckError::Process(ProcessError::EmptyCommand);
        assert_eq!(process.step(), None);
    }

    #[test]
    fn test_timed_out_display() {
        let err = ProcessError::TimedOut {
            program: "uv".to_string(),
            timeout_secs: 30,
        };
        assert_eq!(err.to_string(), "`uv` timed out after 30 seconds");
    }
}
