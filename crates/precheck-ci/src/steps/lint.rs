//! Linter step.
//!
//! Ordinary lint findings come back as a [`LintOutcome`]; only an abnormal
//! linter termination (exit code 2: bad configuration, bad CLI options or an
//! internal error) is a [`CheckError::Lint`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CheckError, Result};
use crate::runner::{ProcessOutput, ProcessRunner};
use crate::stage::Toolchain;

/// Exit code the linter uses for abnormal termination.
const FATAL_EXIT_CODE: i32 = 2;

/// Result of a lint run that terminated normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintOutcome {
    /// No violations remain and no warnings were printed.
    pub passed: bool,

    /// Labelled stdout and stderr, for inclusion in error messages.
    pub output: String,
}

impl LintOutcome {
    /// Classify a finished linter process.
    ///
    /// The linter has no dedicated exit code for warnings, so any "warning"
    /// on stderr (case-insensitive) fails the outcome even on exit code 0.
    pub fn classify(output: ProcessOutput) -> Result<Self> {
        if output.exit_code == FATAL_EXIT_CODE {
            return Err(CheckError::Lint {
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        let warnings_present = output.stderr.to_lowercase().contains("warning");
        let passed = output.exit_code == 0 && !warnings_present;

        Ok(Self {
            passed,
            output: format!("stdout: {}\nstderr: {}", output.stdout, output.stderr),
        })
    }
}

/// Run the linter over `root`, applying safe fixes when `fix` is set.
pub async fn lint(
    runner: &dyn ProcessRunner,
    toolchain: &Toolchain,
    root: &Path,
    fix: bool,
) -> Result<LintOutcome> {
    let output = runner.run(&toolchain.lint_command(root, fix)).await?;
    LintOutcome::classify(output)
}
