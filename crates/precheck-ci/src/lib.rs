//! precheck CI - local pre-commit checks
//!
//! Runs the checks a remote CI pipeline would, in order, stopping at the
//! first failure:
//! - Formatter (check only, or rewrite with `fix`)
//! - Linter (soft [`LintOutcome`], hard error on abnormal termination)
//! - Static type checker
//! - Unit tests with 100% coverage enforced
//!
//! All steps run against the project root, found by walking up from the
//! starting directory to the nearest marker file (`pyproject.toml` by default).

pub mod error;
pub mod fakes;
pub mod pipeline;
pub mod progress;
pub mod root;
pub mod runner;
pub mod stage;
pub mod steps;
pub mod telemetry;

// Re-export key types
pub use error::{CheckError, ProcessError, Result};
pub use pipeline::{Check, CheckReport, StepReport, StepStatus};
pub use progress::{Progress, SilentProgress, TerminalProgress};
pub use root::find_project_root;
pub use runner::{Invocation, ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use stage::{Step, Toolchain, COVERAGE_FAIL_UNDER};
pub use steps::{
    check_format, check_types, lint, run_unit_tests_and_coverage, CheckSteps, LintOutcome,
    ToolSteps,
};
pub use telemetry::init_tracing;
