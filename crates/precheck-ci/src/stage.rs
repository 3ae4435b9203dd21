//! Check steps and the toolchain that drives them.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runner::Invocation;

/// Minimum statement coverage, in percent, the test step enforces.
pub const COVERAGE_FAIL_UNDER: u8 = 100;

/// The four pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// `<formatter> format [--check]`
    Format,

    /// `<linter> check [--fix]`
    Lint,

    /// `<type_checker>`
    #[serde(rename = "types")]
    TypeCheck,

    /// `<test_tool> --cov --cov-fail-under=100 -q`
    Tests,
}

impl Step {
    /// All steps in pipeline order.
    pub const ALL: [Step; 4] = [Step::Format, Step::Lint, Step::TypeCheck, Step::Tests];

    /// Short machine name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Format => "format",
            Step::Lint => "lint",
            Step::TypeCheck => "types",
            Step::Tests => "tests",
        }
    }

    /// Human-readable progress label.
    pub fn label(&self) -> &'static str {
        match self {
            Step::Format => "Formatter",
            Step::Lint => "Linter",
            Step::TypeCheck => "Type checks",
            Step::Tests => "Tests + Coverage",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "format" | "fmt" => Ok(Step::Format),
            "lint" => Ok(Step::Lint),
            "types" | "type_check" | "typecheck" => Ok(Step::TypeCheck),
            "tests" | "test" | "coverage" => Ok(Step::Tests),
            other => Err(format!(
                "unknown step `{}` (expected one of: format, lint, types, tests)",
                other
            )),
        }
    }
}

/// External programs used by each step.
///
/// Every tool is launched through `runner` as `<runner> run <tool> ...` so the
/// project's own environment provides it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Toolchain {
    /// Project/package manager that launches each tool.
    pub runner: String,

    /// Formatter program (`format` subcommand).
    pub formatter: String,

    /// Linter program (`check` subcommand).
    pub linter: String,

    /// Static type checker program.
    pub type_checker: String,

    /// Test runner with a coverage plugin.
    pub test_tool: String,

    /// File whose presence marks the project root.
    pub marker: String,

    /// Per-process timeout in seconds (`None` waits forever).
    pub timeout_secs: Option<u64>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            runner: "uv".to_string(),
            formatter: "ruff".to_string(),
            linter: "ruff".to_string(),
            type_checker: "pyright".to_string(),
            test_tool: "pytest".to_string(),
            marker: "pyproject.toml".to_string(),
            timeout_secs: None,
        }
    }
}

impl Toolchain {
    fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn tool(&self, root: &Path, program: &str) -> Invocation {
        Invocation::new(&self.runner)
            .args(["run", program])
            .cwd(root)
            .timeout(self.timeout())
    }

    /// Formatter invocation: rewrite in place when `fix`, otherwise check only.
    pub fn format_command(&self, root: &Path, fix: bool) -> Invocation {
        let mut invocation = self.tool(root, &self.formatter).arg("format");
        if !fix {
            invocation = invocation.arg("--check");
        }
        invocation.path_arg(root)
    }

    pub fn lint_command(&self, root: &Path, fix: bool) -> Invocation {
        let mut invocation = self.tool(root, &self.linter).arg("check");
        if fix {
            invocation = invocation.arg("--fix");
        }
        invocation.path_arg(root)
    }

    pub fn type_check_command(&self, root: &Path) -> Invocation {
        self.tool(root, &self.type_checker).path_arg(root)
    }

    /// Test run with coverage enforced, so tests execute only once.
    pub fn test_command(&self, root: &Path) -> Invocation {
        self.tool(root, &self.test_tool)
            .args([
                "--cov".to_string(),
                format!("--cov-fail-under={}", COVERAGE_FAIL_UNDER),
                "-q".to_string(),
            ])
            .path_arg(root)
    }
}
