//! The four check steps and the seam the pipeline calls them through.

pub mod coverage;
pub mod format;
pub mod lint;
pub mod type_check;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::runner::{ProcessRunner, TokioProcessRunner};
use crate::stage::Toolchain;

pub use coverage::run_unit_tests_and_coverage;
pub use format::check_format;
pub use lint::{lint, LintOutcome};
pub use type_check::check_types;

/// Step implementations used by [`Check`](crate::pipeline::Check).
///
/// Every operation receives the resolved project root explicitly.
#[async_trait]
pub trait CheckSteps: Send + Sync {
    async fn check_format(&self, root: &Path, fix: bool) -> Result<()>;

    async fn lint(&self, root: &Path, fix: bool) -> Result<LintOutcome>;

    async fn check_types(&self, root: &Path) -> Result<()>;

    async fn run_unit_tests_and_coverage(&self, root: &Path) -> Result<()>;
}

/// Steps that shell out to the configured [`Toolchain`].
#[derive(Clone)]
pub struct ToolSteps {
    runner: Arc<dyn ProcessRunner>,
    toolchain: Toolchain,
}

impl ToolSteps {
    pub fn new(toolchain: Toolchain) -> Self {
        Self::with_runner(Arc::new(TokioProcessRunner), toolchain)
    }

    pub fn with_runner(runner: Arc<dyn ProcessRunner>, toolchain: Toolchain) -> Self {
        Self { runner, toolchain }
    }
}

#[async_trait]
impl CheckSteps for ToolSteps {
    async fn check_format(&self, root: &Path, fix: bool) -> Result<()> {
        format::check_format(self.runner.as_ref(), &self.toolchain, root, fix).await
    }

    async fn lint(&self, root: &Path, fix: bool) -> Result<LintOutcome> {
        lint::lint(self.runner.as_ref(), &self.toolchain, root, fix).await
    }

    async fn check_types(&self, root: &Path) -> Result<()> {
        type_check::check_types(self.runner.as_ref(), &self.toolchain, root).await
    }

    async fn run_unit_tests_and_coverage(&self, root: &Path) -> Result<()> {
        coverage::run_unit_tests_and_coverage(self.runner.as_ref(), &self.toolchain, root).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedProcessRunner;

    #[tokio::test]
    async fn test_tool_steps_use_injected_runner_and_toolchain() {
        let runner = Arc::new(ScriptedProcessRunner::new());
        let toolchain = Toolchain {
            runner: "poetry".to_string(),
            type_checker: "mypy".to_string(),
            ..Toolchain::default()
        };
        let steps = ToolSteps::with_runner(runner.clone(), toolchain);
        let root = Path::new("/repo");

        steps.check_format(root, false).await.unwrap();
        let outcome = steps.lint(root, false).await.unwrap();
        steps.check_types(root).await.unwrap();
        steps.run_unit_tests_and_coverage(root).await.unwrap();

        assert!(outcome.passed);
        let commands: Vec<String> = runner.calls().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            commands,
            vec![
                "poetry run ruff format --check /repo",
                "poetry run ruff check /repo",
                "poetry run mypy /repo",
                "poetry run pytest --cov --cov-fail-under=100 -q /repo",
            ]
        );
    }
}
