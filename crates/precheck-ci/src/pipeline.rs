//! Check pipeline orchestration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CheckError, Result};
use crate::progress::{Progress, TerminalProgress};
use crate::root::find_project_root;
use crate::stage::{Step, Toolchain};
use crate::steps::{CheckSteps, ToolSteps};

/// Final state of one step in a successful run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Skipped,
}

/// Per-step entry of a [`CheckReport`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub status: StepStatus,
    pub duration_ms: u64,
}

/// Summary of a run in which every enabled step passed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckReport {
    /// Resolved project root every step ran against.
    pub root: PathBuf,

    /// Whether tools were allowed to rewrite files.
    pub fix: bool,

    /// Steps in execution order.
    pub steps: Vec<StepReport>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl CheckReport {
    /// Number of steps that ran and passed.
    pub fn passed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Passed)
            .count()
    }
}

/// Runs format, lint, type-check and test steps against a project root,
/// stopping at the first failure.
///
/// The root is passed to every step; the process working directory is never
/// changed, so concurrent runs in one process do not interfere.
pub struct Check {
    steps: Arc<dyn CheckSteps>,
    progress: Arc<dyn Progress>,
    marker: String,
    skipped: BTreeSet<Step>,
}

impl Check {
    /// Pipeline backed by the real tools, reporting progress to the terminal.
    pub fn new(toolchain: Toolchain) -> Self {
        let marker = toolchain.marker.clone();
        Self {
            steps: Arc::new(ToolSteps::new(toolchain)),
            progress: Arc::new(TerminalProgress),
            marker,
            skipped: BTreeSet::new(),
        }
    }

    /// Replace the step implementations.
    pub fn with_steps(mut self, steps: Arc<dyn CheckSteps>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Do not run `step`; it is reported as skipped.
    pub fn skip(mut self, step: Step) -> Self {
        self.skipped.insert(step);
        self
    }

    /// Run the pipeline.
    ///
    /// `directory` defaults to the current working directory; the project
    /// root is the nearest ancestor containing the marker file.
    pub async fn run(&self, directory: Option<&Path>, fix: bool) -> Result<CheckReport> {
        let start_dir = match directory {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let root = find_project_root(&start_dir, &self.marker)?;

        let start = Instant::now();
        info!(root = %root.display(), fix, "Starting check pipeline");

        let mut reports = Vec::with_capacity(Step::ALL.len());
        for step in Step::ALL {
            if self.skipped.contains(&step) {
                info!(step = %step, "Skipping step");
                self.progress.skipped(step);
                reports.push(StepReport {
                    step,
                    status: StepStatus::Skipped,
                    duration_ms: 0,
                });
                continue;
            }

            self.progress.started(step);
            let step_start = Instant::now();
            let result = self.run_step(step, &root, fix).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;
            self.progress.finished(step, result.is_ok());

            if let Err(err) = result {
                warn!(step = %step, duration_ms, "Step failed; aborting pipeline");
                return Err(err);
            }
            info!(step = %step, duration_ms, "Step passed");
            reports.push(StepReport {
                step,
                status: StepStatus::Passed,
                duration_ms,
            });
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(root = %root.display(), duration_ms, "Check pipeline passed");

        Ok(CheckReport {
            root,
            fix,
            steps: reports,
            duration_ms,
        })
    }

    async fn run_step(&self, step: Step, root: &Path, fix: bool) -> Result<()> {
        match step {
            Step::Format => self.steps.check_format(root, fix).await,
            Step::Lint => {
                let outcome = self.steps.lint(root, fix).await?;
                if outcome.passed {
                    Ok(())
                } else {
                    Err(CheckError::LintFailure {
                        output: outcome.output,
                    })
                }
            }
            Step::TypeCheck => self.steps.check_types(root).await,
            Step::Tests => self.steps.run_unit_tests_and_coverage(root).await,
        }
    }
}
