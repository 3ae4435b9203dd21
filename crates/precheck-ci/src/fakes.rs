//! In-memory fakes for the runner, step and progress seams (testing only)
//!
//! Provides `ScriptedProcessRunner`, `StubSteps` and `RecordingProgress`,
//! which let the pipeline be exercised without any external tools installed.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CheckError, ProcessError, Result};
use crate::progress::Progress;
use crate::runner::{Invocation, ProcessOutput, ProcessRunner};
use crate::stage::Step;
use crate::steps::{CheckSteps, LintOutcome};

// ---------------------------------------------------------------------------
// ScriptedProcessRunner
// ---------------------------------------------------------------------------

/// Process runner that replays queued results and records every invocation.
///
/// Once the queue is empty, every call succeeds with exit code 0 and no output.
#[derive(Debug, Default)]
pub struct ScriptedProcessRunner {
    responses: Mutex<VecDeque<std::result::Result<ProcessOutput, ProcessError>>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a finished process.
    pub fn push_output(&self, exit_code: i32, stdout: &str, stderr: &str) {
        self.responses.lock().unwrap().push_back(Ok(ProcessOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            duration_ms: 0,
        }));
    }

    /// Queue a process that could not be run.
    pub fn push_error(&self, err: ProcessError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Invocations seen so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedProcessRunner {
    async fn run(&self, invocation: &Invocation) -> std::result::Result<ProcessOutput, ProcessError> {
        self.calls.lock().unwrap().push(invocation.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ProcessOutput {
                    exit_code: 0,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration_ms: 0,
                })
            })
    }
}

// ---------------------------------------------------------------------------
// StubSteps
// ---------------------------------------------------------------------------

type ErrorFactory = Box<dyn Fn() -> CheckError + Send + Sync>;

/// Step implementation that passes by default and records what was called.
#[derive(Default)]
pub struct StubSteps {
    failures: HashMap<Step, ErrorFactory>,
    lint_outcome: Option<LintOutcome>,
    invocations: Mutex<Vec<(Step, PathBuf, bool)>>,
}

impl StubSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `step` fail with the error built by `make`.
    pub fn fail_with(
        mut self,
        step: Step,
        make: impl Fn() -> CheckError + Send + Sync + 'static,
    ) -> Self {
        self.failures.insert(step, Box::new(make));
        self
    }

    /// Outcome returned by `lint` (passing with empty output by default).
    pub fn lint_outcome(mut self, outcome: LintOutcome) -> Self {
        self.lint_outcome = Some(outcome);
        self
    }

    /// Steps called so far, in order.
    pub fn calls(&self) -> Vec<Step> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|(step, _, _)| *step)
            .collect()
    }

    /// `(root, fix)` pairs seen by each call. Steps without a fix flag record `false`.
    pub fn invocations(&self) -> Vec<(PathBuf, bool)> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|(step, _, _)| matches!(step, Step::Format | Step::Lint))
            .map(|(_, root, fix)| (root.clone(), *fix))
            .collect()
    }

    fn record(&self, step: Step, root: &Path, fix: bool) -> Result<()> {
        self.invocations
            .lock()
            .unwrap()
            .push((step, root.to_path_buf(), fix));
        match self.failures.get(&step) {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CheckSteps for StubSteps {
    async fn check_format(&self, root: &Path, fix: bool) -> Result<()> {
        self.record(Step::Format, root, fix)
    }

    async fn lint(&self, root: &Path, fix: bool) -> Result<LintOutcome> {
        self.record(Step::Lint, root, fix)?;
        Ok(self.lint_outcome.clone().unwrap_or(LintOutcome {
            passed: true,
            output: "stdout: \nstderr: ".to_string(),
        }))
    }

    async fn check_types(&self, root: &Path) -> Result<()> {
        self.record(Step::TypeCheck, root, false)
    }

    async fn run_unit_tests_and_coverage(&self, root: &Path) -> Result<()> {
        self.record(Step::Tests, root, false)
    }
}

// ---------------------------------------------------------------------------
// RecordingProgress
// ---------------------------------------------------------------------------

/// A progress notification captured by [`RecordingProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(Step),
    Finished(Step, bool),
    Skipped(Step),
}

/// Progress sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Steps that received a start marker, in order.
    pub fn started_steps(&self) -> Vec<Step> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Started(step) => Some(step),
                _ => None,
            })
            .collect()
    }
}

impl Progress for RecordingProgress {
    fn started(&self, step: Step) {
        self.events.lock().unwrap().push(ProgressEvent::Started(step));
    }

    fn finished(&self, step: Step, passed: bool) {
        self.events
            .lock()
            .unwrap()
            .push(ProgressEvent::Finished(step, passed));
    }

    fn skipped(&self, step: Step) {
        self.events.lock().unwrap().push(ProgressEvent::Skipped(step));
    }
}
