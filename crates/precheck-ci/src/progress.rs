//! Human-facing progress markers around each step.

use crate::stage::Step;

/// Receives step lifecycle notifications from the pipeline.
pub trait Progress: Send + Sync {
    fn started(&self, step: Step);

    fn finished(&self, step: Step, passed: bool);

    fn skipped(&self, step: Step);
}

/// Writes one status line per event to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalProgress;

impl TerminalProgress {
    /// Line printed when a step starts.
    pub fn started_line(step: Step) -> String {
        format!("… {}", step.label())
    }

    /// Line printed for a finished step.
    pub fn finished_line(step: Step, passed: bool) -> String {
        let status = if passed { "✓" } else { "✗" };
        format!("{} {}", status, step.label())
    }

    pub fn skipped_line(step: Step) -> String {
        format!("- {} (skipped)", step.label())
    }
}

impl Progress for TerminalProgress {
    fn started(&self, step: Step) {
        eprintln!("{}", Self::started_line(step));
    }

    fn finished(&self, step: Step, passed: bool) {
        eprintln!("{}", Self::finished_line(step, passed));
    }

    fn skipped(&self, step: Step) {
        eprintln!("{}", Self::skipped_line(step));
    }
}

/// Discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn started(&self, _step: Step) {}

    fn finished(&self, _step: Step, _passed: bool) {}

    fn skipped(&self, _step: Step) {}
}
