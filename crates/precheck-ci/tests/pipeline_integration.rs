//! Integration tests for the check pipeline with real child processes.
//!
//! The runner program is a shell script standing in for `uv run <tool>`: it
//! mimics the formatter, linter, type checker and test runner closely enough
//! to drive every exit-code path, and logs each call.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use precheck_ci::fakes::{ProgressEvent, RecordingProgress};
use precheck_ci::{
    Check, CheckError, CheckSteps, ProcessError, Step, TokioProcessRunner, ToolSteps, Toolchain,
};
use tempfile::TempDir;

const FAKE_UV: &str = r#"#!/bin/sh
echo "$*" >> '__LOG__'
[ "$1" = "run" ] || { echo "unexpected invocation: $*" >&2; exit 99; }
tool="$2"
shift 2
py_files_with() {
    find . -name '*.py' -exec grep -l "$1" {} +
}
case "$tool" in
ruff)
    sub="$1"
    shift
    if [ "$sub" = "format" ]; then
        if [ "$1" = "--check" ]; then
            unformatted=$(py_files_with 'x=1+2')
            if [ -n "$unformatted" ]; then
                echo "Would reformat: $unformatted"
                echo "1 file would be reformatted"
                exit 1
            fi
            echo "1 file already formatted"
            exit 0
        fi
        for f in $(find . -name '*.py'); do
            sed 's/x=1+2/x = 1 + 2/' "$f" > "$f.tmp" && mv "$f.tmp" "$f"
        done
        echo "1 file reformatted"
        exit 0
    fi
    fix=no
    [ "$1" = "--fix" ] && fix=yes
    if grep -q INVALID_RULE pyproject.toml; then
        echo "ruff failed" >&2
        echo "  Cause: Unknown rule selector: INVALID_RULE_XYZ123" >&2
        exit 2
    fi
    if grep -q PLW0244 pyproject.toml; then
        echo "warning: Selection PLW0244 has no effect because preview is not enabled." >&2
        echo "All checks passed!"
        exit 0
    fi
    undefined=$(py_files_with undefined_var)
    if [ -n "$undefined" ]; then
        echo "$undefined:1:5: F821 Undefined name \`undefined_var\`"
        echo "Found 1 error."
        exit 1
    fi
    unused=$(py_files_with '^import os$')
    if [ -n "$unused" ]; then
        if [ "$fix" = yes ]; then
            for f in $unused; do
                sed '/^import os$/d' "$f" > "$f.tmp" && mv "$f.tmp" "$f"
            done
            echo "Found 1 error (1 fixed, 0 remaining)."
            exit 0
        fi
        echo "$unused:1:8: F401 [*] \`os\` imported but unused"
        exit 1
    fi
    echo "All checks passed!"
    exit 0
    ;;
pyright)
    if [ -n "$(py_files_with "int = 'string'")" ]; then
        echo "error: Type \"Literal['string']\" is not assignable to declared type \"int\""
        echo "1 error, 0 warnings, 0 informations"
        exit 1
    fi
    echo "0 errors, 0 warnings, 0 informations"
    exit 0
    ;;
pytest)
    touch .coverage
    if [ -n "$(py_files_with 'assert False')" ]; then
        echo "FAILED test_fail.py::test_fail - assert False"
        echo "1 failed"
        exit 1
    fi
    echo "1 passed"
    echo "Required test coverage of 100% reached. Total coverage: 100.00%"
    exit 0
    ;;
esac
echo "unknown tool: $tool" >&2
exit 99
"#;

struct Harness {
    _tools: TempDir,
    project: TempDir,
    log: PathBuf,
    toolchain: Toolchain,
}

impl Harness {
    fn new() -> Self {
        let tools = tempfile::tempdir().unwrap();
        let log = tools.path().join("calls.log");
        let script = tools.path().join("fake-uv");
        std::fs::write(&script, FAKE_UV.replace("__LOG__", &log.to_string_lossy())).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let project = tempfile::tempdir().unwrap();
        std::fs::write(
            project.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();

        let toolchain = Toolchain {
            runner: script.to_string_lossy().into_owned(),
            ..Toolchain::default()
        };

        Self {
            _tools: tools,
            project,
            log,
            toolchain,
        }
    }

    fn root(&self) -> &Path {
        self.project.path()
    }

    fn write(&self, name: &str, content: &str) {
        std::fs::write(self.root().join(name), content).unwrap();
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.root().join(name)).unwrap()
    }

    fn steps(&self) -> ToolSteps {
        ToolSteps::with_runner(Arc::new(TokioProcessRunner), self.toolchain.clone())
    }

    fn check(&self, progress: Arc<RecordingProgress>) -> Check {
        Check::new(self.toolchain.clone())
            .with_steps(Arc::new(self.steps()))
            .with_progress(progress)
    }

    fn logged_calls(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Test: unformatted code without fix aborts at the formatter
#[tokio::test]
async fn test_unformatted_code_aborts_at_formatter() {
    let harness = Harness::new();
    harness.write("test.py", "x=1+2\n");
    let progress = Arc::new(RecordingProgress::new());

    let err = harness
        .check(progress.clone())
        .run(Some(harness.root()), false)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::FormatCheck { .. }));
    assert!(err.to_string().contains("Format check failed"));
    assert!(err.to_string().contains("Would reformat"));
    assert_eq!(progress.started_steps(), vec![Step::Format]);
    assert_eq!(
        progress.events().last(),
        Some(&ProgressEvent::Finished(Step::Format, false))
    );
    assert_eq!(harness.logged_calls().len(), 1, "later steps must not run");
    assert_eq!(harness.read("test.py"), "x=1+2\n");
}

/// Test: fix mode formats code and every step runs from the project root
#[tokio::test]
async fn test_fix_formats_and_runs_all_steps() {
    let harness = Harness::new();
    harness.write("test.py", "x=1+2\n");
    let progress = Arc::new(RecordingProgress::new());

    let report = harness
        .check(progress.clone())
        .run(Some(harness.root()), true)
        .await
        .expect("pipeline should pass after fixing");

    assert_eq!(harness.read("test.py"), "x = 1 + 2\n");
    assert_eq!(report.passed_count(), 4);
    assert_eq!(progress.started_steps(), Step::ALL.to_vec());
    assert!(harness.root().join(".coverage").exists());

    let root = harness.root().to_string_lossy().into_owned();
    let calls = harness.logged_calls();
    assert_eq!(
        calls,
        vec![
            format!("run ruff format {}", root),
            format!("run ruff check --fix {}", root),
            format!("run pyright {}", root),
            format!("run pytest --cov --cov-fail-under=100 -q {}", root),
        ]
    );
}

/// Test: project root is found from a nested directory
#[tokio::test]
async fn test_runs_from_nested_directory() {
    let harness = Harness::new();
    let nested = harness.root().join("sub_dir_1").join("sub_dir_2");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(harness.root().join("sub_dir_1").join("test.py"), "x=1+2\n").unwrap();

    let err = harness
        .check(Arc::new(RecordingProgress::new()))
        .run(Some(&nested), false)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::FormatCheck { .. }));
    let call = &harness.logged_calls()[0];
    assert!(call.ends_with(&*harness.root().to_string_lossy()));
}

/// Test: lint fix removes an unused import
#[tokio::test]
async fn test_lint_fix_removes_unused_import() {
    let harness = Harness::new();
    harness.write("test.py", "import os\nx = 1\n");

    let outcome = harness.steps().lint(harness.root(), true).await.unwrap();

    assert!(outcome.passed);
    assert_eq!(harness.read("test.py"), "x = 1\n");
}

/// Test: lint without fix reports the unused import
#[tokio::test]
async fn test_lint_reports_unused_import() {
    let harness = Harness::new();
    harness.write("test.py", "import os\nx = 1\n");

    let outcome = harness.steps().lint(harness.root(), false).await.unwrap();

    assert!(!outcome.passed);
    assert!(outcome.output.contains("unused"));
    assert_eq!(harness.read("test.py"), "import os\nx = 1\n");
}

/// Test: unfixable lint violations abort the pipeline as a lint failure
#[tokio::test]
async fn test_unfixable_lint_violation_aborts() {
    let harness = Harness::new();
    harness.write("test.py", "x = undefined_var\n");
    let progress = Arc::new(RecordingProgress::new());

    let err = harness
        .check(progress.clone())
        .run(Some(harness.root()), true)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::LintFailure { .. }));
    let msg = err.to_string();
    assert!(msg.starts_with("Linting failed, aborting commit. Output:"));
    assert!(msg.contains("undefined_var"));
    assert_eq!(progress.started_steps(), vec![Step::Format, Step::Lint]);
}

/// Test: invalid linter configuration is a hard lint error
#[tokio::test]
async fn test_invalid_lint_config_is_hard_error() {
    let harness = Harness::new();
    harness.write("test.py", "x = 1\n");
    harness.write("pyproject.toml", "[tool.ruff.lint]\nselect = [\"INVALID_RULE_XYZ123\"]\n");

    let err = harness.steps().lint(harness.root(), false).await.unwrap_err();

    assert!(matches!(err, CheckError::Lint { .. }));
    let msg = err.to_string();
    assert!(msg.contains("linting failed with an unexpected error"));
    assert!(msg.contains("stdout"));
    assert!(msg.contains("stderr"));
}

/// Test: a linter warning fails the outcome even on exit code 0
#[tokio::test]
async fn test_lint_warning_fails_outcome() {
    let harness = Harness::new();
    harness.write("test.py", "x = 1 + 2\n");
    harness.write("pyproject.toml", "[tool.ruff.lint]\nselect = [\"PLW0244\"]\n");

    let outcome = harness.steps().lint(harness.root(), false).await.unwrap();

    assert!(!outcome.passed);
    assert!(outcome.output.contains("warning"));
}

/// Test: type errors abort before tests run
#[tokio::test]
async fn test_type_error_aborts_before_tests() {
    let harness = Harness::new();
    harness.write("test.py", "x: int = 'string'\n");
    let progress = Arc::new(RecordingProgress::new());

    let err = harness
        .check(progress.clone())
        .run(Some(harness.root()), false)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::TypeCheck { .. }));
    assert!(err.to_string().contains("Type check failed"));
    assert!(!progress.started_steps().contains(&Step::Tests));
    assert!(!harness.root().join(".coverage").exists());
}

/// Test: failing tests surface as a coverage-or-tests error
#[tokio::test]
async fn test_failing_tests_fail_pipeline() {
    let harness = Harness::new();
    harness.write("test_fail.py", "def test_fail():\n    assert False\n");

    let err = harness
        .check(Arc::new(RecordingProgress::new()))
        .run(Some(harness.root()), false)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::CoverageOrTests { .. }));
    assert!(err.to_string().contains("Tests or coverage failed"));
    // The coverage data file lands in the project root, not our cwd.
    assert!(harness.root().join(".coverage").exists());
}

/// Test: a runner that cannot be spawned is a process error
#[tokio::test]
async fn test_missing_runner_is_process_error() {
    let harness = Harness::new();
    let toolchain = Toolchain {
        runner: "/nonexistent-binary-that-does-not-exist".to_string(),
        ..Toolchain::default()
    };

    let err = Check::new(toolchain)
        .with_progress(Arc::new(RecordingProgress::new()))
        .run(Some(harness.root()), false)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::Process(ProcessError::Spawn { .. })));
}

/// Test: concurrent runs against different roots do not interfere
#[tokio::test]
async fn test_concurrent_runs_use_their_own_roots() {
    let clean = Harness::new();
    clean.write("test.py", "x = 1 + 2\n");
    let dirty = Harness::new();
    dirty.write("test.py", "x=1+2\n");

    let clean_check = clean.check(Arc::new(RecordingProgress::new()));
    let dirty_check = dirty.check(Arc::new(RecordingProgress::new()));
    let (clean_result, dirty_result) = tokio::join!(
        clean_check.run(Some(clean.root()), false),
        dirty_check.run(Some(dirty.root()), false),
    );

    let report = clean_result.expect("clean project passes");
    assert_eq!(report.root, clean.root());
    assert!(matches!(dirty_result, Err(CheckError::FormatCheck { .. })));
}
