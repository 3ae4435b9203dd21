//! Unit tests with coverage enforcement, in a single test-runner process.

use std::path::Path;

use crate::error::{CheckError, Result};
use crate::runner::ProcessRunner;
use crate::stage::Toolchain;

/// Run the test suite under coverage from `root`.
///
/// The coverage tool writes its data file into the working directory, which
/// is always `root`. Failing tests and insufficient coverage share one exit
/// status, so both surface as [`CheckError::CoverageOrTests`]; the embedded
/// output is the only way to tell them apart.
pub async fn run_unit_tests_and_coverage(
    runner: &dyn ProcessRunner,
    toolchain: &Toolchain,
    root: &Path,
) -> Result<()> {
    let output = runner.run(&toolchain.test_command(root)).await?;

    if output.success() {
        return Ok(());
    }

    Err(CheckError::CoverageOrTests {
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
