//! Formatter step.

use std::path::Path;

use tracing::warn;

use crate::error::{CheckError, Result};
use crate::runner::ProcessRunner;
use crate::stage::Toolchain;

/// Run the formatter over `root`.
///
/// With `fix`, files are rewritten in place and the formatter's exit status
/// is not checked. Without it, a non-zero exit is a [`CheckError::FormatCheck`].
pub async fn check_format(
    runner: &dyn ProcessRunner,
    toolchain: &Toolchain,
    root: &Path,
    fix: bool,
) -> Result<()> {
    let invocation = toolchain.format_command(root, fix);
    let output = runner.run(&invocation).await?;

    if fix {
        if !output.success() {
            warn!(
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "Formatter fix run exited non-zero; ignoring"
            );
        }
        return Ok(());
    }

    if output.success() {
        return Ok(());
    }

    Err(CheckError::FormatCheck {
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
