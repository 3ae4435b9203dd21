//! Static type checking step. Type errors have no fix mode.

use std::path::Path;

use crate::error::{CheckError, Result};
use crate::runner::ProcessRunner;
use crate::stage::Toolchain;

pub async fn check_types(
    runner: &dyn ProcessRunner,
    toolchain: &Toolchain,
    root: &Path,
) -> Result<()> {
    let output = runner.run(&toolchain.type_check_command(root)).await?;

    if output.success() {
        return Ok(());
    }

    Err(CheckError::TypeCheck {
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
